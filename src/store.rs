use chrono::NaiveDateTime;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::columns::parse_timestamp;
use crate::domain::DashError;

/// Fields every data file has to provide, in extraction order.
const RECORD_FIELDS: [&str; 9] = [
    "id",
    "first_name",
    "last_name",
    "phone_number",
    "longitude",
    "latitude",
    "gps_code",
    "birth_year",
    "datetime",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub longitude: f64,
    pub latitude: f64,
    pub gps_code: String,
    pub birth_year: i32,
    pub datetime: NaiveDateTime, // UTC
    pub datetime_raw: String,
}

#[derive(Debug, PartialEq)]
enum FileType {
    JSON,
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

type RawColumns = Vec<Vec<Option<String>>>;

/// Reads the record file once. Any malformed value fails the whole load.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_records(path: &Path) -> Result<Vec<Person>, DashError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?}", file_info);
    let start_time = Instant::now();

    let df = match file_info.file_type {
        FileType::JSON => load_json(&file_info.path)?,
        FileType::CSV => load_csv(&file_info.path)?.collect()?,
        FileType::PARQUET => load_parquet(&file_info.path)?.collect()?,
        FileType::ARROW => load_arrow(&file_info.path)?.collect()?,
    };

    // An empty file has no columns to check.
    if df.height() == 0 {
        info!("No records in {}", file_info.path.display());
        return Ok(Vec::new());
    }

    // Each column is extracted in its own thread, rows are then parsed in parallel.
    let columns: RawColumns = RECORD_FIELDS
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<_, DashError>>()?;

    let records: Vec<Person> = (0..df.height())
        .into_par_iter()
        .map(|row| parse_record(&columns, row))
        .collect::<Result<_, DashError>>()?;

    let mut seen = HashSet::with_capacity(records.len());
    if let Some(dup) = records.iter().find(|p| !seen.insert(p.id)) {
        return Err(DashError::DuplicateId(dup.id));
    }

    info!(
        "Loaded {} records ({} bytes) in {}ms",
        records.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );
    Ok(records)
}

fn get_file_info(path: &Path) -> Result<FileInfo, DashError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DashError::FileNotFound,
        ErrorKind::PermissionDenied => DashError::PermissionDenied,
        _ => DashError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DashError::LoadingFailed("Not a file!".into()));
    }

    Ok(FileInfo {
        path: path.to_path_buf(),
        file_size: metadata.len(),
        file_type: detect_file_type(path)?,
    })
}

fn detect_file_type(path: &Path) -> Result<FileType, DashError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("JSON") => Ok(FileType::JSON),
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(DashError::UnknownFileType),
    }
}

fn load_json(path: &Path) -> Result<DataFrame, DashError> {
    let file = File::open(path)?;
    Ok(JsonReader::new(file)
        .with_json_format(JsonFormat::Json)
        .finish()?)
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn load_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, DashError> {
    let col = df
        .column(name)
        .map_err(|_| DashError::MissingColumn(name.to_string()))?
        .cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|value| value.map(|s| s.to_string()))
        .collect())
}

fn parse_record(columns: &RawColumns, row: usize) -> Result<Person, DashError> {
    let text = |field: usize| columns[field][row].clone().unwrap_or_default();
    let raw_datetime = required(columns, 8, row)?;
    let datetime =
        parse_timestamp(raw_datetime).ok_or_else(|| malformed(row, 8, raw_datetime))?;

    Ok(Person {
        id: parse_field(columns, 0, row)?,
        first_name: text(1),
        last_name: text(2),
        phone_number: text(3),
        longitude: parse_field(columns, 4, row)?,
        latitude: parse_field(columns, 5, row)?,
        gps_code: text(6),
        birth_year: parse_field(columns, 7, row)?,
        datetime,
        datetime_raw: raw_datetime.to_string(),
    })
}

fn required(columns: &RawColumns, field: usize, row: usize) -> Result<&str, DashError> {
    columns[field][row]
        .as_deref()
        .ok_or_else(|| malformed(row, field, "null"))
}

fn parse_field<T: FromStr>(columns: &RawColumns, field: usize, row: usize) -> Result<T, DashError> {
    let value = required(columns, field, row)?;
    value.trim().parse().map_err(|_| malformed(row, field, value))
}

fn malformed(row: usize, field: usize, value: &str) -> DashError {
    DashError::MalformedRecord {
        row,
        column: RECORD_FIELDS[field].to_string(),
        value: value.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("geodash-{}-{name}", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_json_fixture_in_file_order() {
        let records = load_records(&fixture("people.json")).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        let first = &records[0];
        assert_eq!(first.first_name, "Aysel");
        assert_eq!(first.last_name, "Mammadova");
        assert_eq!(first.birth_year, 1990);
        assert_eq!(first.gps_code, "WAW-01");
        assert!((first.latitude - 52.2297).abs() < 1e-9);
        assert!((first.longitude - 21.0122).abs() < 1e-9);
        assert_eq!(first.datetime, parse_timestamp("2024-01-15T09:30:00Z").unwrap());
    }

    #[test]
    fn loads_csv_with_the_same_columns() {
        let path = temp_file(
            "people.csv",
            "id,first_name,last_name,phone_number,longitude,latitude,gps_code,birth_year,datetime\n\
             7,Leyla,Aliyeva,5011112233,19.94,50.06,KRK-02,1985,2023-06-01T10:00:00Z\n",
        );
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 7);
        assert_eq!(records[0].phone_number, "5011112233");
        fs::remove_file(path).ok();
    }

    #[test]
    fn empty_record_array_loads_as_no_records() {
        let path = temp_file("empty.json", "[]");
        let records = load_records(&path).unwrap();
        assert!(records.is_empty());
        fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_timestamp_fails_the_load() {
        let path = temp_file(
            "bad-date.json",
            r#"[{"id":1,"first_name":"A","last_name":"B","phone_number":"1","longitude":1.0,"latitude":2.0,"gps_code":"X","birth_year":1990,"datetime":"yesterday"}]"#,
        );
        match load_records(&path) {
            Err(DashError::MalformedRecord { row, column, value }) => {
                assert_eq!(row, 0);
                assert_eq!(column, "datetime");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected result {other:?}"),
        }
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_column_and_duplicate_ids_are_rejected() {
        let path = temp_file(
            "no-gps.json",
            r#"[{"id":1,"first_name":"A","last_name":"B","phone_number":"1","longitude":1.0,"latitude":2.0,"birth_year":1990,"datetime":"2024-01-01"}]"#,
        );
        assert!(matches!(
            load_records(&path),
            Err(DashError::MissingColumn(name)) if name == "gps_code"
        ));
        fs::remove_file(path).ok();

        let record = r#"{"id":4,"first_name":"A","last_name":"B","phone_number":"1","longitude":1.0,"latitude":2.0,"gps_code":"X","birth_year":1990,"datetime":"2024-01-01"}"#;
        let path = temp_file("dup.json", &format!("[{record},{record}]"));
        assert!(matches!(load_records(&path), Err(DashError::DuplicateId(4))));
        fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_or_missing_files_fail() {
        assert!(matches!(
            load_records(Path::new("does/not/exist.json")),
            Err(DashError::FileNotFound)
        ));
        let path = temp_file("people.txt", "id\n1\n");
        assert!(matches!(load_records(&path), Err(DashError::UnknownFileType)));
        fs::remove_file(path).ok();
    }
}
