use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::DefaultTerminal;
use ratatui::crossterm::execute;

mod columns;
mod controller;
mod debounce;
mod domain;
mod inputter;
mod map;
mod model;
mod state;
mod store;
mod table;
mod ui;

use controller::Controller;
use domain::{DashConfig, DashError};
use model::{Model, Status};
use state::SortDirection;
use store::Person;

/// Table and map dashboard for geolocated person records.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Record file (json, csv, parquet or arrow)
    #[arg(default_value = "data/mock.json")]
    path: String,

    /// Rows per table page
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Delay before a typed filter is applied
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,

    /// Match text filters case sensitive
    #[arg(long)]
    case_sensitive: bool,

    /// Sort ascending by every filtered column
    #[arg(long)]
    sort_filtered: bool,

    /// Initial filter as COLUMN=VALUE, e.g. birth_year=1980..1990
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter_arg)]
    filters: Vec<(String, String)>,

    /// Initial sort as COLUMN[:asc|:desc], repeat for secondary keys
    #[arg(long = "sort", value_name = "COLUMN[:DIR]", value_parser = parse_sort_arg)]
    sorting: Vec<(String, SortDirection)>,

    /// Event poll interval
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Where to write the log, the terminal belongs to the UI
    #[arg(long, default_value = "geodash.log")]
    log_file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn parse_filter_arg(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected COLUMN=VALUE, got \"{arg}\""))
}

fn parse_sort_arg(arg: &str) -> Result<(String, SortDirection), String> {
    let (key, direction) = match arg.split_once(':') {
        Some((key, "asc")) => (key, SortDirection::Ascending),
        Some((key, "desc")) => (key, SortDirection::Descending),
        Some((_, other)) => return Err(format!("unknown sort direction \"{other}\"")),
        None => (arg, SortDirection::Ascending),
    };
    Ok((key.trim().to_string(), direction))
}

fn init_logging(path: &Path) -> Result<(), DashError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_filter(filter),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), DashError> {
    init_logging(&args.log_file)?;
    info!("Starting geodash with {:?}", args);

    let path = shellexpand::full(&args.path)
        .map_err(|e| DashError::LoadingFailed(e.to_string()))?
        .into_owned();
    // A broken data file is fatal, fail before taking over the terminal.
    let records = store::load_records(Path::new(&path))?;

    let cfg = DashConfig::default()
        .with_page_size(args.page_size.max(1))
        .with_filter_debounce(Duration::from_millis(args.debounce_ms))
        .with_text_filter_case_sensitive(args.case_sensitive)
        .with_sort_filtered_columns(args.sort_filtered)
        .with_event_poll_time(args.poll_ms);

    let mut terminal = ratatui::init();
    let result = run_ui(&mut terminal, &args, &cfg, records);
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    info!("Bye");
    result
}

fn run_ui(
    terminal: &mut DefaultTerminal,
    args: &Args,
    cfg: &DashConfig,
    records: Vec<Person>,
) -> Result<(), DashError> {
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut model = Model::init(cfg, records, size.width, size.height)?;
    model.preset(&args.filters, &args.sorting);
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui::draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    Ok(())
}
