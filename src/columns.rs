use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::store::Person;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnId {
    Id,
    FirstName,
    LastName,
    PhoneNumber,
    GpsCode,
    BirthYear,
    Datetime,
}

/// Static column set in default display order.
pub const COLUMNS: [ColumnId; 7] = [
    ColumnId::Id,
    ColumnId::FirstName,
    ColumnId::LastName,
    ColumnId::PhoneNumber,
    ColumnId::GpsCode,
    ColumnId::BirthYear,
    ColumnId::Datetime,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Substring match against the raw value
    Text,
    /// Inclusive `[min, max]`, either side optional
    Range,
    /// Exact match against the raw value
    Choice,
    /// Inclusive timestamp lower bound
    Since,
}

impl ColumnId {
    pub fn key(self) -> &'static str {
        match self {
            ColumnId::Id => "id",
            ColumnId::FirstName => "first_name",
            ColumnId::LastName => "last_name",
            ColumnId::PhoneNumber => "phone_number",
            ColumnId::GpsCode => "gps_code",
            ColumnId::BirthYear => "birth_year",
            ColumnId::Datetime => "datetime",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        COLUMNS.iter().copied().find(|c| c.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnId::Id => "ID",
            ColumnId::FirstName => "Ad",
            ColumnId::LastName => "Soyad",
            ColumnId::PhoneNumber => "Telefon",
            ColumnId::GpsCode => "GPS Kodu",
            ColumnId::BirthYear => "Doğum ili",
            ColumnId::Datetime => "Tarix və Saat",
        }
    }

    pub fn width(self) -> u16 {
        match self {
            ColumnId::Id => 6,
            ColumnId::FirstName => 14,
            ColumnId::LastName => 14,
            ColumnId::PhoneNumber => 15,
            ColumnId::GpsCode => 12,
            ColumnId::BirthYear => 10,
            ColumnId::Datetime => 17,
        }
    }

    pub fn filter_kind(self) -> FilterKind {
        match self {
            ColumnId::Id => FilterKind::Choice,
            ColumnId::BirthYear => FilterKind::Range,
            ColumnId::Datetime => FilterKind::Since,
            _ => FilterKind::Text,
        }
    }

    /// Unformatted field value, the one filters look at.
    pub fn raw_value(self, person: &Person) -> String {
        match self {
            ColumnId::Id => person.id.to_string(),
            ColumnId::FirstName => person.first_name.clone(),
            ColumnId::LastName => person.last_name.clone(),
            ColumnId::PhoneNumber => person.phone_number.clone(),
            ColumnId::GpsCode => person.gps_code.clone(),
            ColumnId::BirthYear => person.birth_year.to_string(),
            ColumnId::Datetime => person.datetime_raw.clone(),
        }
    }

    pub fn display_value(self, person: &Person) -> String {
        match self {
            ColumnId::PhoneNumber => format_phone_number(&person.phone_number),
            ColumnId::Datetime => format_datetime(&person.datetime),
            _ => self.raw_value(person),
        }
    }

    pub fn numeric_value(self, person: &Person) -> Option<f64> {
        match self {
            ColumnId::Id => Some(person.id as f64),
            ColumnId::BirthYear => Some(person.birth_year as f64),
            _ => None,
        }
    }

    /// Ascending comparison of two records on this column.
    pub fn compare(self, a: &Person, b: &Person) -> Ordering {
        match self {
            ColumnId::Id => a.id.cmp(&b.id),
            ColumnId::FirstName => a.first_name.cmp(&b.first_name),
            ColumnId::LastName => a.last_name.cmp(&b.last_name),
            ColumnId::PhoneNumber => a.phone_number.cmp(&b.phone_number),
            ColumnId::GpsCode => a.gps_code.cmp(&b.gps_code),
            ColumnId::BirthYear => a.birth_year.cmp(&b.birth_year),
            ColumnId::Datetime => a.datetime.cmp(&b.datetime),
        }
    }
}

/// Ten digit numbers render as `ddd-ddd-dd-dd`, everything else unchanged.
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!(
            "{}-{}-{}-{}",
            &digits[0..3],
            &digits[3..6],
            &digits[6..8],
            &digits[8..]
        )
    } else {
        phone.to_string()
    }
}

pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format("%d.%m.%Y %H:%M").to_string()
}

/// Parses ISO-8601 timestamps and plain dates. Offsets are normalized to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}
