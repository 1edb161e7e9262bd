use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Display};

use crate::UnsupportedValueType;

/* ───────────────────── Excel date-serial utilities ───────────────────
Excel's serial date system:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const EXCEL_EPOCH: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
const PHANTOM_LEAP_CUTOFF: NaiveDate = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - EXCEL_EPOCH).num_days();
    // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
    let serial_days = if dt.date() >= PHANTOM_LEAP_CUTOFF {
        days + 1
    } else {
        days
    };

    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / SECONDS_PER_DAY
}

/// Inverse of [`datetime_to_serial`], rounded to whole seconds.
///
/// Returns `None` for serials outside chrono's representable range.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let mut days = serial.trunc() as i64;
    let mut frac_secs = (serial.fract() * SECONDS_PER_DAY).round() as i64;
    if frac_secs >= SECONDS_PER_DAY as i64 {
        days += 1;
        frac_secs -= SECONDS_PER_DAY as i64;
    }

    // Serial 60 is phantom 1900-02-29; map to 1900-02-28
    let date = if days == 60 {
        NaiveDate::from_ymd_opt(1900, 2, 28)?
    } else {
        // serial < 60: offset = serial (no phantom day yet)
        // serial > 60: offset = serial - 1 (skip phantom day)
        let offset = if days < 60 { days } else { days - 1 };
        EXCEL_EPOCH.checked_add_signed(ChronoDur::try_days(offset)?)?
    };

    let time = NaiveTime::from_num_seconds_from_midnight_opt(frac_secs.rem_euclid(86_400) as u32, 0)?;
    Some(date.and_time(time))
}

/// A value scanned out of a SQL result set.
///
/// The tag set is closed: drivers map every native column type onto one of
/// these variants. Native types without a mapping are carried as
/// [`SqlValue::Unsupported`] so the failure surfaces when the value is
/// written, with the native type name attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Unsupported { type_name: String },
}

impl SqlValue {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        SqlValue::Unsupported {
            type_name: type_name.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the variant, or the native type name for unsupported values.
    pub fn type_name(&self) -> &str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::Text(_) => "string",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Unsupported { type_name } => type_name,
        }
    }

    /// Map the scanned value onto the value a cell will hold.
    ///
    /// `Ok(None)` means "leave the cell alone" (SQL `NULL`).
    pub fn to_cell_value(&self) -> Result<Option<CellValue>, UnsupportedValueType> {
        Ok(Some(match self {
            SqlValue::Null => return Ok(None),
            SqlValue::Int(i) => CellValue::Int(*i),
            SqlValue::Float(f) => CellValue::Number(*f),
            SqlValue::Boolean(b) => CellValue::Boolean(*b),
            SqlValue::Text(s) => CellValue::Text(s.clone()),
            SqlValue::Bytes(b) => CellValue::Text(String::from_utf8_lossy(b).into_owned()),
            SqlValue::Timestamp(ts) => CellValue::DateTime(*ts),
            SqlValue::Unsupported { type_name } => {
                return Err(UnsupportedValueType::new(type_name.clone()));
            }
        }))
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(n) => write!(f, "{n}"),
            SqlValue::Boolean(b) => write!(f, "{b}"),
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            SqlValue::Timestamp(ts) => write!(f, "{ts}"),
            SqlValue::Unsupported { type_name } => write!(f, "<{type_name}>"),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Boolean(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl<'a> From<&'a str> for SqlValue {
    fn from(value: &'a str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// A value as stored in a destination cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Boolean(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Excel serial for date-times, plain numeric value otherwise.
    pub fn as_serial_number(&self) -> Option<f64> {
        match self {
            CellValue::DateTime(dt) => Some(datetime_to_serial(dt)),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(_) => None,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}
