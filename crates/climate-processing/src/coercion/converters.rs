//! Per-type conversion functions for the coercion engine.
//!
//! Each converter returns a new Series with the same name, or a coercion
//! error naming the column, the target type and the first value that failed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use crate::error::{PreprocessingError, Result};
use crate::types::ColumnType;
use crate::utils::{is_datetime_dtype, is_numeric_dtype, missing_count, parse_boolean_string};

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;

/// Datetime layouts tried in order.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Date layouts tried in order, after the datetime layouts.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// `[<days> day[s][,]] [HH:MM:SS[.fff]]`
static CLOCK_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<days>-?\d+(?:\.\d+)?)\s*days?,?\s*)?(?:(?P<h>\d{1,2}):(?P<m>\d{2}):(?P<s>\d{2}(?:\.\d+)?))?$",
    )
    .expect("Invalid regex: clock duration")
});

/// One `<number><unit>` component, e.g. `15min` or `2 h`.
static UNIT_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<value>-?\d+(?:\.\d+)?)\s*(?P<unit>[a-zA-Z]+)")
        .expect("Invalid regex: duration unit")
});

fn fail(series: &Series, target: ColumnType, reason: impl ToString) -> PreprocessingError {
    PreprocessingError::coercion(series.name().as_str(), target.as_str(), reason)
}

/// Run a cast and turn polars failures into coercion errors.
fn checked_cast(series: &Series, dtype: &DataType, target: ColumnType) -> Result<Series> {
    series.strict_cast(dtype).map_err(|e| fail(series, target, e))
}

/// Parse every present string, failing on the first value `parse` rejects.
fn parse_strings<T>(
    series: &Series,
    target: ColumnType,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    let strings = series.str().map_err(|e| fail(series, target, e))?;
    let mut values = Vec::with_capacity(strings.len());
    for value in strings.into_iter() {
        match value {
            None => values.push(None),
            Some(raw) if raw.trim().is_empty() => values.push(None),
            Some(raw) => match parse(raw.trim()) {
                Some(parsed) => values.push(Some(parsed)),
                None => {
                    return Err(fail(series, target, format!("cannot parse value '{}'", raw)));
                }
            },
        }
    }
    Ok(values)
}

/// Categorical columns are converted through their string form.
fn as_plain(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Categorical(_, _) | DataType::Enum(_, _) => {
            Ok(series.cast(&DataType::String)?)
        }
        _ => Ok(series.clone()),
    }
}

// =============================================================================
// Targets
// =============================================================================

pub(crate) fn to_string(series: &Series) -> Result<Series> {
    checked_cast(series, &DataType::String, ColumnType::String)
}

/// Integers cannot represent missing values, so any missing entry fails.
pub(crate) fn to_int64(series: &Series) -> Result<Series> {
    let target = ColumnType::Int64;
    let missing = missing_count(series)?;
    if missing > 0 {
        return Err(fail(
            series,
            target,
            format!("{} missing values cannot be stored as integers", missing),
        ));
    }

    let series = as_plain(series)?;
    match series.dtype() {
        DataType::String => {
            let values = parse_strings(&series, target, |s| s.parse::<i64>().ok())?;
            if values.iter().any(Option::is_none) {
                return Err(fail(&series, target, "blank values cannot be stored as integers"));
            }
            Ok(Series::new(series.name().clone(), values))
        }
        DataType::Boolean => checked_cast(&series, &DataType::Int64, target),
        dtype if is_numeric_dtype(dtype) => checked_cast(&series, &DataType::Int64, target),
        DataType::Datetime(_, _) | DataType::Duration(_) | DataType::Date => {
            checked_cast(&series, &DataType::Int64, target)
        }
        other => Err(fail(&series, target, format!("unsupported source type {}", other))),
    }
}

pub(crate) fn to_float(series: &Series) -> Result<Series> {
    let target = ColumnType::Float;
    let series = as_plain(series)?;
    match series.dtype() {
        DataType::String => {
            let values = parse_strings(&series, target, |s| s.parse::<f64>().ok())?;
            Ok(Series::new(series.name().clone(), values))
        }
        DataType::Boolean => checked_cast(&series, &DataType::Float64, target),
        dtype if is_numeric_dtype(dtype) => checked_cast(&series, &DataType::Float64, target),
        other => Err(fail(&series, target, format!("unsupported source type {}", other))),
    }
}

/// Strings use the boolean vocabulary; numbers are true unless zero.
pub(crate) fn to_boolean(series: &Series) -> Result<Series> {
    let target = ColumnType::Boolean;
    let series = as_plain(series)?;
    match series.dtype() {
        DataType::Boolean => Ok(series),
        DataType::String => {
            let values = parse_strings(&series, target, parse_boolean_string)?;
            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) => {
            let floats = checked_cast(&series, &DataType::Float64, target)?;
            let values: Vec<Option<bool>> = floats
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()).map(|x| x != 0.0))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        other => Err(fail(&series, target, format!("unsupported source type {}", other))),
    }
}

pub(crate) fn categorical_dtype() -> DataType {
    DataType::from_categories(Categories::global())
}

pub(crate) fn to_category(series: &Series) -> Result<Series> {
    let target = ColumnType::Category;
    if matches!(series.dtype(), DataType::Categorical(_, _) | DataType::Enum(_, _)) {
        return Ok(series.clone());
    }
    let strings = checked_cast(series, &DataType::String, target)?;
    checked_cast(&strings, &categorical_dtype(), target)
}

/// Parse a date or datetime string into epoch milliseconds.
pub(crate) fn parse_datetime_millis(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }
    // Year-month and bare year resolve to the first day of the period.
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
    }
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok()?;
        return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
    }
    None
}

/// Integers are read as epoch milliseconds.
pub(crate) fn to_datetime(series: &Series) -> Result<Series> {
    let target = ColumnType::Datetime;
    let dtype = DataType::Datetime(TimeUnit::Milliseconds, None);
    let series = as_plain(series)?;
    match series.dtype() {
        DataType::String => {
            let values = parse_strings(&series, target, parse_datetime_millis)?;
            checked_cast(&Series::new(series.name().clone(), values), &dtype, target)
        }
        source if is_datetime_dtype(source) => checked_cast(&series, &dtype, target),
        DataType::Float32 | DataType::Float64 => {
            let millis = checked_cast(&series, &DataType::Int64, target)?;
            checked_cast(&millis, &dtype, target)
        }
        source if is_numeric_dtype(source) => {
            let millis = checked_cast(&series, &DataType::Int64, target)?;
            checked_cast(&millis, &dtype, target)
        }
        other => Err(fail(&series, target, format!("unsupported source type {}", other))),
    }
}

fn unit_millis(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "ns" | "nanosecond" | "nanoseconds" => Some(1e-6),
        "us" | "microsecond" | "microseconds" => Some(1e-3),
        "ms" | "millisecond" | "milliseconds" => Some(1.0),
        "s" | "sec" | "secs" | "second" | "seconds" => Some(MILLIS_PER_SECOND),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MILLIS_PER_MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(MILLIS_PER_HOUR),
        "d" | "day" | "days" => Some(MILLIS_PER_DAY),
        "w" | "week" | "weeks" => Some(7.0 * MILLIS_PER_DAY),
        _ => None,
    }
}

/// Parse a duration string into milliseconds.
///
/// Accepts `02:30:00`, `3 days`, `1 days 02:00:00` and unit sequences such as
/// `90s`, `15min`, `2h 30min` or `250ms`.
pub(crate) fn parse_duration_millis(raw: &str) -> Option<i64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK_DURATION.captures(text) {
        if caps.name("days").is_some() || caps.name("h").is_some() {
            let number = |name: &str| {
                caps.name(name)
                    .map(|m| m.as_str().parse::<f64>().unwrap_or(0.0))
                    .unwrap_or(0.0)
            };
            let days = number("days");
            let sign = if days < 0.0 { -1.0 } else { 1.0 };
            let clock = number("h") * MILLIS_PER_HOUR
                + number("m") * MILLIS_PER_MINUTE
                + number("s") * MILLIS_PER_SECOND;
            return Some((days * MILLIS_PER_DAY + sign * clock).round() as i64);
        }
    }

    let mut total = 0.0;
    let mut consumed = 0;
    for caps in UNIT_COMPONENT.captures_iter(text) {
        let whole = caps.get(0)?;
        if !text[consumed..whole.start()].trim().is_empty() {
            return None;
        }
        let value: f64 = caps["value"].parse().ok()?;
        total += value * unit_millis(&caps["unit"])?;
        consumed = whole.end();
    }
    if consumed == 0 || !text[consumed..].trim().is_empty() {
        return None;
    }
    Some(total.round() as i64)
}

/// Integers are read as milliseconds.
pub(crate) fn to_duration(series: &Series) -> Result<Series> {
    let target = ColumnType::Duration;
    let dtype = DataType::Duration(TimeUnit::Milliseconds);
    let series = as_plain(series)?;
    match series.dtype() {
        DataType::String => {
            let values = parse_strings(&series, target, parse_duration_millis)?;
            checked_cast(&Series::new(series.name().clone(), values), &dtype, target)
        }
        DataType::Duration(_) => checked_cast(&series, &dtype, target),
        source if is_numeric_dtype(source) => {
            let millis = checked_cast(&series, &DataType::Int64, target)?;
            checked_cast(&millis, &dtype, target)
        }
        other => Err(fail(&series, target, format!("unsupported source type {}", other))),
    }
}

/// Values are kept exactly as stored.
pub(crate) fn to_object(series: &Series) -> Result<Series> {
    Ok(series.clone())
}
