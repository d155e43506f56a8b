use ::mysql::{Params, Value};
use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::MysqlScopedError;
use crate::types::RowValues;

/// Largest year a MySQL date or datetime column can hold.
const MAX_YEAR: u16 = 9999;

/// Convert a middleware value into a MySQL binary-protocol value.
///
/// # Errors
/// Returns `MysqlScopedError::ParameterError` for timestamps whose year falls
/// outside `0..=9999`.
pub fn to_mysql_value(value: &RowValues) -> Result<Value, MysqlScopedError> {
    Ok(match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Timestamp(dt) => timestamp_value(dt)?,
        RowValues::Null => Value::NULL,
        RowValues::JSON(json) => Value::Bytes(json.to_string().into_bytes()),
        RowValues::Blob(bytes) => Value::Bytes(bytes.clone()),
    })
}

fn timestamp_value(dt: &NaiveDateTime) -> Result<Value, MysqlScopedError> {
    let year = u16::try_from(dt.year())
        .ok()
        .filter(|year| *year <= MAX_YEAR)
        .ok_or_else(|| {
            MysqlScopedError::ParameterError(format!(
                "timestamp {dt} is outside the MySQL date range"
            ))
        })?;
    Ok(Value::Date(
        year,
        // chrono guarantees month/day/hour/minute/second fit in u8
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
        dt.nanosecond() / 1_000,
    ))
}

/// Positional parameters for a statement; empty when nothing is bound.
///
/// # Errors
/// Propagates the first value that cannot be represented on the wire.
pub fn convert_params(values: &[RowValues]) -> Result<Params, MysqlScopedError> {
    if values.is_empty() {
        return Ok(Params::Empty);
    }
    values
        .iter()
        .map(to_mysql_value)
        .collect::<Result<Vec<_>, _>>()
        .map(Params::Positional)
}
