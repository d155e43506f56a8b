use std::sync::Arc;

use ::mysql::consts::ColumnType;
use ::mysql::{Column, Row, Value};
use chrono::NaiveDate;

use crate::error::MysqlScopedError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Column labels and types of a MySQL result.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    pub names: Vec<String>,
    pub types: Vec<ColumnType>,
}

impl ColumnInfo {
    #[must_use]
    pub fn from_columns(columns: &[Column]) -> Self {
        Self {
            names: columns.iter().map(|c| c.name_str().into_owned()).collect(),
            types: columns.iter().map(Column::column_type).collect(),
        }
    }
}

/// Materialize MySQL rows into a [`ResultSet`].
///
/// # Errors
/// Returns `MysqlScopedError::MysqlStatement` if fetching a row fails.
pub fn build_result_set<I>(columns: ColumnInfo, rows: I) -> Result<ResultSet, MysqlScopedError>
where
    I: Iterator<Item = Result<Row, ::mysql::Error>>,
{
    let ColumnInfo { names, types } = columns;
    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(names));

    for row in rows {
        let row = row.map_err(MysqlScopedError::MysqlStatement)?;
        let values = row
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                let column_type = types
                    .get(idx)
                    .copied()
                    .unwrap_or(ColumnType::MYSQL_TYPE_STRING);
                from_mysql_value(value, column_type)
            })
            .collect();
        result_set.add_row_values(values);
    }

    Ok(result_set)
}

/// Convert a MySQL value into a middleware value.
///
/// Text-protocol results arrive as bytes; numeric and datetime columns are
/// parsed back using the column type.
#[must_use]
pub fn from_mysql_value(value: Value, column_type: ColumnType) -> RowValues {
    match value {
        Value::NULL => RowValues::Null,
        Value::Int(i) => RowValues::Int(i),
        Value::UInt(u) => {
            i64::try_from(u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int)
        }
        Value::Float(f) => RowValues::Float(f64::from(f)),
        Value::Double(d) => RowValues::Float(d),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|d| {
                    d.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or_else(
                    // zero dates such as 0000-00-00 have no calendar value
                    || {
                        RowValues::Text(format!(
                            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                        ))
                    },
                    RowValues::Timestamp,
                )
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let total_hours = u64::from(days) * 24 + u64::from(hours);
            let mut text = format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            RowValues::Text(text)
        }
        Value::Bytes(bytes) => from_text_bytes(bytes, column_type),
    }
}

fn from_text_bytes(bytes: Vec<u8>, column_type: ColumnType) -> RowValues {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => return RowValues::Blob(err.into_bytes()),
    };

    match column_type {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => match text.parse::<i64>() {
            Ok(i) => RowValues::Int(i),
            Err(_) => RowValues::Text(text),
        },
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => match text.parse::<f64>() {
            Ok(f) => RowValues::Float(f),
            Err(_) => RowValues::Text(text),
        },
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_TIMESTAMP => {
            let value = RowValues::Text(text);
            value.as_timestamp().map_or(value, RowValues::Timestamp)
        }
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
            match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(date) => date
                    .and_hms_opt(0, 0, 0)
                    .map_or(RowValues::Text(text), RowValues::Timestamp),
                Err(_) => RowValues::Text(text),
            }
        }
        ColumnType::MYSQL_TYPE_JSON => match serde_json::from_str(&text) {
            Ok(json) => RowValues::JSON(json),
            Err(_) => RowValues::Text(text),
        },
        _ => RowValues::Text(text),
    }
}
