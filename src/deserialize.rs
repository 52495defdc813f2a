use std::{fmt, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime, SubsecRound};

use crate::{
    data_type::{DataType, DeclaredType},
    ColumnMetadata, DataApiError, Result, Row, Value,
};

/// Custom column hook: `(value, data_type, column_name)`. Returning `None`
/// falls back to the built-in coercions.
pub type CustomDeserializer = dyn Fn(&Value, &str, &str) -> Option<Value> + Send + Sync;

/// Controls casting of values returned from the Data API.
///
/// By default, data is returned as-is. Built with the `with_*` methods and
/// read-only afterwards.
#[derive(Clone, Default)]
pub struct DeserializationConfig {
    /// Cast `DATE`, `DATETIME` and `TIMESTAMP` to [`Value::DateTime`].
    cast_dates_as_native_dates: bool,
    /// Cast `TINYINT` to [`Value::Bool`]; otherwise keep as a number.
    cast_tiny_int_as_boolean: bool,
    /// Cast `DECIMAL` to [`Value::Float`]; otherwise keep as a string.
    unwrap_decimals: bool,
    deserialize: Option<Arc<CustomDeserializer>>,
}

impl fmt::Debug for DeserializationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeserializationConfig")
            .field("cast_dates_as_native_dates", &self.cast_dates_as_native_dates)
            .field("cast_tiny_int_as_boolean", &self.cast_tiny_int_as_boolean)
            .field("unwrap_decimals", &self.unwrap_decimals)
            .field("deserialize", &self.deserialize.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl DeserializationConfig {
    pub fn with_native_dates(mut self, enabled: bool) -> Self {
        self.cast_dates_as_native_dates = enabled;
        self
    }

    pub fn with_tiny_int_as_boolean(mut self, enabled: bool) -> Self {
        self.cast_tiny_int_as_boolean = enabled;
        self
    }

    pub fn with_unwrapped_decimals(mut self, enabled: bool) -> Self {
        self.unwrap_decimals = enabled;
        self
    }

    pub fn cast_dates_as_native_dates(&self) -> bool {
        self.cast_dates_as_native_dates
    }

    pub fn cast_tiny_int_as_boolean(&self) -> bool {
        self.cast_tiny_int_as_boolean
    }

    pub fn unwrap_decimals(&self) -> bool {
        self.unwrap_decimals
    }

    /// Installs a custom column hook that takes precedence over every
    /// built-in coercion.
    pub fn with_deserializer<F>(mut self, deserialize: F) -> Self
    where
        F: Fn(&Value, &str, &str) -> Option<Value> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(deserialize));
        self
    }
}

/// Applies [`DeserializationConfig`] coercions to result rows, dispatching on
/// each column's imprecise data type.
#[derive(Clone, Debug, Default)]
pub struct ResultDeserializer {
    config: DeserializationConfig,
}

impl ResultDeserializer {
    pub fn new(config: DeserializationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeserializationConfig {
        &self.config
    }

    /// Converts wire rows and coerces them in one pass.
    pub fn deserialize_tuples(
        &self,
        columns: &[ColumnMetadata],
        rows: Vec<serde_json::Value>,
    ) -> Result<Vec<Row>> {
        self.deserialize_rows(columns, rows_from_wire(columns, rows)?)
    }

    /// Coerces already-shaped rows. The output row holds the columns listed
    /// in `columns`, in that order; a column missing from a row reads as null.
    pub fn deserialize_rows(&self, columns: &[ColumnMetadata], rows: Vec<Row>) -> Result<Vec<Row>> {
        rows.into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        let value = row.get(&column.name).cloned().unwrap_or(Value::Null);
                        let value = self.deserialize_value(value, &column.data_type, &column.name)?;
                        Ok((column.name.clone(), value))
                    })
                    .collect::<Result<Row>>()
            })
            .collect()
    }

    /// Coerces a single cell.
    pub fn deserialize_value(&self, value: Value, data_type: &str, column_name: &str) -> Result<Value> {
        if let Some(deserialize) = &self.config.deserialize {
            if let Some(custom) = deserialize(&value, data_type, column_name) {
                return Ok(custom);
            }
        }

        if value.is_null() {
            return Ok(value);
        }

        let declared = DeclaredType::parse(data_type);
        match declared.data_type {
            DataType::Bool | DataType::Boolean => Ok(Value::Bool(value.truthy())),
            DataType::Date if self.config.cast_dates_as_native_dates => parse_date(value),
            DataType::DateTime | DataType::Timestamp if self.config.cast_dates_as_native_dates => {
                parse_datetime(value, declared.precision)
            }
            DataType::Decimal | DataType::Dec | DataType::Fixed | DataType::Numeric
                if self.config.unwrap_decimals =>
            {
                unwrap_decimal(value)
            }
            DataType::TinyInt if self.config.cast_tiny_int_as_boolean => {
                Ok(Value::Bool(value.truthy()))
            }
            _ => Ok(value),
        }
    }
}

/// Shapes wire rows into [`Row`]s without coercing any value.
pub(crate) fn rows_from_wire(
    columns: &[ColumnMetadata],
    rows: Vec<serde_json::Value>,
) -> Result<Vec<Row>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            serde_json::Value::Array(cells) => {
                if cells.len() != columns.len() {
                    return Err(DataApiError::Decode(format!(
                        "row {index} has {} values for {} columns",
                        cells.len(),
                        columns.len()
                    )));
                }
                Ok(columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| (column.name.clone(), Value::from_json(cell)))
                    .collect())
            }
            serde_json::Value::Object(mut cells) => Ok(columns
                .iter()
                .map(|column| {
                    let cell = cells.remove(&column.name).unwrap_or_default();
                    (column.name.clone(), Value::from_json(cell))
                })
                .collect()),
            other => Err(DataApiError::Decode(format!(
                "row {index} must be an array or an object, got {other}"
            ))),
        })
        .collect()
}

fn parse_date(value: Value) -> Result<Value> {
    let text = match value {
        Value::Text(text) => text,
        Value::DateTime(_) => return Ok(value),
        other => return Err(uncoercible(&other, "date")),
    };
    if is_zero_in_date(&text) {
        return Ok(Value::Text(text));
    }
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|err| DataApiError::Decode(format!("invalid date value '{text}': {err}")))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataApiError::Decode(format!("invalid date value '{text}'")))?;
    Ok(Value::DateTime(midnight.and_utc()))
}

/// Whole-second values and fractional values take separate formats; any
/// other declared precision is left untouched.
fn parse_datetime(value: Value, precision: Option<u32>) -> Result<Value> {
    let format = match precision {
        None | Some(0) => "%Y-%m-%d %H:%M:%S",
        Some(1..=6) => "%Y-%m-%d %H:%M:%S%.f",
        Some(_) => return Ok(value),
    };
    let text = match value {
        Value::Text(text) => text,
        Value::DateTime(_) => return Ok(value),
        other => return Err(uncoercible(&other, "datetime")),
    };
    if is_zero_in_date(&text) {
        return Ok(Value::Text(text));
    }
    let parsed = NaiveDateTime::parse_from_str(text.trim(), format)
        .map_err(|err| DataApiError::Decode(format!("invalid datetime value '{text}': {err}")))?;
    // Native datetimes carry millisecond precision.
    Ok(Value::DateTime(parsed.and_utc().trunc_subsecs(3)))
}

/// MySQL stores `0000-00-00` and dates with a zero month or day as valid
/// values. They have no calendar instant and are kept as text.
fn is_zero_in_date(text: &str) -> bool {
    let date = text.split_whitespace().next().unwrap_or_default();
    date.split('-')
        .skip(1)
        .any(|part| !part.is_empty() && part.bytes().all(|byte| byte == b'0'))
}

fn unwrap_decimal(value: Value) -> Result<Value> {
    match value {
        Value::Text(text) => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|err| DataApiError::Decode(format!("invalid decimal value '{text}': {err}"))),
        Value::Integer(value) => Ok(Value::Float(value as f64)),
        Value::Float(_) => Ok(value),
        other => Err(uncoercible(&other, "decimal")),
    }
}

fn uncoercible(value: &Value, kind: &str) -> DataApiError {
    DataApiError::Decode(format!("cannot deserialize {value:?} as {kind}"))
}
