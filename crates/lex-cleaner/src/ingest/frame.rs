//! Conversion between polars `DataFrame`s and [`Table`]s.

use crate::error::{Result, ResultExt};
use crate::table::{Column, DeclaredType, Table, Value};
use crate::utils::parse_temporal;
use chrono::NaiveDateTime;
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, PlSmallStr, Series};

#[inline]
fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

#[inline]
fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

#[inline]
fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Convert a polars frame into a table numbered from 1.
pub(super) fn table_from_dataframe(df: &DataFrame) -> Result<Table> {
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let (declared_type, cells) = series_to_cells(series)
            .context(format!("Failed to convert column '{}'", series.name()))?;
        columns.push(Column::new(series.name().as_str(), declared_type, cells));
    }
    Table::new(columns)
}

fn series_to_cells(series: &Series) -> Result<(DeclaredType, Vec<Option<Value>>)> {
    let dtype = series.dtype();

    if is_integer_dtype(dtype) {
        let cast = series.cast(&DataType::Int64)?;
        let cells = cast.i64()?.into_iter().map(|v| v.map(Value::Integer)).collect();
        return Ok((DeclaredType::Numeric, cells));
    }

    if is_float_dtype(dtype) {
        let cast = series.cast(&DataType::Float64)?;
        let cells = cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|f| f.is_finite()).map(Value::Float))
            .collect();
        return Ok((DeclaredType::Numeric, cells));
    }

    if matches!(dtype, DataType::Boolean) {
        let cells = series
            .bool()?
            .into_iter()
            .map(|v| v.map(Value::Boolean))
            .collect();
        return Ok((DeclaredType::Boolean, cells));
    }

    let as_text = series.cast(&DataType::String)?;
    let text = as_text.str()?;

    if is_datetime_dtype(dtype) {
        let cells: Vec<Option<Value>> = text
            .into_iter()
            .map(|v| {
                v.map(|s| parse_temporal(s).map_or_else(|| Value::from(s), Value::Temporal))
            })
            .collect();
        let all_temporal = cells
            .iter()
            .flatten()
            .all(|v| matches!(v, Value::Temporal(_)));
        let declared = if all_temporal {
            DeclaredType::Temporal
        } else {
            DeclaredType::Unresolved
        };
        return Ok((declared, cells));
    }

    let cells = text.into_iter().map(|v| v.map(Value::from)).collect();
    Ok((DeclaredType::Unresolved, cells))
}

impl Table {
    /// Convert to a polars `DataFrame` for export and display.
    ///
    /// Typed columns keep their dtype; unresolved or non-conforming columns
    /// are rendered as strings.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns = self
            .columns()
            .iter()
            .map(|c| column_to_series(c).into_column())
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

fn column_to_series(column: &Column) -> Series {
    let name: PlSmallStr = column.name().into();
    let cells = column.cells();

    match column.declared_type() {
        DeclaredType::Numeric if column.conforms() => {
            let all_integer = cells.iter().flatten().all(|v| matches!(v, Value::Integer(_)));
            if all_integer {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Value::Integer(i)) => Some(*i),
                        _ => None,
                    })
                    .collect();
                Series::new(name, values)
            } else {
                let values: Vec<Option<f64>> = column.numeric_values();
                Series::new(name, values)
            }
        }
        DeclaredType::Boolean if column.conforms() => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Some(Value::Boolean(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        DeclaredType::Temporal if column.conforms() => {
            let values: Vec<Option<NaiveDateTime>> = cells
                .iter()
                .map(|c| match c {
                    Some(Value::Temporal(dt)) => Some(*dt),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        _ => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.as_ref().map(Value::as_display))
                .collect();
            Series::new(name, values)
        }
    }
}
