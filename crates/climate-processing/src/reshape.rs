//! Wide-to-long reshaping (melt).
//!
//! Every non-id column is collapsed into a pair of `variable`/`value`
//! columns. Rows are emitted column-major: all input rows for the first
//! collapsed column, then all rows for the second, and so on.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PreprocessingError, Result};
use crate::utils::{is_numeric_dtype, meltable_columns};

/// Parameters of a melt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltParams {
    pub id_columns: Vec<String>,
    pub variable_name: String,
    pub value_name: String,
}

impl MeltParams {
    pub fn new(
        id_columns: impl IntoIterator<Item = impl Into<String>>,
        variable_name: impl Into<String>,
        value_name: impl Into<String>,
    ) -> Self {
        Self {
            id_columns: id_columns.into_iter().map(Into::into).collect(),
            variable_name: variable_name.into(),
            value_name: value_name.into(),
        }
    }
}

/// Melted table plus any non-fatal notes about the parameters.
#[derive(Debug, Clone)]
pub struct MeltOutcome {
    pub table: DataFrame,
    pub warnings: Vec<String>,
}

/// Check the parameters against the table without reshaping it.
///
/// Returns the columns that will be collapsed.
pub fn validate_melt(df: &DataFrame, params: &MeltParams) -> Result<Vec<String>> {
    let invalid = |msg: String| Err(PreprocessingError::InvalidReshape(msg));

    if params.variable_name.trim().is_empty() {
        return invalid("variable column name must not be empty".to_string());
    }
    if params.value_name.trim().is_empty() {
        return invalid("value column name must not be empty".to_string());
    }
    if params.variable_name == params.value_name {
        return invalid(format!(
            "variable and value columns are both named '{}'",
            params.value_name
        ));
    }

    let columns = df.get_column_names();
    for (index, id) in params.id_columns.iter().enumerate() {
        if !columns.iter().any(|c| c.as_str() == id) {
            return invalid(format!("id column '{}' does not exist", id));
        }
        if params.id_columns[..index].contains(id) {
            return invalid(format!("id column '{}' is listed twice", id));
        }
    }
    for name in [&params.variable_name, &params.value_name] {
        if params.id_columns.contains(name) {
            return invalid(format!("'{}' is already an id column", name));
        }
    }

    let value_columns = meltable_columns(df, &params.id_columns);
    if value_columns.is_empty() {
        return invalid("every column is an id column; nothing left to melt".to_string());
    }
    Ok(value_columns)
}

/// Common dtype for the value column.
///
/// Keeps a shared dtype, widens mixed numerics to Float64 and falls back to
/// String for anything else.
fn value_dtype(df: &DataFrame, value_columns: &[String]) -> Result<DataType> {
    let mut dtypes = Vec::with_capacity(value_columns.len());
    for name in value_columns {
        dtypes.push(df.column(name)?.dtype().clone());
    }
    let first = dtypes[0].clone();
    if dtypes.iter().all(|d| *d == first) {
        Ok(first)
    } else if dtypes.iter().all(is_numeric_dtype) {
        Ok(DataType::Float64)
    } else {
        Ok(DataType::String)
    }
}

/// Melt `df` into long format.
///
/// Output has `height × collapsed` rows and the columns
/// `[id..., variable_name, value_name]`.
pub fn melt(df: &DataFrame, params: &MeltParams) -> Result<MeltOutcome> {
    let value_columns = validate_melt(df, params)?;
    let mut warnings = Vec::new();
    for name in [&params.variable_name, &params.value_name] {
        if value_columns.contains(name) {
            let note = format!("'{}' replaces the collapsed column of the same name", name);
            warn!("{}", note);
            warnings.push(note);
        }
    }

    let height = df.height();
    let repeats = value_columns.len();
    debug!(
        "Melting {} rows × {} columns into {} rows",
        height,
        repeats,
        height * repeats
    );

    let mut output: Vec<Column> = Vec::with_capacity(params.id_columns.len() + 2);

    for id in &params.id_columns {
        let source = df.column(id)?.as_materialized_series();
        let mut repeated = source.clone();
        for _ in 1..repeats {
            repeated.append(source)?;
        }
        output.push(repeated.into());
    }

    let variable: Vec<&str> = value_columns
        .iter()
        .flat_map(|name| std::iter::repeat_n(name.as_str(), height))
        .collect();
    output.push(Series::new(params.variable_name.as_str().into(), variable).into());

    let dtype = value_dtype(df, &value_columns)?;
    let mut values: Option<Series> = None;
    for name in &value_columns {
        let part = df
            .column(name)?
            .as_materialized_series()
            .cast(&dtype)?
            .with_name(params.value_name.as_str().into());
        match values.as_mut() {
            Some(acc) => {
                acc.append(&part)?;
            }
            None => values = Some(part),
        }
    }
    if let Some(values) = values {
        output.push(values.into());
    }

    Ok(MeltOutcome {
        table: DataFrame::new(output)?,
        warnings,
    })
}
