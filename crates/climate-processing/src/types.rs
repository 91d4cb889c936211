use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Column types
// ============================================================================

/// Target types offered by the type coercion stage.
///
/// Labels follow the dataframe vocabulary users see in the column summary,
/// so a summary label can be fed straight back as a coercion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int64,
    Float,
    Boolean,
    Category,
    Datetime,
    Duration,
    Object,
}

impl ColumnType {
    /// Every selectable target type, in menu order.
    pub const ALL: [ColumnType; 8] = [
        ColumnType::String,
        ColumnType::Int64,
        ColumnType::Float,
        ColumnType::Boolean,
        ColumnType::Category,
        ColumnType::Datetime,
        ColumnType::Duration,
        ColumnType::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int64 => "int64",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Category => "category",
            ColumnType::Datetime => "datetime",
            ColumnType::Duration => "duration",
            ColumnType::Object => "object",
        }
    }

    /// Map a polars dtype onto the label set, if it has a counterpart.
    pub fn from_dtype(dtype: &DataType) -> Option<ColumnType> {
        match dtype {
            DataType::String => Some(ColumnType::String),
            DataType::Int64 => Some(ColumnType::Int64),
            DataType::Float32 | DataType::Float64 => Some(ColumnType::Float),
            DataType::Boolean => Some(ColumnType::Boolean),
            DataType::Categorical(_, _) | DataType::Enum(_, _) => Some(ColumnType::Category),
            DataType::Datetime(_, _) | DataType::Date => Some(ColumnType::Datetime),
            DataType::Duration(_) => Some(ColumnType::Duration),
            _ => None,
        }
    }

    /// Declared type label for a dtype as shown in the type summary.
    ///
    /// Physical types outside the label set (e.g. `i32`) keep their polars name.
    pub fn label_for(dtype: &DataType) -> String {
        match Self::from_dtype(dtype) {
            Some(column_type) => column_type.as_str().to_string(),
            None => dtype.to_string(),
        }
    }

    /// Default coercion target for a summary label: the label itself when it
    /// is selectable, `float` otherwise.
    pub fn default_for_label(label: &str) -> ColumnType {
        label.parse().unwrap_or(ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "utf8" | "text" => Ok(ColumnType::String),
            "int64" | "int" | "integer" | "integer64" | "i64" => Ok(ColumnType::Int64),
            "float" | "float64" | "f64" | "double" => Ok(ColumnType::Float),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "category" | "categorical" => Ok(ColumnType::Category),
            "datetime" | "datetime64[ns]" | "datetime64" | "date" => Ok(ColumnType::Datetime),
            "duration" | "timedelta" | "timedelta[ns]" | "timedelta64[ns]" => {
                Ok(ColumnType::Duration)
            }
            "object" | "generic-object" | "generic" => Ok(ColumnType::Object),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

// ============================================================================
// Column summary
// ============================================================================

/// Declared type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub column: String,
    pub dtype: String,
}

/// Number of missing entries in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEntry {
    pub column: String,
    pub missing: usize,
}

/// Paired type and missing-value reports for one table snapshot.
///
/// Both tables list the columns in table order. A summary is only valid for
/// the exact snapshot it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub rows: usize,
    pub types: Vec<TypeEntry>,
    pub missing: Vec<MissingEntry>,
}

impl ColumnSummary {
    /// Column names covered by the summary, in table order.
    pub fn columns(&self) -> Vec<&str> {
        self.types.iter().map(|entry| entry.column.as_str()).collect()
    }

    pub fn dtype_of(&self, column: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.dtype.as_str())
    }

    pub fn missing_of(&self, column: &str) -> Option<usize> {
        self.missing
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.missing)
    }

    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|entry| entry.missing).sum()
    }

    pub fn has_missing(&self) -> bool {
        self.total_missing() > 0
    }

    /// Shape label, e.g. "24 rows × 3 columns".
    pub fn shape_label(&self) -> String {
        format!("{} rows × {} columns", self.rows, self.types.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::TimeUnit;

    #[test]
    fn test_column_type_round_trips_labels() {
        for column_type in ColumnType::ALL {
            assert_eq!(column_type.as_str().parse::<ColumnType>(), Ok(column_type));
        }
    }

    #[test]
    fn test_column_type_aliases() {
        assert_eq!("datetime64[ns]".parse(), Ok(ColumnType::Datetime));
        assert_eq!("timedelta[ns]".parse(), Ok(ColumnType::Duration));
        assert_eq!("Categorical".parse(), Ok(ColumnType::Category));
        assert_eq!("generic-object".parse(), Ok(ColumnType::Object));
        assert!("complex128".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_label_for_dtypes() {
        assert_eq!(ColumnType::label_for(&DataType::Float32), "float");
        assert_eq!(ColumnType::label_for(&DataType::Int64), "int64");
        assert_eq!(
            ColumnType::label_for(&DataType::Datetime(TimeUnit::Milliseconds, None)),
            "datetime"
        );
        assert_eq!(ColumnType::label_for(&DataType::Int32), "i32");
    }

    #[test]
    fn test_default_for_label_falls_back_to_float() {
        assert_eq!(ColumnType::default_for_label("string"), ColumnType::String);
        assert_eq!(ColumnType::default_for_label("i32"), ColumnType::Float);
    }

    #[test]
    fn test_summary_accessors() {
        let summary = ColumnSummary {
            rows: 2,
            types: vec![
                TypeEntry {
                    column: "District".to_string(),
                    dtype: "string".to_string(),
                },
                TypeEntry {
                    column: "Jan".to_string(),
                    dtype: "float".to_string(),
                },
            ],
            missing: vec![
                MissingEntry {
                    column: "District".to_string(),
                    missing: 0,
                },
                MissingEntry {
                    column: "Jan".to_string(),
                    missing: 1,
                },
            ],
        };

        assert_eq!(summary.columns(), vec!["District", "Jan"]);
        assert_eq!(summary.dtype_of("Jan"), Some("float"));
        assert_eq!(summary.missing_of("Jan"), Some(1));
        assert_eq!(summary.total_missing(), 1);
        assert_eq!(summary.shape_label(), "2 rows × 2 columns");
    }
}
