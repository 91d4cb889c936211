//! Configuration types for the dataset registry.
//!
//! Sources and harmonization pairs are declared up front and validated with
//! the builder pattern before anything is read from disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File format of a configured source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Comma separated values with a header row.
    Csv,
    /// First worksheet of an `.xlsx`, `.xls` or `.ods` workbook.
    Spreadsheet,
    /// GeoJSON FeatureCollection.
    GeoJson,
    /// ESRI shapefile (`.shp` with its `.dbf` and optional `.prj`).
    Shapefile,
}

impl SourceKind {
    /// Guess the kind from a file extension.
    pub fn from_path(path: &Path) -> Option<SourceKind> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(SourceKind::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(SourceKind::Spreadsheet),
            "geojson" | "json" => Some(SourceKind::GeoJson),
            "shp" => Some(SourceKind::Shapefile),
            _ => None,
        }
    }

    pub fn is_geospatial(&self) -> bool {
        matches!(self, SourceKind::GeoJson | SourceKind::Shapefile)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Csv => "csv",
            SourceKind::Spreadsheet => "spreadsheet",
            SourceKind::GeoJson => "geojson",
            SourceKind::Shapefile => "shapefile",
        }
    }
}

/// One named input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub name: String,
    /// Path relative to the registry data directory (absolute paths are kept).
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl DatasetSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }
}

/// Reproject `layer` onto the CRS of `reference` after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harmonization {
    pub layer: String,
    pub reference: String,
}

/// Configuration for the dataset registry.
///
/// Use [`RegistryConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use climate_processing::config::{RegistryConfig, SourceKind};
///
/// let config = RegistryConfig::builder()
///     .data_dir("data")
///     .source("Monthly Climate", "climate.csv", SourceKind::Csv)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory relative source paths are resolved against.
    /// Default: "."
    pub data_dir: PathBuf,

    /// Sources in load order. Names must be unique.
    pub sources: Vec<DatasetSource>,

    /// Layer pairs to harmonize once every source has been read.
    pub harmonize: Vec<Harmonization>,
}

impl Default for RegistryConfig {
    /// The district climate sources of the Nepal dashboard.
    fn default() -> Self {
        let shapefile = |name: &str, stem: &str| {
            DatasetSource::new(
                name,
                format!("data/{stem}_shape_file/{stem}.shp"),
                SourceKind::Shapefile,
            )
        };

        Self {
            data_dir: PathBuf::from("."),
            sources: vec![
                shapefile("National Boundary", "national_boundary"),
                shapefile("Provincial Boundary", "provincial_boundary"),
                shapefile("District Boundary (SHP)", "district_boundary"),
                shapefile("River Line", "river_line"),
                shapefile("River Polygon", "river_polygon"),
                DatasetSource::new(
                    "District Boundary (GeoJSON)",
                    "data/district.geojson",
                    SourceKind::GeoJson,
                ),
                DatasetSource::new(
                    "District Wise Monthly Climate",
                    "data/nepal_district_monthly_climate_data.csv",
                    SourceKind::Csv,
                ),
                DatasetSource::new(
                    "Climate Development Report",
                    "data/Nepal_Climate_Development_Report.xlsx",
                    SourceKind::Spreadsheet,
                ),
            ],
            harmonize: vec![Harmonization {
                layer: "District Boundary (GeoJSON)".to_string(),
                reference: "District Boundary (SHP)".to_string(),
            }],
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// Resolve a source path against the data directory.
    pub fn resolve(&self, source: &DatasetSource) -> PathBuf {
        if source.path.is_absolute() {
            source.path.clone()
        } else {
            self.data_dir.join(&source.path)
        }
    }

    pub fn source(&self, name: &str) -> Option<&DatasetSource> {
        self.sources.iter().find(|source| source.name == name)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (index, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigValidationError::EmptySourceName(index));
            }
            if self.sources[..index].iter().any(|s| s.name == source.name) {
                return Err(ConfigValidationError::DuplicateSource(source.name.clone()));
            }
        }

        for pair in &self.harmonize {
            for name in [&pair.layer, &pair.reference] {
                match self.source(name) {
                    None => return Err(ConfigValidationError::UnknownLayer(name.clone())),
                    Some(source) if !source.kind.is_geospatial() => {
                        return Err(ConfigValidationError::NotGeospatial(name.clone()));
                    }
                    Some(_) => {}
                }
            }
            if pair.layer == pair.reference {
                return Err(ConfigValidationError::SelfHarmonization(pair.layer.clone()));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Source #{0} has an empty name")]
    EmptySourceName(usize),

    #[error("Source '{0}' is configured more than once")]
    DuplicateSource(String),

    #[error("Harmonization refers to unknown layer '{0}'")]
    UnknownLayer(String),

    #[error("Harmonization layer '{0}' is not a geospatial source")]
    NotGeospatial(String),

    #[error("Layer '{0}' cannot be harmonized onto itself")]
    SelfHarmonization(String),
}

/// Builder for [`RegistryConfig`] with fluent API.
///
/// Starts from an empty source list; use [`RegistryConfig::default()`] for
/// the bundled dashboard sources.
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    data_dir: Option<PathBuf>,
    sources: Vec<DatasetSource>,
    harmonize: Vec<Harmonization>,
}

impl RegistryConfigBuilder {
    /// Set the directory relative source paths are resolved against.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Add a source.
    pub fn source(
        mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        kind: SourceKind,
    ) -> Self {
        self.sources.push(DatasetSource::new(name, path, kind));
        self
    }

    /// Reproject `layer` onto the CRS of `reference`.
    pub fn harmonize(mut self, layer: impl Into<String>, reference: impl Into<String>) -> Self {
        self.harmonize.push(Harmonization {
            layer: layer.into(),
            reference: reference.into(),
        });
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<RegistryConfig, ConfigValidationError> {
        let config = RegistryConfig {
            data_dir: self.data_dir.unwrap_or_else(|| PathBuf::from(".")),
            sources: self.sources,
            harmonize: self.harmonize,
        };

        config.validate()?;
        Ok(config)
    }
}
