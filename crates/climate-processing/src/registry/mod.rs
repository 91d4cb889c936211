//! Dataset registry: loads every configured source once and owns the
//! originals for the lifetime of the session.
//!
//! Loading never stops at the first bad file. Each failure is recorded in the
//! [`LoadReport`] next to the datasets that did load, so callers can surface
//! it while the rest of the dashboard keeps working.

pub mod cells;
pub mod geo;
pub mod tabular;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{DatasetSource, RegistryConfig, SourceKind};
use crate::error::{PreprocessingError, Result};

pub use geo::{BoundingBox, Coord, Crs, GeoLayer, Geometry, layer_title};

/// A loaded source, immutable once in the registry.
#[derive(Debug, Clone)]
pub enum Dataset {
    Tabular(DataFrame),
    Geospatial(GeoLayer),
}

impl Dataset {
    /// Row/column view of the dataset. Layers expose their attribute table.
    pub fn table(&self) -> &DataFrame {
        match self {
            Dataset::Tabular(df) => df,
            Dataset::Geospatial(layer) => &layer.attributes,
        }
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Dataset::Tabular(_) => None,
            Dataset::Geospatial(layer) => Some(&layer.crs),
        }
    }

    pub fn layer(&self) -> Option<&GeoLayer> {
        match self {
            Dataset::Tabular(_) => None,
            Dataset::Geospatial(layer) => Some(layer),
        }
    }

    pub fn is_tabular(&self) -> bool {
        matches!(self, Dataset::Tabular(_))
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Dataset::Tabular(_) => "tabular",
            Dataset::Geospatial(_) => "geospatial",
        }
    }
}

/// A source that could not be loaded or harmonized.
#[derive(Debug, Serialize)]
pub struct LoadFailure {
    pub dataset: String,
    pub error: PreprocessingError,
}

/// Outcome of [`DatasetRegistry::load`].
#[derive(Debug)]
pub struct LoadReport {
    pub registry: DatasetRegistry,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Named datasets in configuration order.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: Vec<(String, Dataset)>,
}

impl DatasetRegistry {
    /// Load every configured source, then apply harmonization pairs.
    ///
    /// A harmonization failure removes the target layer from the registry
    /// and is reported like a load failure.
    pub fn load(config: &RegistryConfig) -> LoadReport {
        let mut registry = DatasetRegistry::default();
        let mut failures = Vec::new();

        for source in &config.sources {
            match load_source(config, source) {
                Ok(dataset) => {
                    info!(
                        "Loaded '{}' ({}, {} rows)",
                        source.name,
                        source.kind.as_str(),
                        dataset.table().height()
                    );
                    registry.insert(source.name.clone(), dataset);
                }
                Err(e) => {
                    let error = as_load_error(&source.name, e);
                    warn!("{}", error);
                    failures.push(LoadFailure {
                        dataset: source.name.clone(),
                        error,
                    });
                }
            }
        }

        for pair in &config.harmonize {
            if let Err(e) = registry.harmonize(&pair.layer, &pair.reference) {
                let error = as_load_error(&pair.layer, e);
                warn!("{}", error);
                registry.remove(&pair.layer);
                failures.push(LoadFailure {
                    dataset: pair.layer.clone(),
                    error,
                });
            }
        }

        LoadReport { registry, failures }
    }

    /// Insert or replace a dataset.
    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        let name = name.into();
        match self.datasets.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = dataset,
            None => self.datasets.push((name, dataset)),
        }
    }

    fn remove(&mut self, name: &str) {
        self.datasets.retain(|(n, _)| n != name);
    }

    /// Reproject `layer` onto the CRS of `reference`.
    ///
    /// Skipped when either layer failed to load.
    fn harmonize(&mut self, layer: &str, reference: &str) -> Result<()> {
        let Some(target_crs) = self.get(reference).and_then(Dataset::crs).cloned() else {
            warn!("Skipping harmonization of '{}': '{}' is not loaded", layer, reference);
            return Ok(());
        };
        let Some(current) = self.get(layer).and_then(Dataset::layer) else {
            return Ok(());
        };
        let reprojected = current.to_crs(&target_crs)?;
        info!("Harmonized '{}' onto {} of '{}'", layer, target_crs, reference);
        self.insert(layer, Dataset::Geospatial(reprojected));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, dataset)| dataset)
    }

    /// Dataset by name or `DatasetNotFound`.
    pub fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.get(name)
            .ok_or_else(|| PreprocessingError::DatasetNotFound(name.to_string()))
    }

    /// Tabular dataset by name; layers are rejected with `NotTabular`.
    pub fn table(&self, name: &str) -> Result<&DataFrame> {
        match self.dataset(name)? {
            Dataset::Tabular(df) => Ok(df),
            Dataset::Geospatial(_) => Err(PreprocessingError::NotTabular(name.to_string())),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn tabular_names(&self) -> Vec<&str> {
        self.datasets
            .iter()
            .filter(|(_, dataset)| dataset.is_tabular())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

fn load_source(config: &RegistryConfig, source: &DatasetSource) -> Result<Dataset> {
    let path = config.resolve(source);
    Ok(match source.kind {
        SourceKind::Csv => Dataset::Tabular(tabular::read_csv(&path)?),
        SourceKind::Spreadsheet => Dataset::Tabular(tabular::read_spreadsheet(&path)?),
        SourceKind::GeoJson => Dataset::Geospatial(geo::read_geojson(&path)?),
        SourceKind::Shapefile => Dataset::Geospatial(geo::read_shapefile(&path)?),
    })
}

fn as_load_error(dataset: &str, error: PreprocessingError) -> PreprocessingError {
    match error {
        PreprocessingError::Load { .. } => error,
        other => PreprocessingError::load(dataset, other),
    }
}
