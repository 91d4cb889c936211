//! Climate Data Preprocessing Library
//!
//! Dataset loading and the interactive preprocessing pipeline behind the
//! climate dashboard, built on Polars.
//!
//! # Overview
//!
//! - **Dataset Registry**: loads CSV, spreadsheet, GeoJSON and shapefile
//!   sources once, reporting per-dataset load failures, and harmonizes the
//!   coordinate systems of paired layers
//! - **Column Inspector**: declared types and missing-value counts, memoized
//!   per working-copy generation
//! - **Reshape**: wide-to-long melt
//! - **Missing Values**: drop rows/columns or fill with mean, median or mode
//! - **Type Coercion**: all-or-nothing conversion to a fixed set of types
//! - **Session State**: working copies, one-step undo, processed datasets and
//!   the feature selection handed to model training
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use climate_processing::{
//!     DatasetRegistry, MeltParams, MissingStrategy, PreprocessingStage, RegistryConfig,
//!     SessionState,
//! };
//!
//! let report = DatasetRegistry::load(&RegistryConfig::default());
//! for failure in &report.failures {
//!     eprintln!("{}", failure.error);
//! }
//!
//! let mut session = SessionState::new();
//! let name = "District Wise Monthly Climate";
//! session.select_dataset(&report.registry, name)?;
//!
//! session.apply_stage(
//!     name,
//!     &PreprocessingStage::Melt(MeltParams::new(["District"], "Month", "Temp")),
//! )?;
//! session.apply_stage(
//!     name,
//!     &PreprocessingStage::HandleMissing { strategy: MissingStrategy::FillMean },
//! )?;
//! session.complete_preprocessing(name)?;
//! ```
//!
//! # Errors
//!
//! Stage failures ([`PreprocessingError::InvalidReshape`],
//! [`PreprocessingError::Strategy`], [`PreprocessingError::Coercion`]) leave
//! the working copy untouched and are safe to show to the user and retry.

pub mod coercion;
pub mod config;
pub mod error;
pub mod imputers;
pub mod inspector;
pub mod pipeline;
pub mod registry;
pub mod reshape;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use coercion::{coerce, convert_series};
pub use config::{
    ConfigValidationError, DatasetSource, Harmonization, RegistryConfig, RegistryConfigBuilder,
    SourceKind,
};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::{MissingStrategy, StatisticalImputer, apply_strategy, resolve_missing};
pub use inspector::{InspectorCache, inspect};
pub use pipeline::{FeatureSelection, PreprocessingStage, SessionState, StageReport};
pub use registry::{
    Crs, Dataset, DatasetRegistry, GeoLayer, Geometry, LoadFailure, LoadReport, layer_title,
};
pub use reshape::{MeltOutcome, MeltParams, melt};
pub use types::{ColumnSummary, ColumnType, MissingEntry, TypeEntry};
pub use utils::{is_numeric_dtype, meltable_columns, shape_label};
