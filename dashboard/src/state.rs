//! Application State Management
//!
//! [`AppState`] holds everything a dashboard session touches: the
//! configuration, the dataset registry loaded at start-up, the preprocessing
//! session and the last training result. The registry never changes after
//! loading; mutable parts sit behind `parking_lot` locks.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          AppState                            │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │ config: DashboardConfig      │ registry: DatasetRegistry     │
//! │                              │ load_failures: Vec<..>        │
//! ├──────────────────────────────┼───────────────────────────────┤
//! │ session: RwLock<SessionState>│ training_result:              │
//! │ - working copies             │ RwLock<Option<TrainingResult>>│
//! │ - processed datasets         │                               │
//! │ - feature selection          │                               │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! The result types of the analysis page live here too, next to the state
//! they are computed from.

use climate_learning::TrainingResult;
use climate_processing::{DatasetRegistry, LoadFailure, SessionState};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DashboardConfig;

// ============================================================================
// ANALYSIS RESULTS
// ============================================================================

/// `describe()` row for one column.
///
/// Numeric columns fill the distribution fields; every other column fills
/// `unique`, `top` and `freq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column: String,
    pub dtype: String,
    /// Non-missing entries.
    pub count: usize,
    pub missing: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Histogram bin for numeric distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Box plot summary values for numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Most extreme values inside 1.5 IQR of the quartiles.
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    /// Values outside the whiskers.
    pub outliers: usize,
}

/// One point of a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub x: serde_json::Value,
    pub y: Option<f64>,
}

/// Points of `y` against `x`, sorted by `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub x: String,
    pub y: String,
    pub points: Vec<LinePoint>,
}

/// Heatmap matrix structure for correlations.
///
/// `None` marks pairs with fewer than two complete rows or no variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Everything the analysis page shows for one processed dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub dataset: String,
    pub rows: usize,
    pub columns: usize,
    pub description: Vec<ColumnDescription>,
    pub numeric_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Vec<HistogramBin>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_plot: Option<BoxPlotSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<HeatmapMatrix>,
    /// Sections that could not be drawn, e.g. too few numeric columns.
    pub notes: Vec<String>,
}

// ============================================================================
// APP STATE
// ============================================================================

/// Shared state behind every dashboard command.
///
/// ```rust,ignore
/// let state = AppState::new(DashboardConfig::load(None)?);
/// let summary = state.session.write().select_dataset(&state.registry, name)?;
/// ```
pub struct AppState {
    /// Settings the session was started with.
    pub config: DashboardConfig,

    /// Every source that loaded, in configuration order.
    pub registry: DatasetRegistry,

    /// Sources that failed to load or harmonize.
    pub load_failures: Vec<LoadFailure>,

    /// Working copies, processed datasets and the feature selection.
    pub session: RwLock<SessionState>,

    /// Result of the most recent successful training run.
    pub training_result: RwLock<Option<TrainingResult>>,
}

impl AppState {
    /// Load every configured source and start an empty session.
    pub fn new(config: DashboardConfig) -> Self {
        let report = DatasetRegistry::load(&config.registry);
        for failure in &report.failures {
            warn!("{}", failure.error);
        }
        info!(
            "Loaded {} datasets ({} failed)",
            report.registry.len(),
            report.failures.len()
        );

        let mut state = Self::with_registry(config, report.registry);
        state.load_failures = report.failures;
        state
    }

    /// Start a session over an already loaded registry.
    pub fn with_registry(config: DashboardConfig, registry: DatasetRegistry) -> Self {
        Self {
            config,
            registry,
            load_failures: Vec::new(),
            session: RwLock::new(SessionState::new()),
            training_result: RwLock::new(None),
        }
    }
}

static_assertions::assert_impl_all!(AppState: Send, Sync);
