//! Climate dashboard application shell.
//!
//! Wires the preprocessing and learning crates into the dashboard pages:
//!
//! 1. **Datasets**: what loaded from the configured sources and what failed
//! 2. **Preprocessing**: reshape, missing values and type coercion on working
//!    copies, then completion into processed datasets
//! 3. **Exploratory analysis**: description and charts of processed datasets
//! 4. **Modeling**: feature selection, training and the saved model artifact
//! 5. **Prediction**: a single value from the saved model
//!
//! Every page is a set of functions in [`commands`] operating on one shared
//! [`AppState`]. The `climate-dashboard` binary exposes them on the command
//! line and through JSON session scripts ([`script`]).

pub mod commands;
pub mod config;
pub mod error;
pub mod script;
pub mod state;

pub use config::{ConfigError, DashboardConfig, DashboardConfigBuilder};
pub use error::{CommandError, CommandResult};
pub use script::{ScriptAction, ScriptReport, load_script, run_script};
pub use state::AppState;
