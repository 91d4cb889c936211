//! Command Modules
//!
//! One module per dashboard page. Every command takes the shared
//! [`AppState`](crate::state::AppState) and returns a serializable value or a
//! [`CommandError`](crate::error::CommandError).
//!
//! # Module Organization
//!
//! - **datasets**: loaded datasets, load failures and dataset previews
//! - **preprocessing**: working copies, stages, undo and completion
//! - **analysis**: description, histogram, line, box plot and correlation
//! - **ml**: feature selection, training and prediction

pub mod analysis;
pub mod datasets;
pub mod ml;
pub mod preprocessing;

pub use analysis::*;
pub use datasets::*;
pub use ml::*;
pub use preprocessing::*;
