//! Pipeline module.
//!
//! This module provides the preprocessing stages and the session state that
//! applies them to working copies.

mod session;
mod stage;

pub use session::{FeatureSelection, SessionState};
pub use stage::{PreprocessingStage, StageOutput, StageReport};
