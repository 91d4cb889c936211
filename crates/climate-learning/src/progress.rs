//! Progress reporting for training runs.
//!
//! A [`ProgressCallback`] receives a [`ProgressUpdate`] as the pipeline moves
//! through each [`TrainingStage`].

use std::sync::Arc;

/// Stages of a training run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrainingStage {
    /// Reading feature and target columns from the dataset.
    #[default]
    Extracting,

    /// Shuffling rows into training and test splits.
    Splitting,

    /// Fitting the model on the training split.
    Fitting,

    /// Scoring the model on the test split.
    Evaluating,

    /// Training finished successfully.
    Complete,
}

impl TrainingStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStage::Extracting => "extracting",
            TrainingStage::Splitting => "splitting",
            TrainingStage::Fitting => "fitting",
            TrainingStage::Evaluating => "evaluating",
            TrainingStage::Complete => "complete",
        }
    }

    /// Overall progress fraction when this stage starts.
    #[must_use]
    pub fn progress(&self) -> f64 {
        match self {
            TrainingStage::Extracting => 0.0,
            TrainingStage::Splitting => 0.2,
            TrainingStage::Fitting => 0.3,
            TrainingStage::Evaluating => 0.8,
            TrainingStage::Complete => 1.0,
        }
    }
}

/// A progress update emitted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub stage: TrainingStage,

    /// Overall progress in `[0.0, 1.0]`.
    pub progress: f64,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: TrainingStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.progress(),
            message: message.into(),
        }
    }
}

/// Callback invoked for each progress update.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_increases_with_stage() {
        let stages = [
            TrainingStage::Extracting,
            TrainingStage::Splitting,
            TrainingStage::Fitting,
            TrainingStage::Evaluating,
            TrainingStage::Complete,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].progress() < pair[1].progress(), "{:?}", pair);
        }
    }

    #[test]
    fn test_update_carries_stage_progress() {
        let update = ProgressUpdate::new(TrainingStage::Fitting, "Fitting Decision Tree");
        assert_eq!(update.progress, 0.3);
        assert_eq!(update.stage.as_str(), "fitting");
    }
}
