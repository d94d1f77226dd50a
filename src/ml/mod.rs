//! Stroke risk model: data loading, preprocessing, oversampling, the tree
//! ensemble, evaluation and artifact persistence.

pub mod artifact;
pub mod dataset;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod smote;
pub mod split;
pub mod training;

pub use artifact::ArtifactError;
pub use dataset::{FeatureError, FeatureSchema, PatientFeatures};
pub use pipeline::{PredictionError, RiskLabel, RiskPrediction, StrokePipeline};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("expected {expected} features but received {actual}")]
    Shape { expected: usize, actual: usize },
    #[error("training data has no samples of class {0}")]
    DegenerateClasses(usize),
    #[error("training data is empty")]
    Empty,
    #[error("failed to fit decision tree: {0}")]
    Fit(String),
}
