use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::dataset::{FeatureError, FeatureSchema, PatientFeatures};
use super::forest::{BaggedTrees, ForestParams};
use super::preprocess::Preprocessor;
use super::smote::Smote;
use super::ModelError;

/// Positive-class probabilities at or above this value are labelled "Stroke".
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "Stroke")]
    Stroke,
    #[serde(rename = "No Stroke")]
    NoStroke,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Stroke => "Stroke",
            RiskLabel::NoStroke => "No Stroke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskPrediction {
    pub label: RiskLabel,
    pub probability: f64,
}

impl RiskPrediction {
    pub fn from_probability(probability: f64) -> Self {
        let label = if probability >= DECISION_THRESHOLD {
            RiskLabel::Stroke
        } else {
            RiskLabel::NoStroke
        };
        Self { label, probability }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineParams {
    pub smote_max_neighbors: usize,
    pub forest: ForestParams,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            smote_max_neighbors: 5,
            forest: ForestParams::default(),
        }
    }
}

/// Fitted preprocessing plus classifier, applied to one patient at a time
/// by the service and to whole partitions during training.
#[derive(Debug, Serialize, Deserialize)]
pub struct StrokePipeline {
    schema: FeatureSchema,
    preprocessor: Preprocessor,
    forest: BaggedTrees,
}

impl StrokePipeline {
    /// Preprocess, oversample the minority class, then fit the forest.
    ///
    /// Oversampling only ever sees the rows passed in here.
    pub fn fit(
        schema: FeatureSchema,
        rows: &[PatientFeatures],
        labels: &[usize],
        params: &PipelineParams,
    ) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::Empty);
        }
        let preprocessor = Preprocessor::fit(&schema, rows);
        let records = preprocessor.transform_batch(rows)?;

        let smote = Smote {
            max_neighbors: params.smote_max_neighbors,
            seed: params.forest.seed,
        };
        let resampled = smote.resample(&records, labels)?;
        info!(
            k_neighbors = resampled.neighbors,
            rows = resampled.labels.len(),
            "oversampled minority class"
        );

        let forest = params.forest.fit(&resampled.records, &resampled.labels)?;
        info!(trees = forest.n_trees(), features = forest.n_features(), "forest fitted");

        Ok(Self {
            schema,
            preprocessor,
            forest,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn predict_proba(&self, rows: &[PatientFeatures]) -> Result<Vec<f64>, ModelError> {
        let records = self.preprocessor.transform_batch(rows)?;
        self.forest.predict_proba(&records)
    }

    /// Scores one JSON patient record. The identifier and any other keys
    /// outside the trained schema are ignored.
    pub fn predict_record(&self, record: &Map<String, Value>) -> Result<RiskPrediction, PredictionError> {
        let features = self.schema.extract(record)?;
        let probability = self
            .predict_proba(std::slice::from_ref(&features))?
            .first()
            .copied()
            .ok_or(ModelError::Empty)?;
        Ok(RiskPrediction::from_probability(probability))
    }
}
