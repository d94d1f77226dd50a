//! Offline training job: dataset in, evaluated artifact out.

use std::path::PathBuf;

use tracing::info;

use super::artifact::{self, ArtifactError};
use super::dataset::{class_ratio, DatasetError, DatasetOptions, LabeledDataset, PatientFeatures};
use super::forest::ForestParams;
use super::metrics::Evaluation;
use super::pipeline::{PipelineParams, StrokePipeline, DECISION_THRESHOLD};
use super::smote::neighbor_count;
use super::split::stratified_split;
use super::ModelError;

pub const DEFAULT_DATASET_PATH: &str = "DATA/healthcare-dataset-stroke-data.csv";
pub const DEFAULT_ARTIFACT_PATH: &str = "random_forest_stroke_model_v2.json";

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub output_path: PathBuf,
    pub dataset: DatasetOptions,
    pub test_fraction: f64,
    pub seed: u64,
    pub n_trees: usize,
    pub max_smote_neighbors: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            output_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            dataset: DatasetOptions::default(),
            test_fraction: 0.2,
            seed: 42,
            n_trees: 100,
            max_smote_neighbors: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub pipeline: StrokePipeline,
    pub evaluation: Evaluation,
    pub train_size: usize,
    pub smote_neighbors: usize,
    pub test_rows: Vec<PatientFeatures>,
    pub test_labels: Vec<usize>,
    /// Positive-class probabilities on `test_rows`, in order.
    pub test_probabilities: Vec<f64>,
}

fn pick<T: Clone>(items: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| items[i].clone()).collect()
}

/// Fits and evaluates a pipeline without touching the filesystem beyond
/// reading the dataset.
pub fn train(config: &TrainingConfig) -> Result<TrainingOutcome, TrainingError> {
    let dataset = LabeledDataset::from_path(&config.dataset_path, &config.dataset)?;
    let (negative, positive) = dataset.class_ratio();
    info!(
        rows = dataset.len(),
        features = dataset.schema.width(),
        no_stroke = negative,
        stroke = positive,
        "class distribution"
    );
    info!(numeric = ?dataset.schema.numeric, categorical = ?dataset.schema.categorical, "identified features");

    let split = stratified_split(&dataset.labels, config.test_fraction, config.seed);
    let train_rows = pick(&dataset.rows, &split.train);
    let train_labels = pick(&dataset.labels, &split.train);
    let test_rows = pick(&dataset.rows, &split.test);
    let test_labels = pick(&dataset.labels, &split.test);
    info!(
        train = train_rows.len(),
        test = test_rows.len(),
        train_stroke = class_ratio(&train_labels).1,
        test_stroke = class_ratio(&test_labels).1,
        "stratified split"
    );

    let minority = train_labels.iter().filter(|&&l| l == 1).count();
    let smote_neighbors = neighbor_count(minority, config.max_smote_neighbors);
    info!(k_neighbors = smote_neighbors, "training with SMOTE for class imbalance");

    let params = PipelineParams {
        smote_max_neighbors: config.max_smote_neighbors,
        forest: ForestParams {
            n_trees: config.n_trees,
            max_depth: None,
            seed: config.seed,
        },
    };
    let pipeline = StrokePipeline::fit(dataset.schema.clone(), &train_rows, &train_labels, &params)?;
    info!("model training complete");

    let test_probabilities = pipeline.predict_proba(&test_rows)?;
    // a 50/50 vote counts as stroke here, as it does when serving
    let evaluation = Evaluation::new(&test_labels, &test_probabilities, DECISION_THRESHOLD);

    Ok(TrainingOutcome {
        pipeline,
        evaluation,
        train_size: train_rows.len(),
        smote_neighbors,
        test_rows,
        test_labels,
        test_probabilities,
    })
}

/// [`train`], then persist the fitted pipeline to `config.output_path`.
pub fn run(config: &TrainingConfig) -> Result<TrainingOutcome, TrainingError> {
    let outcome = train(config)?;
    artifact::save(&config.output_path, &outcome.pipeline)?;
    info!(path = %config.output_path.display(), "pipeline saved");
    Ok(outcome)
}
