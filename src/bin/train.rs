use std::path::PathBuf;

use anyhow::Context;
use stroke_risk_service::ml::training::{self, TrainingConfig};
use stroke_risk_service::telemetry;

/// Usage: `train [DATASET_CSV] [OUTPUT_ARTIFACT]`
fn main() -> anyhow::Result<()> {
    telemetry::init();

    let mut config = TrainingConfig::default();
    let mut args = std::env::args().skip(1);
    if let Some(dataset) = args.next() {
        config.dataset_path = PathBuf::from(dataset);
    }
    if let Some(output) = args.next() {
        config.output_path = PathBuf::from(output);
    }

    let outcome = training::run(&config)
        .with_context(|| format!("training on `{}` failed", config.dataset_path.display()))?;

    println!("\n--- Model Evaluation on Test Set ---\n");
    println!("{}", outcome.evaluation);
    println!(
        "\nPipeline (imputer, scaler, encoder, SMOTE k={}, {} trees) saved as '{}'",
        outcome.smote_neighbors,
        config.n_trees,
        config.output_path.display()
    );
    Ok(())
}
