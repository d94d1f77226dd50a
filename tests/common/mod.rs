#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use stroke_risk_service::engine::{EngineError, TextEngine};
use stroke_risk_service::ml::training::{self, TrainingConfig};
use stroke_risk_service::ml::StrokePipeline;

pub const HEADER: &str = "id,gender,age,hypertension,heart_disease,ever_married,work_type,Residence_type,avg_glucose_level,bmi,smoking_status,stroke";

/// Deterministic stand-in for the stroke dataset. Roughly one row in six is
/// positive: older patients with high glucose.
pub fn synthetic_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::from(HEADER);
    out.push('\n');

    for id in 0..rows {
        let gender = if id % 97 == 13 {
            "Other"
        } else {
            *["Male", "Female"].choose(&mut rng).unwrap()
        };
        let age: f64 = rng.gen_range(1.0..82.0);
        let hypertension = u8::from(rng.gen_bool(0.15));
        let heart_disease = u8::from(rng.gen_bool(0.08));
        let married = if age > 25.0 { "Yes" } else { "No" };
        let work = *["Private", "Self-employed", "Govt_job", "children", "Never_worked"]
            .choose(&mut rng)
            .unwrap();
        let residence = *["Urban", "Rural"].choose(&mut rng).unwrap();
        let glucose: f64 = rng.gen_range(55.0..270.0);
        let bmi = if rng.gen_bool(0.05) {
            "N/A".to_string()
        } else {
            format!("{:.1}", rng.gen_range(15.0..50.0))
        };
        let smoking = *["never smoked", "formerly smoked", "smokes", "Unknown"]
            .choose(&mut rng)
            .unwrap();
        let stroke = u8::from(age > 60.0 && glucose > 140.0);

        out.push_str(&format!(
            "{},{gender},{age:.1},{hypertension},{heart_disease},{married},{work},{residence},{glucose:.2},{bmi},{smoking},{stroke}\n",
            9000 + id
        ));
    }
    out
}

pub fn write_dataset(dir: &Path, rows: usize, seed: u64) -> PathBuf {
    let path = dir.join("stroke.csv");
    std::fs::write(&path, synthetic_csv(rows, seed)).unwrap();
    path
}

pub fn small_config(dir: &Path) -> TrainingConfig {
    TrainingConfig {
        dataset_path: write_dataset(dir, 400, 7),
        output_path: dir.join("model.json"),
        n_trees: 15,
        ..TrainingConfig::default()
    }
}

pub fn trained_pipeline() -> Arc<StrokePipeline> {
    let dir = tempfile::tempdir().unwrap();
    let outcome = training::train(&small_config(dir.path())).unwrap();
    Arc::new(outcome.pipeline)
}

pub fn patient() -> Value {
    json!({
        "id": 30669,
        "gender": "Male",
        "age": 74.0,
        "hypertension": 1,
        "heart_disease": 0,
        "ever_married": "Yes",
        "work_type": "Private",
        "Residence_type": "Urban",
        "avg_glucose_level": 228.69,
        "bmi": 36.6,
        "smoking_status": "formerly smoked"
    })
}

/// Fake engine that remembers every prompt it was sent.
pub struct RecordingEngine {
    pub reply: String,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingEngine {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn last_call(&self) -> Vec<String> {
        self.calls.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TextEngine for RecordingEngine {
    async fn generate(&self, parts: &[String]) -> Result<String, EngineError> {
        self.calls.lock().push(parts.to_vec());
        Ok(self.reply.clone())
    }
}

pub struct FailingEngine;

#[async_trait]
impl TextEngine for FailingEngine {
    async fn generate(&self, _parts: &[String]) -> Result<String, EngineError> {
        Err(EngineError::Upstream {
            status: 503,
            body: "model overloaded".to_string(),
        })
    }
}
