use std::path::PathBuf;

use rocket::figment::Figment;
use serde::Deserialize;
use tracing::warn;

use crate::engine::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::ml::training::DEFAULT_ARTIFACT_PATH;

/// Environment variable holding the generative-text API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Service settings read from Rocket's figment (`Rocket.toml`, `ROCKET_*`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub static_dir: PathBuf,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            static_dir: PathBuf::from("static"),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_figment(figment: &Figment) -> Self {
        figment.extract::<Self>().unwrap_or_else(|e| {
            warn!(error = %e, "invalid service configuration, using defaults");
            Self::default()
        })
    }
}

/// The API key, if set to something other than whitespace.
pub fn api_key_from_env() -> Option<String> {
    usable_api_key(std::env::var(API_KEY_VAR).ok())
}

pub fn usable_api_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string()).filter(|key| !key.is_empty())
}
