use std::sync::Arc;

use tracing::{error, info};

use crate::config::{api_key_from_env, usable_api_key, ServiceConfig, API_KEY_VAR};
use crate::engine::{GeminiEngine, TextEngine};
use crate::ml::artifact::{self, ArtifactError};
use crate::ml::StrokePipeline;

/// Process-wide dependencies, built once at startup and read-only afterwards.
///
/// Either half may be absent; the endpoints that need it then answer with a
/// degraded-service error instead of the process refusing to start.
pub struct AppState {
    pipeline: Option<Arc<StrokePipeline>>,
    engine: Option<Arc<dyn TextEngine>>,
}

impl AppState {
    pub fn new(pipeline: Option<Arc<StrokePipeline>>, engine: Option<Arc<dyn TextEngine>>) -> Self {
        Self { pipeline, engine }
    }

    /// Loads the model and builds the engine from `GEMINI_API_KEY`.
    pub fn initialize(config: &ServiceConfig) -> Self {
        Self::initialize_with_key(config, api_key_from_env())
    }

    pub fn initialize_with_key(config: &ServiceConfig, api_key: Option<String>) -> Self {
        let pipeline = match artifact::load(&config.model_path) {
            Ok(pipeline) => {
                info!(path = %config.model_path.display(), "model loaded");
                Some(Arc::new(pipeline))
            }
            Err(ArtifactError::NotFound(path)) => {
                error!(
                    path = %path.display(),
                    "model file not found, run the `train` binary first to generate it"
                );
                None
            }
            Err(e) => {
                error!(error = %e, "failed to load model");
                None
            }
        };

        let engine: Option<Arc<dyn TextEngine>> = match usable_api_key(api_key) {
            None => {
                error!("{API_KEY_VAR} not found in environment, chat and planner are disabled");
                None
            }
            Some(key) => match GeminiEngine::new(&key, &config.gemini_base_url, &config.gemini_model) {
                Ok(engine) => {
                    info!(model = %config.gemini_model, "Gemini model initialized");
                    Some(Arc::new(engine))
                }
                Err(e) => {
                    error!(error = %e, "failed to initialize Gemini model");
                    None
                }
            },
        };

        Self::new(pipeline, engine)
    }

    pub fn pipeline(&self) -> Option<Arc<StrokePipeline>> {
        self.pipeline.clone()
    }

    pub fn engine(&self) -> Option<Arc<dyn TextEngine>> {
        self.engine.clone()
    }

    pub fn is_degraded(&self) -> bool {
        self.pipeline.is_none() || self.engine.is_none()
    }
}
