use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "random_forest_model.json";
pub const DEFAULT_LOG_FILTER: &str = "diabetes_risk=info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Trained model artifact
    pub model_path: PathBuf,
    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Config {
    /// Reads `DIABETES_MODEL_PATH` and `RUST_LOG`; call `dotenvy::dotenv()` first to honour `.env`.
    pub fn from_env() -> Self {
        Self {
            model_path: env::var("DIABETES_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_model_override(mut self, model: Option<PathBuf>) -> Self {
        if let Some(path) = model {
            self.model_path = path;
        }
        self
    }
}
