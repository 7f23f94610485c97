//! Runtime settings.

use std::path::PathBuf;

/// Environment variable naming the statement directory.
pub const DATA_DIR_VAR: &str = "FIN_HEALTH_DATA_DIR";

/// Environment variable naming the model artifact.
pub const MODEL_VAR: &str = "FIN_HEALTH_MODEL";

/// Where statements and the fitted model are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory of `<SYMBOL>.json` statement files
    pub data_dir: PathBuf,
    /// JSON model bundle
    pub model_path: PathBuf,
}

impl Settings {
    /// Read settings from the environment, falling back to `data` and
    /// `model.json` in the working directory.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_dir: lookup(DATA_DIR_VAR)
                .map_or_else(|| PathBuf::from("data"), PathBuf::from),
            model_path: lookup(MODEL_VAR)
                .map_or_else(|| PathBuf::from("model.json"), PathBuf::from),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
