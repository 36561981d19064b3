use crate::{
    constants::{DEFAULT_CONTEXT_SOURCE, DEFAULT_INSTITUTION, DEFAULT_MODEL, GEMINI_API_URL},
    errors::{ConsejeroError, ConsejeroResult},
};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    /// An `http(s)://` URL or a path to the knowledge document.
    pub context_source: String,
    pub institution: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: GEMINI_API_URL.to_string(),
            context_source: DEFAULT_CONTEXT_SOURCE.to_string(),
            institution: DEFAULT_INSTITUTION.to_string(),
            temperature: None,
            max_output_tokens: None,
            log_level: "info".to_string(),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Loads the configuration from the default config file (if any) and
    /// the process environment.
    pub fn load() -> ConsejeroResult<Self> {
        let path = env::var_os("CONSEJERO_CONFIG")
            .map(PathBuf::from)
            .or_else(get_config_path);
        Self::load_from(path.as_deref(), |key| env::var(key).ok())
    }

    /// Layers an optional JSON config file and environment lookups over the
    /// defaults, then validates the result.
    pub fn load_from(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConsejeroResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let config_str = fs::read_to_string(path).map_err(|e| {
                    ConsejeroError::config_error(format!("Failed to read config file: {}", e))
                })?;
                serde_json::from_str(&config_str).map_err(|e| {
                    ConsejeroError::config_error(format!("Failed to parse config: {}", e))
                })?
            }
            _ => Config::default(),
        };

        config.apply_env(lookup);
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("VITE_GEMINI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("CONSEJERO_MODEL") {
            self.model = model;
        }
        if let Some(source) = non_empty("CONSEJERO_CONTEXT") {
            self.context_source = source;
        }
        if let Some(level) = non_empty("CONSEJERO_LOG_LEVEL") {
            self.log_level = level;
        }
    }
}

fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("consejero").join("config.json"))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("consejero").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

pub fn validate_config(config: &Config) -> ConsejeroResult<()> {
    // The API key is checked when the conversation starts, not here.
    if config.model.trim().is_empty() {
        return Err(ConsejeroError::config_error("Model name is required"));
    }

    if !config.api_base_url.starts_with("http://") && !config.api_base_url.starts_with("https://") {
        return Err(ConsejeroError::config_error(format!(
            "api_base_url must be an http(s) URL, got '{}'",
            config.api_base_url
        )));
    }

    if config.context_source.trim().is_empty() {
        return Err(ConsejeroError::config_error("context_source is required"));
    }

    if let Some(temperature) = config.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConsejeroError::config_error(
                "Temperature must be between 0.0 and 2.0",
            ));
        }
    }

    if config.max_output_tokens == Some(0) {
        return Err(ConsejeroError::config_error(
            "max_output_tokens must be greater than 0",
        ));
    }

    Ok(())
}
