use anyhow::{Context, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::api_connection::endpoints::DEFAULT_BASE_URL;
use crate::api_connection::FoodDataError;

pub const APP_ID_ENV_VAR: &str = "EDAMAM_APP_ID";
pub const APP_KEY_ENV_VAR: &str = "EDAMAM_APP_KEY";
pub const BASE_URL_ENV_VAR: &str = "EDAMAM_BASE_URL";
pub const MAX_RESULTS_ENV_VAR: &str = "RECIPE_MIXER_MAX_RESULTS";
pub const ALLOW_DUPLICATES_ENV_VAR: &str = "RECIPE_MIXER_ALLOW_DUPLICATES";
pub const CACHE_CAPACITY_ENV_VAR: &str = "RECIPE_MIXER_CACHE_CAPACITY";

pub const DEFAULT_MAX_RESULTS: usize = 10;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_allow_duplicates() -> bool {
    true
}

#[derive(Clone, Deserialize)]
pub struct FoodDataConfig {
    pub app_id: String,
    #[serde(alias = "api_key")]
    pub app_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on candidates returned by a search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// When false, adding a food already in the list with the same measure
    /// adds to that line's quantity instead of creating a new line.
    #[serde(default = "default_allow_duplicates")]
    pub allow_duplicate_ingredients: bool,
    /// LRU bound for the request cache; `None` keeps every response.
    #[serde(default)]
    pub cache_capacity: Option<usize>,
}

// Credentials must never end up in logs.
impl fmt::Debug for FoodDataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoodDataConfig")
            .field("app_id", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("allow_duplicate_ingredients", &self.allow_duplicate_ingredients)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl FoodDataConfig {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
            base_url: default_base_url(),
            max_results: DEFAULT_MAX_RESULTS,
            allow_duplicate_ingredients: true,
            cache_capacity: None,
        }
    }

    /// Reads the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let app_id = lookup(APP_ID_ENV_VAR)
            .ok_or_else(|| FoodDataError::MissingCredential(APP_ID_ENV_VAR.to_string()))?;
        let app_key = lookup(APP_KEY_ENV_VAR)
            .ok_or_else(|| FoodDataError::MissingCredential(APP_KEY_ENV_VAR.to_string()))?;

        let mut config = Self::new(app_id, app_key);
        if let Some(base_url) = lookup(BASE_URL_ENV_VAR) {
            config.base_url = base_url;
        }
        if let Some(max_results) = lookup(MAX_RESULTS_ENV_VAR) {
            config.max_results = max_results
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer", MAX_RESULTS_ENV_VAR))?;
        }
        if let Some(allow) = lookup(ALLOW_DUPLICATES_ENV_VAR) {
            config.allow_duplicate_ingredients = allow
                .trim()
                .parse()
                .with_context(|| format!("{} must be true or false", ALLOW_DUPLICATES_ENV_VAR))?;
        }
        if let Some(capacity) = lookup(CACHE_CAPACITY_ENV_VAR) {
            let capacity: usize = capacity
                .trim()
                .parse()
                .with_context(|| format!("{} must be an integer", CACHE_CAPACITY_ENV_VAR))?;
            config.cache_capacity = Some(capacity);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file such as:
    ///
    /// ```toml
    /// app_id = "..."
    /// app_key = "..."
    /// max_results = 5
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: FoodDataConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FoodDataError> {
        if self.app_id.trim().is_empty() {
            return Err(FoodDataError::MissingCredential("app_id".to_string()));
        }
        if self.app_key.trim().is_empty() {
            return Err(FoodDataError::MissingCredential("app_key".to_string()));
        }
        if self.max_results == 0 {
            return Err(FoodDataError::InvalidRequest(
                "max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
