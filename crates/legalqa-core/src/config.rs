//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys are addressed with `__` in env vars, e.g.
//! `APP_RETRIEVAL__RELEVANCE_THRESHOLD=0.2`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};

pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.1;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Typed view of the merged configuration, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub documents_dir: String,
    pub model_dir: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self { Self { documents_dir: "dev_data/txt".to_string(), model_dir: None } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub chunk_size: usize,
    /// Scores at or below this value are not relevant.
    pub relevance_threshold: f32,
    /// Reuse the fitted vector space while the corpus is unchanged.
    pub cache_index: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD, cache_index: false }
    }
}

/// Beam search and input budget for the answer model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_input_tokens: usize,
    pub num_beams: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub length_penalty: f32,
    pub early_stopping: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { max_input_tokens: 1024, num_beams: 4, min_length: 30, max_length: 100, length_penalty: 2.0, early_stopping: true }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.chunk_size == 0 {
            return Err(Error::InvalidConfig("retrieval.chunk_size must be greater than 0".into()));
        }
        if !(0.0..=1.0).contains(&r.relevance_threshold) {
            return Err(Error::InvalidConfig(format!("retrieval.relevance_threshold must be within [0, 1], got {}", r.relevance_threshold)));
        }
        let g = &self.generation;
        if g.num_beams == 0 {
            return Err(Error::InvalidConfig("generation.num_beams must be at least 1".into()));
        }
        if g.max_length == 0 || g.max_input_tokens == 0 {
            return Err(Error::InvalidConfig("generation.max_length and generation.max_input_tokens must be greater than 0".into()));
        }
        if g.min_length > g.max_length {
            return Err(Error::InvalidConfig(format!("generation.min_length ({}) exceeds generation.max_length ({})", g.min_length, g.max_length)));
        }
        Ok(())
    }

    pub fn model_dir(&self) -> Option<PathBuf> { self.data.model_dir.as_deref().map(expand_path) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
