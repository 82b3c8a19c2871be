//! legalqa-generate
//!
//! Answer synthesis: prompt tokenization with truncation, beam search over a
//! T5 encoder-decoder (candle), a process-wide model instance and a stub
//! synthesizer for tests and development.

pub mod beam;
pub mod device;
pub mod model;
pub mod tokenize;

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::info;

use legalqa_core::config::{GenerationSettings, Settings};
use legalqa_core::traits::AnswerSynthesizer;

pub use beam::{beam_search, BeamSearchConfig, StepScorer};
pub use model::T5Synthesizer;

/// Returns canned text without running a model: either a fixed answer or the
/// leading words of the context.
#[derive(Debug, Clone)]
pub struct StubSynthesizer {
    canned: Option<String>,
    max_words: usize,
}

impl Default for StubSynthesizer {
    fn default() -> Self { Self { canned: None, max_words: 30 } }
}

impl StubSynthesizer {
    pub fn new() -> Self { Self::default() }

    pub fn with_answer(answer: impl Into<String>) -> Self { Self { canned: Some(answer.into()), ..Self::default() } }
}

impl AnswerSynthesizer for StubSynthesizer {
    fn synthesize(&self, _query: &str, context: &str) -> legalqa_core::Result<String> {
        if let Some(answer) = &self.canned { return Ok(answer.clone()); }
        let words: Vec<&str> = context.split_whitespace().take(self.max_words).collect();
        if words.is_empty() { return Ok("No context was available to answer from.".to_string()); }
        Ok(words.join(" "))
    }
}

static SHARED_MODEL: OnceLock<T5Synthesizer> = OnceLock::new();
static LOAD_LOCK: Mutex<()> = Mutex::new(());

/// Load the answer model once per process and hand out the same instance.
///
/// `generation` only applies to the first successful load.
pub fn shared_model(model_dir: &Path, generation: &GenerationSettings) -> Result<&'static T5Synthesizer> {
    if let Some(model) = SHARED_MODEL.get() { return Ok(model); }
    let _guard = LOAD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(model) = SHARED_MODEL.get() { return Ok(model); }
    let model = T5Synthesizer::load(model_dir, generation.clone())?;
    Ok(SHARED_MODEL.get_or_init(|| model))
}

/// Borrowed handle to the process-wide model.
#[derive(Clone, Copy)]
pub struct SharedSynthesizer(&'static T5Synthesizer);

impl SharedSynthesizer {
    pub fn new(model: &'static T5Synthesizer) -> Self { Self(model) }
}

impl AnswerSynthesizer for SharedSynthesizer {
    fn synthesize(&self, query: &str, context: &str) -> legalqa_core::Result<String> { self.0.synthesize(query, context) }
}

pub fn use_fake_synthesizer() -> bool {
    std::env::var("APP_USE_FAKE_SYNTHESIZER").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_synthesizer(settings: &Settings) -> Result<Box<dyn AnswerSynthesizer>> {
    if use_fake_synthesizer() { info!("Using StubSynthesizer"); return Ok(Box::new(StubSynthesizer::new())); }
    let model_dir = resolve_model_dir(settings.model_dir())?;
    Ok(Box::new(SharedSynthesizer::new(shared_model(&model_dir, &settings.generation)?)))
}

/// Model directory precedence: configured path > `APP_MODEL_DIR` > `MODEL_DIR` > `models/flan-t5-base`.
pub fn resolve_model_dir(configured: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = configured { if p.exists() { info!(path = %p.display(), "Using configured model dir"); return Ok(p); } }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { info!(path = %p.display(), "Using APP_MODEL_DIR"); return Ok(p); } }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { info!(path = %p.display(), "Using MODEL_DIR"); return Ok(p); } }
    let fallback = Path::new("models/flan-t5-base");
    if fallback.exists() { info!(path = %fallback.display(), "Using default model dir"); return Ok(fallback.to_path_buf()); }
    Err(anyhow!("Could not locate answer model directory"))
}
