use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use legalqa_core::config::GenerationSettings;
use legalqa_core::error::Error;
use legalqa_core::traits::AnswerSynthesizer;

use crate::beam::{beam_search, BeamSearchConfig, StepScorer};
use crate::device::select_device;
use crate::tokenize::{build_prompt, tokenize_on_device};

/// Encoder-decoder answer model (T5 family) loaded from a local directory
/// holding `config.json`, `tokenizer.json` and `model.safetensors` or
/// `pytorch_model.bin`.
pub struct T5Synthesizer {
    // candle's T5 keeps a kv cache behind `&mut self`
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    generation: GenerationSettings,
    decoder_start_token_id: u32,
    eos_token_id: u32,
}

impl T5Synthesizer {
    pub fn load(model_dir: &Path, generation: GenerationSettings) -> Result<Self> {
        let start = Instant::now();
        let device = select_device();
        info!(model_dir = %model_dir.display(), "Loading answer model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).with_context(|| format!("Failed to read {}", config_path.display()))?;
        let mut config: T5Config = serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", config_path.display()))?;
        // every beam re-runs the decoder over its full prefix
        config.use_cache = false;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = T5ForConditionalGeneration::load(vb, &config)?;

        let decoder_start_token_id = config.decoder_start_token_id.unwrap_or(config.pad_token_id) as u32;
        let eos_token_id = config.eos_token_id as u32;
        info!(elapsed_ms = start.elapsed().as_millis() as u64, vocab = config.vocab_size, "Answer model loaded");
        Ok(Self { model: Mutex::new(model), tokenizer, device, generation, decoder_start_token_id, eos_token_id })
    }

    pub fn generate(&self, query: &str, context: &str) -> Result<String> {
        let start = Instant::now();
        let prompt = build_prompt(query, context);
        let input_ids = tokenize_on_device(&self.tokenizer, &prompt, self.generation.max_input_tokens, &self.device)?;

        let mut model = self.model.lock().map_err(|_| anyhow!("Answer model lock poisoned"))?;
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;
        let config = BeamSearchConfig::from_settings(&self.generation, self.decoder_start_token_id, self.eos_token_id);
        let mut scorer = T5StepScorer { model: &mut *model, encoder_output: &encoder_output, device: &self.device };
        let tokens = beam_search(&mut scorer, &config)?;
        drop(model);

        let answer = self.tokenizer.decode(&tokens, true).map_err(|e| anyhow!("Decoding failed: {}", e))?;
        debug!(input_tokens = input_ids.dim(1)?, output_tokens = tokens.len(), elapsed_ms = start.elapsed().as_millis() as u64, "generated answer");
        Ok(answer.trim().to_string())
    }
}

impl AnswerSynthesizer for T5Synthesizer {
    fn synthesize(&self, query: &str, context: &str) -> legalqa_core::Result<String> {
        self.generate(query, context).map_err(|e| Error::ModelInference(format!("{:#}", e)))
    }
}

struct T5StepScorer<'a> {
    model: &'a mut T5ForConditionalGeneration,
    encoder_output: &'a Tensor,
    device: &'a Device,
}

impl StepScorer for T5StepScorer<'_> {
    fn next_log_probs(&mut self, prefix: &[u32]) -> Result<Vec<f32>> {
        let decoder_ids = Tensor::new(prefix, self.device)?.unsqueeze(0)?;
        let logits = self.model.decode(&decoder_ids, self.encoder_output)?;
        let logits = logits.squeeze(0)?.to_dtype(DType::F32)?;
        let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;
        Ok(log_probs.to_vec1::<f32>()?)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!(path = %safetensors.display(), "Loading safetensors weights");
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        debug!(path = %pickle.display(), "Loading pickle weights");
        let weights = candle_core::pickle::read_all(&pickle)?;
        return Ok(weights.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}
