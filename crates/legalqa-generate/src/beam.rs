//! Beam search decoding over any next-token scorer.
//!
//! Lengths count the whole decoder sequence, decoder start token included:
//! an answer has between `min_length - 1` and `max_length - 1` generated tokens
//! (a final EOS counts as generated).

use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use legalqa_core::config::GenerationSettings;

/// Log-probabilities over the vocabulary for the token following `prefix`.
///
/// `prefix` always starts with the decoder start token.
pub trait StepScorer {
    fn next_log_probs(&mut self, prefix: &[u32]) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamSearchConfig {
    pub num_beams: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub length_penalty: f32,
    pub early_stopping: bool,
    pub decoder_start_token_id: u32,
    pub eos_token_id: u32,
}

impl BeamSearchConfig {
    pub fn from_settings(settings: &GenerationSettings, decoder_start_token_id: u32, eos_token_id: u32) -> Self {
        Self {
            num_beams: settings.num_beams.max(1),
            min_length: settings.min_length,
            max_length: settings.max_length,
            length_penalty: settings.length_penalty,
            early_stopping: settings.early_stopping,
            decoder_start_token_id,
            eos_token_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub tokens: Vec<u32>,
    /// Sum of log-probabilities divided by `len^length_penalty`.
    pub score: f32,
}

/// The best `capacity` finished hypotheses seen so far.
struct Finished {
    capacity: usize,
    length_penalty: f32,
    items: Vec<Hypothesis>,
}

impl Finished {
    fn new(capacity: usize, length_penalty: f32) -> Self { Self { capacity, length_penalty, items: Vec::new() } }

    fn normalize(&self, sum_log_probs: f32, len: usize) -> f32 { sum_log_probs / (len.max(1) as f32).powf(self.length_penalty) }

    fn add(&mut self, tokens: Vec<u32>, sum_log_probs: f32) {
        let score = self.normalize(sum_log_probs, tokens.len());
        self.items.push(Hypothesis { tokens, score });
        if self.items.len() > self.capacity {
            if let Some(worst) = self.worst_index() { self.items.remove(worst); }
        }
    }

    fn worst_index(&self) -> Option<usize> {
        // later entries lose ties, so the earliest of equals is kept
        self.items.iter().enumerate().rev().min_by(|a, b| a.1.score.partial_cmp(&b.1.score).unwrap_or(Ordering::Equal)).map(|(i, _)| i)
    }

    fn is_done(&self, live: &[Beam], early_stopping: bool) -> bool {
        if self.items.len() < self.capacity { return false; }
        if early_stopping { return true; }
        let worst = self.items.iter().map(|h| h.score).fold(f32::INFINITY, f32::min);
        live.iter().all(|b| self.normalize(b.sum_log_probs, b.tokens.len()) <= worst)
    }

    fn best(self) -> Option<Hypothesis> {
        self.items.into_iter().fold(None, |best: Option<Hypothesis>, h| match best {
            Some(b) if b.score >= h.score => Some(b),
            _ => Some(h),
        })
    }
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    sum_log_probs: f32,
}

struct Candidate {
    beam: usize,
    token: u32,
    sum_log_probs: f32,
}

/// Run beam search and return the generated tokens of the best hypothesis.
///
/// EOS is masked while the sequence (start token included) is shorter than
/// `min_length`. Each step keeps the top
/// `2 * num_beams` continuations; an EOS continuation ranked within the first
/// `num_beams` finishes a hypothesis. Live beams still open when the sequence
/// reaches `max_length` are finalised as they are.
pub fn beam_search<S: StepScorer + ?Sized>(scorer: &mut S, config: &BeamSearchConfig) -> Result<Vec<u32>> {
    let beams = config.num_beams.max(1);
    let eos = config.eos_token_id as usize;
    let mut finished = Finished::new(beams, config.length_penalty);
    let mut live = vec![Beam { tokens: Vec::new(), sum_log_probs: 0.0 }];
    let mut done = false;

    for step in 0..config.max_length.saturating_sub(1) {
        let mut candidates = Vec::new();
        for (beam_index, beam) in live.iter().enumerate() {
            let mut prefix = Vec::with_capacity(beam.tokens.len() + 1);
            prefix.push(config.decoder_start_token_id);
            prefix.extend_from_slice(&beam.tokens);
            let mut log_probs = scorer.next_log_probs(&prefix)?;
            // the sequence is `step + 1` long, start token included
            if step + 1 < config.min_length && eos < log_probs.len() { log_probs[eos] = f32::NEG_INFINITY; }

            let mut order: Vec<usize> = (0..log_probs.len()).filter(|&t| log_probs[t].is_finite()).collect();
            order.sort_by(|&a, &b| log_probs[b].partial_cmp(&log_probs[a]).unwrap_or(Ordering::Equal).then(a.cmp(&b)));
            order.truncate(2 * beams);
            for token in order {
                candidates.push(Candidate { beam: beam_index, token: token as u32, sum_log_probs: beam.sum_log_probs + log_probs[token] });
            }
        }
        candidates.sort_by(|a, b| {
            b.sum_log_probs
                .partial_cmp(&a.sum_log_probs)
                .unwrap_or(Ordering::Equal)
                .then(a.beam.cmp(&b.beam))
                .then(a.token.cmp(&b.token))
        });
        candidates.truncate(2 * beams);

        let mut next = Vec::with_capacity(beams);
        for (rank, c) in candidates.iter().enumerate() {
            let mut tokens = live[c.beam].tokens.clone();
            tokens.push(c.token);
            if c.token == config.eos_token_id {
                if rank < beams { finished.add(tokens, c.sum_log_probs); }
            } else {
                next.push(Beam { tokens, sum_log_probs: c.sum_log_probs });
            }
            if next.len() == beams { break; }
        }
        live = next;

        if live.is_empty() || finished.is_done(&live, config.early_stopping) {
            done = true;
            break;
        }
    }

    if !done {
        for beam in live { finished.add(beam.tokens, beam.sum_log_probs); }
    }
    finished.best().map(|h| h.tokens).ok_or_else(|| anyhow!("Beam search produced no hypotheses"))
}
