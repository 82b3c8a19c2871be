use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

pub fn build_prompt(query: &str, context: &str) -> String { format!("Question: {} Context: {}", query, context) }

/// Drop trailing tokens so at most `max_len` remain. A closing special token
/// (e.g. `</s>`) survives truncation.
pub fn truncate_ids(ids: &mut Vec<u32>, special_tokens_mask: &[u32], max_len: usize) {
    if ids.len() <= max_len { return; }
    let ends_with_special = special_tokens_mask.len() == ids.len() && special_tokens_mask.last() == Some(&1);
    if ends_with_special && max_len > 1 {
        let tail = ids[ids.len() - 1];
        ids.truncate(max_len - 1);
        ids.push(tail);
    } else {
        ids.truncate(max_len);
    }
}

pub fn encode_truncated(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<Vec<u32>> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    truncate_ids(&mut ids, enc.get_special_tokens_mask(), max_len);
    if ids.is_empty() { return Err(anyhow!("Tokenization produced no tokens")); }
    Ok(ids)
}

pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<Tensor> {
    let ids = encode_truncated(tokenizer, text, max_len)?;
    let len = ids.len();
    Ok(Tensor::from_iter(ids, device)?.reshape((1, len))?)
}
