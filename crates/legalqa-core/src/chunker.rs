//! Fixed-size word grouping.

pub const DEFAULT_CHUNK_SIZE: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Number of whitespace-delimited tokens per chunk.
    pub group_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { group_size: DEFAULT_CHUNK_SIZE } }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self { Self { config } }

    pub fn with_group_size(group_size: usize) -> Self { Self::new(ChunkingConfig { group_size }) }

    pub fn group_size(&self) -> usize { self.config.group_size }

    pub fn chunk(&self, text: &str) -> Vec<String> { chunk(text, self.config.group_size) }
}

/// Split `text` on whitespace and join consecutive runs of `group_size`
/// tokens with single spaces. The last run may be shorter.
///
/// A `group_size` of zero is treated as one.
pub fn chunk(text: &str, group_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(group_size.max(1)).map(|run| run.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_text_yield_no_chunks() {
        assert!(chunk("", 300).is_empty());
        assert!(chunk(" \n\t ", 300).is_empty());
    }

    #[test]
    fn zero_group_size_does_not_panic() {
        assert_eq!(chunk("a b", 0), vec!["a", "b"]);
    }
}
