use tantivy::tokenizer::{LowerCaser, RegexTokenizer, SimpleTokenizer, TextAnalyzer, TokenStream};
use tracing::warn;

/// A term is a run of word characters (letters, digits, `_`), two or more long.
pub const TERM_PATTERN: &str = r"\b\w\w+\b";

/// Terms shorter than this many characters are dropped.
pub const MIN_TERM_CHARS: usize = 2;

/// Splits text into lowercase terms matching [`TERM_PATTERN`], no stop words.
#[derive(Clone)]
pub struct TermAnalyzer {
	analyzer: TextAnalyzer,
}

impl Default for TermAnalyzer {
	fn default() -> Self {
		let analyzer = match RegexTokenizer::new(TERM_PATTERN) {
			Ok(tokenizer) => TextAnalyzer::builder(tokenizer).filter(LowerCaser).build(),
			Err(e) => {
				warn!(error = %e, "term pattern rejected; splitting on non-alphanumerics");
				TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
			}
		};
		Self { analyzer }
	}
}

impl TermAnalyzer {
	pub fn new() -> Self { Self::default() }

	pub fn terms(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut terms = Vec::new();
		while stream.advance() {
			let token = stream.token();
			if token.text.chars().count() >= MIN_TERM_CHARS { terms.push(token.text.clone()); }
		}
		terms
	}
}
