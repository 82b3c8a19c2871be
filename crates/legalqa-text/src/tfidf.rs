//! Sparse tf-idf vector space fitted over a chunk corpus.
//!
//! idf(t) = ln((1 + n) / (1 + df(t))) + 1, weights are raw term counts times
//! idf, every vector is L2-normalised so cosine similarity is a dot product.

use std::collections::{BTreeMap, HashMap};

use legalqa_core::error::{Error, Result};
use legalqa_core::types::BestMatch;

use crate::analyzer::TermAnalyzer;

pub type TermId = usize;

/// L2-normalised sparse vector, entries sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
	entries: Vec<(TermId, f32)>,
}

impl SparseVector {
	fn from_counts(counts: BTreeMap<TermId, u32>, idf: &[f32]) -> Self {
		let mut entries: Vec<(TermId, f32)> = counts.into_iter().map(|(t, tf)| (t, tf as f32 * idf[t])).collect();
		let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
		if norm > 0.0 { for (_, w) in &mut entries { *w /= norm; } }
		Self { entries }
	}

	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	/// Cosine similarity of two normalised vectors, clamped to [0, 1].
	pub fn cosine(&self, other: &SparseVector) -> f32 {
		let (mut i, mut j, mut dot) = (0usize, 0usize, 0f32);
		while i < self.entries.len() && j < other.entries.len() {
			let (a, wa) = self.entries[i];
			let (b, wb) = other.entries[j];
			match a.cmp(&b) {
				std::cmp::Ordering::Less => i += 1,
				std::cmp::Ordering::Greater => j += 1,
				std::cmp::Ordering::Equal => { dot += wa * wb; i += 1; j += 1; }
			}
		}
		dot.clamp(0.0, 1.0)
	}
}

#[derive(Clone, Default)]
pub struct TfidfVectorizer {
	analyzer: TermAnalyzer,
}

impl TfidfVectorizer {
	pub fn new(analyzer: TermAnalyzer) -> Self { Self { analyzer } }

	/// Fit vocabulary and document frequencies over `texts`.
	///
	/// Fails with [`Error::EmptyCorpus`] when `texts` is empty. An empty
	/// vocabulary is allowed; every score in that space is zero.
	pub fn fit<'a, I>(&self, texts: I) -> Result<FittedSpace>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let analyzed: Vec<Vec<String>> = texts.into_iter().map(|t| self.analyzer.terms(t)).collect();
		if analyzed.is_empty() { return Err(Error::EmptyCorpus); }

		let mut df: BTreeMap<&str, u32> = BTreeMap::new();
		for terms in &analyzed {
			let mut seen: Vec<&str> = terms.iter().map(String::as_str).collect();
			seen.sort_unstable();
			seen.dedup();
			for term in seen { *df.entry(term).or_insert(0) += 1; }
		}

		let n = analyzed.len() as f32;
		let mut vocabulary = HashMap::with_capacity(df.len());
		let mut idf = Vec::with_capacity(df.len());
		for (term_id, (term, freq)) in df.into_iter().enumerate() {
			vocabulary.insert(term.to_string(), term_id);
			idf.push(((1.0 + n) / (1.0 + freq as f32)).ln() + 1.0);
		}

		let mut space = FittedSpace { analyzer: self.analyzer.clone(), vocabulary, idf, chunk_vectors: Vec::new() };
		space.chunk_vectors = analyzed.iter().map(|terms| space.vectorize(terms)).collect();
		Ok(space)
	}
}

/// A vector space fitted over a fixed set of chunk texts.
#[derive(Clone)]
pub struct FittedSpace {
	analyzer: TermAnalyzer,
	vocabulary: HashMap<String, TermId>,
	idf: Vec<f32>,
	chunk_vectors: Vec<SparseVector>,
}

impl FittedSpace {
	pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }

	pub fn len(&self) -> usize { self.chunk_vectors.len() }

	pub fn is_empty(&self) -> bool { self.chunk_vectors.is_empty() }

	/// Project `text` into this space. Out-of-vocabulary terms are ignored.
	pub fn transform(&self, text: &str) -> SparseVector { self.vectorize(&self.analyzer.terms(text)) }

	fn vectorize(&self, terms: &[String]) -> SparseVector {
		let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
		for term in terms {
			if let Some(&id) = self.vocabulary.get(term) { *counts.entry(id).or_insert(0) += 1; }
		}
		SparseVector::from_counts(counts, &self.idf)
	}

	/// Cosine similarity of `query` against every chunk, in corpus order.
	pub fn scores(&self, query: &str) -> Vec<f32> {
		let q = self.transform(query);
		self.chunk_vectors.iter().map(|c| q.cosine(c)).collect()
	}

	/// Highest-scoring chunk; the first index wins ties.
	pub fn best_match(&self, query: &str) -> Result<BestMatch> {
		let mut best: Option<BestMatch> = None;
		for (chunk_index, score) in self.scores(query).into_iter().enumerate() {
			if best.map_or(true, |b| score > b.score) { best = Some(BestMatch { chunk_index, score }); }
		}
		best.ok_or(Error::EmptyCorpus)
	}

	/// All chunks ranked by descending score, ties in corpus order.
	pub fn rank(&self, query: &str) -> Vec<BestMatch> {
		let mut ranked: Vec<BestMatch> = self.scores(query).into_iter().enumerate().map(|(chunk_index, score)| BestMatch { chunk_index, score }).collect();
		ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		ranked
	}
}
