use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use tracing::debug;
use twox_hash::XxHash64;

use legalqa_core::error::{Error, Result};
use legalqa_core::traits::Retriever;
use legalqa_core::types::{BestMatch, Corpus};

use crate::tfidf::{FittedSpace, TfidfVectorizer};

/// Refits the vector space over the whole corpus on every call.
#[derive(Clone, Default)]
pub struct TfidfRetriever {
	vectorizer: TfidfVectorizer,
}

impl TfidfRetriever {
	pub fn new(vectorizer: TfidfVectorizer) -> Self { Self { vectorizer } }

	pub fn fit(&self, corpus: &Corpus) -> Result<FittedSpace> {
		if corpus.is_empty() { return Err(Error::EmptyCorpus); }
		self.vectorizer.fit(corpus.texts())
	}
}

impl Retriever for TfidfRetriever {
	fn retrieve_best_match(&self, query: &str, corpus: &Corpus) -> Result<BestMatch> {
		let space = self.fit(corpus)?;
		let best = space.best_match(query)?;
		debug!(chunks = space.len(), vocabulary = space.vocabulary_len(), index = best.chunk_index, score = best.score, "retrieved best match");
		Ok(best)
	}
}

/// Reuses the last fitted space while the corpus fingerprint is unchanged.
///
/// A changed corpus triggers a full refit, so results always equal
/// [`TfidfRetriever`]'s.
#[derive(Default)]
pub struct CachedTfidfRetriever {
	inner: TfidfRetriever,
	cached: Mutex<Option<(u64, Arc<FittedSpace>)>>,
}

impl CachedTfidfRetriever {
	pub fn new(inner: TfidfRetriever) -> Self { Self { inner, cached: Mutex::new(None) } }

	fn space_for(&self, corpus: &Corpus) -> Result<Arc<FittedSpace>> {
		let fingerprint = corpus_fingerprint(corpus);
		// A poisoned cache only ever holds a complete fit or nothing.
		let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
		if let Some((fp, space)) = cached.as_ref() {
			if *fp == fingerprint {
				debug!(fingerprint, "reusing fitted space");
				return Ok(Arc::clone(space));
			}
		}
		let space = Arc::new(self.inner.fit(corpus)?);
		*cached = Some((fingerprint, Arc::clone(&space)));
		Ok(space)
	}
}

impl Retriever for CachedTfidfRetriever {
	fn retrieve_best_match(&self, query: &str, corpus: &Corpus) -> Result<BestMatch> {
		if corpus.is_empty() { return Err(Error::EmptyCorpus); }
		self.space_for(corpus)?.best_match(query)
	}
}

/// Order-sensitive hash of every chunk text.
pub fn corpus_fingerprint(corpus: &Corpus) -> u64 {
	let mut hasher = XxHash64::with_seed(0);
	corpus.len().hash(&mut hasher);
	for text in corpus.texts() { text.hash(&mut hasher); }
	hasher.finish()
}
