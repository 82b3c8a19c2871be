//! legalqa-pipeline
//!
//! The public entry point: build the corpus from storage, retrieve the best
//! chunk, and synthesize an answer or fall back to a fixed message.

use std::fmt;

use tracing::{debug, info};

use legalqa_core::chunker::Chunker;
use legalqa_core::config::{Settings, DEFAULT_RELEVANCE_THRESHOLD};
use legalqa_core::corpus::CorpusBuilder;
use legalqa_core::error::{Error, Result};
use legalqa_core::traits::{AnswerSynthesizer, DocumentStore, Retriever};
use legalqa_core::types::QueryResult;
use legalqa_text::{CachedTfidfRetriever, TfidfRetriever};

pub const FALLBACK_MESSAGE: &str = "Sorry, no relevant answer was found in the documents.";

/// Why no answer was produced. Both reasons render as [`FALLBACK_MESSAGE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackReason {
    EmptyCorpus,
    LowRelevance { score: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Answered(QueryResult),
    NoRelevantAnswer(FallbackReason),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Answered(result) => write!(f, "{}", result),
            QueryOutcome::NoRelevantAnswer(_) => f.write_str(FALLBACK_MESSAGE),
        }
    }
}

pub struct QueryOrchestrator<ST> where ST: DocumentStore {
    store: ST,
    corpus_builder: CorpusBuilder,
    retriever: Box<dyn Retriever>,
    synthesizer: Box<dyn AnswerSynthesizer>,
    relevance_threshold: f32,
}

impl<ST> QueryOrchestrator<ST> where ST: DocumentStore {
    /// Default chunk size, threshold 0.1 and a refit-per-query retriever.
    pub fn new(store: ST, synthesizer: Box<dyn AnswerSynthesizer>) -> Self {
        Self {
            store,
            corpus_builder: CorpusBuilder::default(),
            retriever: Box::new(TfidfRetriever::default()),
            synthesizer,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }

    pub fn from_settings(store: ST, settings: &Settings, synthesizer: Box<dyn AnswerSynthesizer>) -> Self {
        let retriever: Box<dyn Retriever> = if settings.retrieval.cache_index {
            Box::new(CachedTfidfRetriever::default())
        } else {
            Box::new(TfidfRetriever::default())
        };
        Self::new(store, synthesizer)
            .with_chunker(Chunker::with_group_size(settings.retrieval.chunk_size))
            .with_retriever(retriever)
            .with_relevance_threshold(settings.retrieval.relevance_threshold)
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self { self.corpus_builder = CorpusBuilder::new(chunker); self }

    pub fn with_retriever(mut self, retriever: Box<dyn Retriever>) -> Self { self.retriever = retriever; self }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self { self.relevance_threshold = threshold; self }

    pub fn store(&self) -> &ST { &self.store }

    pub fn corpus_builder(&self) -> &CorpusBuilder { &self.corpus_builder }

    pub fn query(&self, query: &str) -> Result<QueryOutcome> {
        let corpus = self.corpus_builder.build_from_store(&self.store)?;
        if corpus.is_empty() {
            info!("no documents to search; returning fallback");
            return Ok(QueryOutcome::NoRelevantAnswer(FallbackReason::EmptyCorpus));
        }

        let best = match self.retriever.retrieve_best_match(query, &corpus) {
            Ok(best) => best,
            Err(Error::EmptyCorpus) => return Ok(QueryOutcome::NoRelevantAnswer(FallbackReason::EmptyCorpus)),
            Err(e) => return Err(e),
        };
        // strictly greater than the threshold counts as relevant
        if best.score <= self.relevance_threshold {
            info!(score = best.score, threshold = self.relevance_threshold, "best match below relevance threshold");
            return Ok(QueryOutcome::NoRelevantAnswer(FallbackReason::LowRelevance { score: best.score }));
        }

        let (chunk, source_name) = corpus
            .get(best.chunk_index)
            .ok_or_else(|| Error::NotFound(format!("chunk {} of {}", best.chunk_index, corpus.len())))?;
        debug!(source = source_name, chunk = chunk.sequence_index, score = best.score, "synthesizing answer");
        let answer_text = self.synthesizer.synthesize(query, &chunk.text)?;
        info!(source = source_name, score = best.score, answer_chars = answer_text.len(), "answered query");
        Ok(QueryOutcome::Answered(QueryResult { matched_document_name: source_name.to_string(), score: best.score, answer_text }))
    }

    /// Always a readable string for the no-match cases; storage and model
    /// failures are returned as errors.
    pub fn answer_query(&self, query: &str) -> Result<String> { Ok(self.query(query)?.to_string()) }
}
