//! legalqa-text
//!
//! Term analysis (Tantivy tokenizers), tf-idf vector space and cosine
//! best-match retrieval over a chunk corpus.

pub mod analyzer;
pub mod tfidf;
pub mod retriever;

pub use analyzer::TermAnalyzer;
pub use retriever::{corpus_fingerprint, CachedTfidfRetriever, TfidfRetriever};
pub use tfidf::{FittedSpace, SparseVector, TfidfVectorizer};
