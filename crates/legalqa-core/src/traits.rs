use crate::error::Result;
use crate::types::{BestMatch, Corpus, Document};

/// Storage collaborator: the only way the core sees documents.
pub trait DocumentStore: Send + Sync {
    fn list_documents(&self) -> Result<Vec<Document>>;
}

/// Finds the single chunk of `corpus` most similar to `query`.
///
/// Implementations fail with [`crate::error::Error::EmptyCorpus`] when the
/// corpus has no chunks. Ties resolve to the lowest index.
pub trait Retriever: Send + Sync {
    fn retrieve_best_match(&self, query: &str, corpus: &Corpus) -> Result<BestMatch>;
}

/// Produces a short answer to `query` grounded in `context`.
pub trait AnswerSynthesizer: Send + Sync {
    fn synthesize(&self, query: &str, context: &str) -> Result<String>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn list_documents(&self) -> Result<Vec<Document>> { (**self).list_documents() }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn list_documents(&self) -> Result<Vec<Document>> { (**self).list_documents() }
}
