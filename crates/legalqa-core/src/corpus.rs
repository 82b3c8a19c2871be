use tracing::debug;

use crate::chunker::Chunker;
use crate::error::Result;
use crate::traits::DocumentStore;
use crate::types::{Chunk, Corpus, Document};

/// Flattens stored documents into a [`Corpus`], preserving document order and
/// chunk order within each document.
#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    chunker: Chunker,
}

impl CorpusBuilder {
    pub fn new(chunker: Chunker) -> Self { Self { chunker } }

    pub fn build_corpus(&self, documents: &[Document]) -> Corpus {
        let mut corpus = Corpus::new();
        for doc in documents {
            let pieces = self.chunker.chunk(&doc.content);
            debug!(document = %doc.name, chunks = pieces.len(), "chunked document");
            for (sequence_index, text) in pieces.into_iter().enumerate() {
                corpus.push(Chunk { text, source_document_name: doc.name.clone(), sequence_index });
            }
        }
        corpus
    }

    /// Pull every document from `store` and chunk it. Storage failures propagate.
    pub fn build_from_store<S: DocumentStore + ?Sized>(&self, store: &S) -> Result<Corpus> {
        let documents = store.list_documents()?;
        let corpus = self.build_corpus(&documents);
        debug!(documents = documents.len(), chunks = corpus.len(), "built corpus");
        Ok(corpus)
    }
}

/// Chunk `documents` with the default group size.
pub fn build_corpus(documents: &[Document]) -> Corpus { CorpusBuilder::default().build_corpus(documents) }
