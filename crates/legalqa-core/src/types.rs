//! Domain types shared by the chunker, retriever, synthesizer and orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type DocumentId = i64;

/// A stored document as handed out by a [`crate::traits::DocumentStore`].
///
/// Documents are immutable once stored; the core only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(id: DocumentId, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id, name: name.into(), content: content.into() }
    }
}

/// A contiguous word group cut from one document.
///
/// - `text`: the group's tokens joined with single spaces
/// - `source_document_name`: name of the document it was cut from
/// - `sequence_index`: position of the chunk within that document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_document_name: String,
    pub sequence_index: usize,
}

/// Ordered chunks paired 1:1 with the names of their source documents.
///
/// Fields are private so `chunks.len() == source_names.len()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Vec<Chunk>,
    source_names: Vec<String>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, chunk: Chunk) {
        self.source_names.push(chunk.source_document_name.clone());
        self.chunks.push(chunk);
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn source_names(&self) -> &[String] { &self.source_names }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ { self.chunks.iter().map(|c| c.text.as_str()) }

    pub fn get(&self, index: usize) -> Option<(&Chunk, &str)> {
        let chunk = self.chunks.get(index)?;
        let name = self.source_names.get(index)?;
        Some((chunk, name.as_str()))
    }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

/// The single best chunk for a query. `score` is a cosine similarity in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub chunk_index: usize,
    pub score: f32,
}

/// A synthesized answer and where it came from. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub matched_document_name: String,
    pub score: f32,
    pub answer_text: String,
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Answer from file '{}':\n\n{}", self.matched_document_name, self.answer_text)
    }
}
