use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No chunks to fit a vector space over.
    #[error("Corpus is empty: no documents or chunks available")]
    EmptyCorpus,

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Document storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
