#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! legalqa-core
//!
//! Data model, error taxonomy, collaborator traits, chunking, corpus building,
//! storage collaborators and configuration for the legal question answering
//! pipeline.

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
