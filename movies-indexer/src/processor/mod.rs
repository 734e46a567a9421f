//! Processor module for the movies indexer.
//!
//! Transforms joined source rows into film documents.

mod document_transformer;

pub use document_transformer::DocumentTransformer;
