//! Core data structures used across the movies indexer.
//!
//! Re-exports the entity, row, document and watermark types.

pub mod entity;
pub mod film_document;
pub mod source_row;
pub mod watermarks;

pub use entity::{EntityType, PersonRole};
pub use film_document::{FilmDocument, PersonRef};
pub use source_row::{ChangedRow, JoinedRow};
pub use watermarks::Watermarks;
