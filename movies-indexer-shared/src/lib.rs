//! # Movies Indexer Shared
//!
//! This crate defines the data structures shared across the movies indexer:
//! the closed set of synchronized entity types, the rows read from the
//! relational store, the film documents written to the search index and the
//! per-entity watermarks.

pub mod types;

pub use types::entity::{EntityType, PersonRole};
pub use types::film_document::{FilmDocument, PersonRef};
pub use types::source_row::{ChangedRow, JoinedRow};
pub use types::watermarks::Watermarks;
