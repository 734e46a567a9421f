//! Interface definitions for the indexer's I/O seams.
//!
//! The traits here allow dependency injection and swappable backends: the
//! pipeline only ever talks to these abstractions, tests plug in mocks.

mod search_index_provider;
mod source_reader;
mod state_storage;

pub use search_index_provider::SearchIndexProvider;
pub use source_reader::SourceReader;
pub use state_storage::StateStorage;
