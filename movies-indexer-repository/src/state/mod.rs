//! State storage implementations.
//!
//! Watermarks are persisted as a single JSON document on the local file
//! system. Other backends only need to implement `StateStorage`.

mod json_file;

pub use json_file::JsonFileStorage;
