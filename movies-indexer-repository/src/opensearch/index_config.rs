//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the film search index.

use serde_json::{json, Value};

/// The default name of the film search index.
pub const INDEX_NAME: &str = "movies";

/// Name of the combined Russian/English analyzer used by every text field.
pub const ANALYZER: &str = "ru_en";

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The index name (used for all operations).
    pub name: String,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(INDEX_NAME)
    }
}

/// Nested mapping of one person role: exact-match id plus analyzed name.
fn person_mapping() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text", "analyzer": ANALYZER }
        }
    })
}

/// Get the index settings and mappings for the film search index.
///
/// The configuration includes:
/// - **ru_en analyzer**: lowercase, stop words and stemmers for English and Russian
/// - **Keyword fields**: exact match on `id` and `genres`
/// - **Nested fields**: one nested object type per person role
/// - **Strict mappings**: documents with unknown fields are rejected
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "refresh_interval": "1s",
            "analysis": {
                "filter": {
                    "english_stop": { "type": "stop", "stopwords": "_english_" },
                    "english_stemmer": { "type": "stemmer", "language": "english" },
                    "english_possessive_stemmer": {
                        "type": "stemmer",
                        "language": "possessive_english"
                    },
                    "russian_stop": { "type": "stop", "stopwords": "_russian_" },
                    "russian_stemmer": { "type": "stemmer", "language": "russian" }
                },
                "analyzer": {
                    "ru_en": {
                        "tokenizer": "standard",
                        "filter": [
                            "lowercase",
                            "english_stop",
                            "english_stemmer",
                            "english_possessive_stemmer",
                            "russian_stop",
                            "russian_stemmer"
                        ]
                    }
                }
            }
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                "id": { "type": "keyword" },
                "imdb_rating": { "type": "float" },
                "genres": { "type": "keyword" },
                "title": {
                    "type": "text",
                    "analyzer": ANALYZER,
                    "fields": {
                        "raw": { "type": "keyword" }
                    }
                },
                "description": { "type": "text", "analyzer": ANALYZER },
                "directors_names": { "type": "text", "analyzer": ANALYZER },
                "actors_names": { "type": "text", "analyzer": ANALYZER },
                "writers_names": { "type": "text", "analyzer": ANALYZER },
                "directors": person_mapping(),
                "actors": person_mapping(),
                "writers": person_mapping()
            }
        }
    })
}
