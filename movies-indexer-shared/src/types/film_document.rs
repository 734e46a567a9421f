//! Film document types for the search index.
//!
//! This module defines the denormalized document structure indexed in the
//! search engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::PersonRole;

/// A person embedded in a film document under one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub name: String,
}

impl PersonRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Document representation of a film in the search index.
///
/// Every list is always serialized, empty when the film has no such
/// relation. For each role the `*_names` list holds the same people as the
/// nested list, in the same order.
///
/// # Fields
///
/// - `id`: Film identifier, also used as the index document id
/// - `imdb_rating`: Optional rating
/// - `genres`: Genre names, deduplicated by genre id
/// - `title`: Film title (primary search field)
/// - `description`: Optional description text
/// - `directors`/`actors`/`writers`: Nested `{id, name}` entries per role
/// - `directors_names`/`actors_names`/`writers_names`: Flattened names per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDocument {
    pub id: Uuid,
    pub imdb_rating: Option<f64>,
    pub genres: Vec<String>,
    pub title: String,
    pub description: Option<String>,
    pub directors_names: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
}

impl FilmDocument {
    /// Create a document with no genres and no people.
    ///
    /// # Example
    ///
    /// ```
    /// use movies_indexer_shared::FilmDocument;
    /// use uuid::Uuid;
    ///
    /// let doc = FilmDocument::new(Uuid::new_v4(), "Star Wars", None, Some(8.6));
    /// assert!(doc.actors.is_empty());
    /// ```
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        imdb_rating: Option<f64>,
    ) -> Self {
        Self {
            id,
            imdb_rating,
            genres: Vec::new(),
            title: title.into(),
            description,
            directors_names: Vec::new(),
            actors_names: Vec::new(),
            writers_names: Vec::new(),
            directors: Vec::new(),
            actors: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Replace the people for `role`, deriving the flattened name list.
    pub fn set_people(&mut self, role: PersonRole, people: Vec<PersonRef>) {
        let names = people.iter().map(|p| p.name.clone()).collect();
        match role {
            PersonRole::Director => {
                self.directors = people;
                self.directors_names = names;
            }
            PersonRole::Actor => {
                self.actors = people;
                self.actors_names = names;
            }
            PersonRole::Writer => {
                self.writers = people;
                self.writers_names = names;
            }
        }
    }

    /// People listed under `role`.
    pub fn people(&self, role: PersonRole) -> &[PersonRef] {
        match role {
            PersonRole::Director => &self.directors,
            PersonRole::Actor => &self.actors,
            PersonRole::Writer => &self.writers,
        }
    }

    /// The document ID used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialization_keeps_empty_lists() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let doc = FilmDocument::new(id, "A", None, Some(7.5));

        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "imdb_rating": 7.5,
                "genres": [],
                "title": "A",
                "description": null,
                "directors_names": [],
                "actors_names": [],
                "writers_names": [],
                "directors": [],
                "actors": [],
                "writers": []
            })
        );
    }

    #[test]
    fn test_set_people_derives_names() {
        let mut doc = FilmDocument::new(Uuid::new_v4(), "A", None, None);
        let first = PersonRef::new(Uuid::new_v4(), "Ann");
        let second = PersonRef::new(Uuid::new_v4(), "Bob");

        doc.set_people(PersonRole::Writer, vec![first.clone(), second.clone()]);

        assert_eq!(doc.people(PersonRole::Writer), &[first, second]);
        assert_eq!(doc.writers_names, vec!["Ann".to_string(), "Bob".to_string()]);
        assert!(doc.actors.is_empty());
        assert!(doc.directors_names.is_empty());
    }

    #[test]
    fn test_document_id() {
        let id = Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
        let doc = FilmDocument::new(id, "A", None, None);
        assert_eq!(doc.document_id(), "6ba7b810-9dad-11d1-80b4-00c04fd430c8");
    }
}
