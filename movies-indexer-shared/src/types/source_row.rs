//! Rows read from the relational store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier and modification time of a changed (or resolved) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRow {
    pub id: Uuid,
    pub modified: DateTime<Utc>,
}

impl ChangedRow {
    pub fn new(id: Uuid, modified: DateTime<Utc>) -> Self {
        Self { id, modified }
    }
}

/// One flat row of the film detail join.
///
/// The join yields one row per (film × person-in-role × genre). Relation
/// columns are `None` where the film has no such relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub film_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub role: Option<String>,
    pub person_id: Option<Uuid>,
    pub person_name: Option<String>,
    pub genre_id: Option<Uuid>,
    pub genre_name: Option<String>,
}

impl JoinedRow {
    /// A row carrying only the film's scalar fields, with no relations.
    pub fn film(
        film_id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        rating: Option<f64>,
    ) -> Self {
        Self {
            film_id,
            title: title.into(),
            description,
            rating,
            role: None,
            person_id: None,
            person_name: None,
            genre_id: None,
            genre_name: None,
        }
    }

    /// Attach a person in the given role.
    pub fn with_person(mut self, role: &str, person_id: Uuid, name: impl Into<String>) -> Self {
        self.role = Some(role.to_string());
        self.person_id = Some(person_id);
        self.person_name = Some(name.into());
        self
    }

    /// Attach a genre.
    pub fn with_genre(mut self, genre_id: Uuid, name: impl Into<String>) -> Self {
        self.genre_id = Some(genre_id);
        self.genre_name = Some(name.into());
        self
    }
}
