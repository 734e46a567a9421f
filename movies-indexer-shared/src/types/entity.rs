//! Entity types synchronized into the search index.
//!
//! The set is closed: films are the root documents, persons and genres are
//! dependent entities whose edits re-index every film referencing them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An entity type tracked by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Root entity, one search document per film.
    Film,
    /// Person referenced by films through a role.
    Person,
    /// Genre referenced by films.
    Genre,
}

impl EntityType {
    /// All entity types in the order they are synchronized within a pass.
    pub const ALL: [EntityType; 3] = [EntityType::Film, EntityType::Person, EntityType::Genre];

    /// Key under which the watermark for this type is persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Film => "film",
            EntityType::Person => "person",
            EntityType::Genre => "genre",
        }
    }

    /// Fully qualified table holding rows of this type.
    pub fn table(&self) -> &'static str {
        match self {
            EntityType::Film => "content.film_work",
            EntityType::Person => "content.person",
            EntityType::Genre => "content.genre",
        }
    }

    /// Whether this type is the root document type.
    pub fn is_root(&self) -> bool {
        matches!(self, EntityType::Film)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "film" => Ok(EntityType::Film),
            "person" => Ok(EntityType::Person),
            "genre" => Ok(EntityType::Genre),
            other => Err(format!("unknown entity type '{}'", other)),
        }
    }
}

/// Role a person plays in a film, as stored in `person_film_work.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Director,
    Actor,
    Writer,
}

impl PersonRole {
    pub const ALL: [PersonRole; 3] = [PersonRole::Director, PersonRole::Actor, PersonRole::Writer];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Director => "director",
            PersonRole::Actor => "actor",
            PersonRole::Writer => "writer",
        }
    }
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "director" => Ok(PersonRole::Director),
            "actor" => Ok(PersonRole::Actor),
            "writer" => Ok(PersonRole::Writer),
            other => Err(format!("unknown person role '{}'", other)),
        }
    }
}
