//! Document transformer implementation.
//!
//! Groups flat joined rows into one `FilmDocument` per film.

use std::collections::BTreeMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use movies_indexer_shared::{FilmDocument, JoinedRow, PersonRef, PersonRole};

/// Per-film state collected while scanning rows.
///
/// Scalars come from the first row seen for the film. People and genres are
/// keyed by id, which deduplicates them and fixes their output order.
struct FilmAccumulator {
    title: String,
    description: Option<String>,
    rating: Option<f64>,
    people: BTreeMap<PersonRole, BTreeMap<Uuid, String>>,
    genres: BTreeMap<Uuid, String>,
}

impl FilmAccumulator {
    fn from_row(row: &JoinedRow) -> Self {
        Self {
            title: row.title.clone(),
            description: row.description.clone(),
            rating: row.rating,
            people: BTreeMap::new(),
            genres: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, row: JoinedRow) {
        if let (Some(genre_id), Some(genre_name)) = (row.genre_id, row.genre_name) {
            self.genres.entry(genre_id).or_insert(genre_name);
        }

        let (Some(role), Some(person_id), Some(person_name)) =
            (row.role, row.person_id, row.person_name)
        else {
            return;
        };

        match role.parse::<PersonRole>() {
            Ok(role) => {
                self.people
                    .entry(role)
                    .or_default()
                    .entry(person_id)
                    .or_insert(person_name);
            }
            Err(e) => {
                debug!(film_id = %row.film_id, person_id = %person_id, error = %e, "Skipping person");
            }
        }
    }

    fn finish(mut self, id: Uuid) -> FilmDocument {
        let mut document = FilmDocument::new(id, self.title, self.description, self.rating);
        document.genres = self.genres.into_values().collect();

        for role in PersonRole::ALL {
            let people = self
                .people
                .remove(&role)
                .unwrap_or_default()
                .into_iter()
                .map(|(id, name)| PersonRef::new(id, name))
                .collect();
            document.set_people(role, people);
        }

        document
    }
}

/// Transformer that turns joined rows into search documents.
///
/// The transformer is responsible for:
/// - Grouping rows of the same film regardless of their order
/// - Deduplicating genres and people by id
/// - Producing empty lists, never missing fields, for absent relations
pub struct DocumentTransformer {}

impl DocumentTransformer {
    /// Create a new document transformer.
    pub fn new() -> Self {
        Self {}
    }

    /// Transform joined rows into one document per film, ordered by film id.
    ///
    /// # Arguments
    ///
    /// * `rows` - Joined rows for any number of films, in any order
    ///
    /// # Returns
    ///
    /// One document per distinct film id in `rows`.
    #[instrument(skip(self, rows))]
    pub fn transform<I>(&self, rows: I) -> Vec<FilmDocument>
    where
        I: IntoIterator<Item = JoinedRow>,
    {
        let mut films: BTreeMap<Uuid, FilmAccumulator> = BTreeMap::new();
        let mut row_count = 0usize;

        for row in rows {
            row_count += 1;
            films
                .entry(row.film_id)
                .or_insert_with(|| FilmAccumulator::from_row(&row))
                .absorb(row);
        }

        let documents: Vec<FilmDocument> = films
            .into_iter()
            .map(|(id, film)| film.finish(id))
            .collect();

        debug!(row_count, document_count = documents.len(), "Transformed rows");
        documents
    }
}

impl Default for DocumentTransformer {
    fn default() -> Self {
        Self::new()
    }
}
