//! SQL used by the PostgreSQL source reader.

use movies_indexer_shared::EntityType;

/// First page of changed rows: `$1` = since, `$2` = limit.
pub fn changed_first_page(entity: EntityType) -> String {
    format!(
        "SELECT id, modified FROM {} WHERE modified > $1 ORDER BY modified, id LIMIT $2",
        entity.table()
    )
}

/// Continuation page after a `(modified, id)` cursor: `$1` = modified, `$2` = id, `$3` = limit.
pub fn changed_next_page(entity: EntityType) -> String {
    format!(
        "SELECT id, modified FROM {} WHERE (modified, id) > ($1, $2) ORDER BY modified, id LIMIT $3",
        entity.table()
    )
}

const FILMS_BY_PERSONS: &str = r#"
SELECT fw.id, MAX(fw.modified) AS modified
FROM content.film_work fw
JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
WHERE pfw.person_id = ANY($1)
GROUP BY fw.id
ORDER BY 2, 1
"#;

const FILMS_BY_GENRES: &str = r#"
SELECT fw.id, MAX(fw.modified) AS modified
FROM content.film_work fw
JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
WHERE gfw.genre_id = ANY($1)
GROUP BY fw.id
ORDER BY 2, 1
"#;

/// Films referencing the given dependent ids (`$1` = uuid[]), one row per film.
///
/// `None` for the root type, which has nothing to resolve.
pub fn films_related_to(entity: EntityType) -> Option<&'static str> {
    match entity {
        EntityType::Film => None,
        EntityType::Person => Some(FILMS_BY_PERSONS),
        EntityType::Genre => Some(FILMS_BY_GENRES),
    }
}

/// Full detail join for a set of films (`$1` = uuid[]).
pub const FILM_DETAILS: &str = r#"
SELECT
    fw.id AS film_id,
    fw.title,
    fw.description,
    fw.rating::float8 AS rating,
    pfw.role,
    p.id AS person_id,
    p.full_name AS person_name,
    g.id AS genre_id,
    g.name AS genre_name
FROM content.film_work fw
LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
LEFT JOIN content.person p ON p.id = pfw.person_id
LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
LEFT JOIN content.genre g ON g.id = gfw.genre_id
WHERE fw.id = ANY($1)
"#;
