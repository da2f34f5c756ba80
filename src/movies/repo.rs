use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{MovieFilter, MovieInput};
use super::repo_types::Movie;
use crate::error::StoreError;

#[async_trait]
pub trait MovieRepo: Send + Sync {
    /// All movies matching `filter`, oldest first.
    async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Movie, StoreError>;
    async fn create(&self, owner_id: Uuid, input: &MovieInput) -> Result<Movie, StoreError>;
    /// Replaces every editable field; `owner_id` is untouched.
    async fn update(&self, id: Uuid, input: &MovieInput) -> Result<Movie, StoreError>;
    /// Removes the movie and, through the foreign key, its reviews.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgMovieRepo {
    db: PgPool,
}

impl PgMovieRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const MOVIE_COLUMNS: &str = "id, title, year, rated, released_on, genre, director, plot, \
                             audience_score, owner_id, created_at, updated_at";

/// Escapes `%`, `_` and `\` so user input is matched literally by `ILIKE`.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[async_trait]
impl MovieRepo for PgMovieRepo {
    async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>, StoreError> {
        let pattern = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", escape_like(s)));
        let rows = sqlx::query_as::<_, Movie>(&format!(
            r#"
            SELECT {MOVIE_COLUMNS}
            FROM movies
            WHERE ($1::text IS NULL OR title = $1)
              AND ($2::text IS NULL OR title ILIKE $2)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(filter.title.as_deref())
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Movie, StoreError> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound("movie"))
    }

    async fn create(&self, owner_id: Uuid, input: &MovieInput) -> Result<Movie, StoreError> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            r#"
            INSERT INTO movies (id, title, year, rated, released_on, genre, director, plot,
                                audience_score, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(input.year)
        .bind(&input.rated)
        .bind(input.released_on)
        .bind(&input.genre)
        .bind(&input.director)
        .bind(&input.plot)
        .bind(input.audience_score)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await;

        match movie {
            Ok(m) => Ok(m),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StoreError::MissingReference("owner"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: Uuid, input: &MovieInput) -> Result<Movie, StoreError> {
        sqlx::query_as::<_, Movie>(&format!(
            r#"
            UPDATE movies
               SET title = $2, year = $3, rated = $4, released_on = $5, genre = $6,
                   director = $7, plot = $8, audience_score = $9, updated_at = now()
             WHERE id = $1
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(input.year)
        .bind(&input.rated)
        .bind(input.released_on)
        .bind(&input.genre)
        .bind(&input.director)
        .bind(&input.plot)
        .bind(input.audience_score)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound("movie"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound("movie"));
        }
        Ok(())
    }
}
