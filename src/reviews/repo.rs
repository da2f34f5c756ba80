use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::dto::ReviewInput;
use super::policy::{plan_write, ReviewPolicy, WritePlan};
use super::repo_types::{RateReview, Submitted};
use crate::error::StoreError;

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    /// Reviews of one movie, or of every movie when `movie_id` is `None`.
    async fn list(&self, movie_id: Option<Uuid>) -> Result<Vec<RateReview>, StoreError>;

    /// Creates or replaces the caller's review according to `policy`.
    ///
    /// The existence check and the write happen atomically; a refused
    /// submission leaves storage untouched.
    async fn submit(
        &self,
        owner_id: Uuid,
        input: &ReviewInput,
        policy: ReviewPolicy,
    ) -> Result<Submitted, StoreError>;
}

#[derive(Clone)]
pub struct PgReviewRepo {
    db: PgPool,
}

impl PgReviewRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const REVIEW_COLUMNS: &str = "id, movie_id, owner_id, stars, review, created_at, updated_at";

#[async_trait]
impl ReviewRepo for PgReviewRepo {
    async fn list(&self, movie_id: Option<Uuid>) -> Result<Vec<RateReview>, StoreError> {
        let rows = sqlx::query_as::<_, RateReview>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM rate_reviews
            WHERE ($1::uuid IS NULL OR movie_id = $1)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(movie_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn submit(
        &self,
        owner_id: Uuid,
        input: &ReviewInput,
        policy: ReviewPolicy,
    ) -> Result<Submitted, StoreError> {
        let mut tx = self.db.begin().await?;

        // Row lock on the movie serializes every submission for it
        let movie: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM movies WHERE id = $1 FOR UPDATE")
                .bind(input.movie)
                .fetch_optional(&mut *tx)
                .await?;
        if movie.is_none() {
            return Err(StoreError::MissingReference("movie"));
        }

        let existing: Vec<(Uuid, Uuid)> =
            sqlx::query_as("SELECT id, owner_id FROM rate_reviews WHERE movie_id = $1")
                .bind(input.movie)
                .fetch_all(&mut *tx)
                .await?;
        let own = existing
            .iter()
            .find(|(_, owner)| *owner == owner_id)
            .map(|(id, _)| *id);
        let others_exist = existing.iter().any(|(_, owner)| *owner != owner_id);

        let plan = plan_write(policy, own, others_exist)
            .map_err(|conflict| StoreError::Conflict(conflict.to_string()))?;

        let review = match plan {
            WritePlan::Insert => sqlx::query_as::<_, RateReview>(&format!(
                r#"
                INSERT INTO rate_reviews (id, movie_id, owner_id, stars, review)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {REVIEW_COLUMNS}
                "#
            ))
            .bind(Uuid::new_v4())
            .bind(input.movie)
            .bind(owner_id)
            .bind(input.stars)
            .bind(&input.review)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    warn!(movie_id = %input.movie, %owner_id, "unique constraint caught duplicate review");
                    StoreError::Conflict("you have already reviewed this movie".into())
                }
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StoreError::MissingReference("owner")
                }
                other => StoreError::Database(other),
            })?,
            WritePlan::Overwrite(id) => sqlx::query_as::<_, RateReview>(&format!(
                r#"
                UPDATE rate_reviews
                   SET stars = $2, review = $3, updated_at = now()
                 WHERE id = $1
                RETURNING {REVIEW_COLUMNS}
                "#
            ))
            .bind(id)
            .bind(input.stars)
            .bind(&input.review)
            .fetch_one(&mut *tx)
            .await?,
        };

        tx.commit().await?;
        Ok(Submitted {
            review,
            replaced: matches!(plan, WritePlan::Overwrite(_)),
        })
    }
}
