use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RateReview {
    pub id: Uuid,
    #[serde(rename = "movie")]
    pub movie_id: Uuid,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub stars: i32,
    pub review: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub review: RateReview,
    /// True when an existing review was overwritten rather than created.
    pub replaced: bool,
}
