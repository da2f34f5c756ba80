use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub year: i32,
    pub rated: String,
    #[serde(with = "super::iso_date")]
    pub released_on: Date,
    pub genre: String,
    pub director: String,
    pub plot: String,
    pub audience_score: i32,
    /// Set from the creating caller, never from a request body.
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
