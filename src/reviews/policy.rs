//! Uniqueness rules for review submissions.
//!
//! Three readings of "one review per movie" are supported and chosen at
//! startup through `REVIEW_POLICY`:
//!
//! * `upsert`: one review per (movie, reviewer); resubmitting replaces it.
//! * `reject_duplicate`: one review per (movie, reviewer); resubmitting fails.
//! * `single_per_movie`: one review per movie; only its author may replace it.
//!
//! Both stores call [`plan_write`] while holding their per-movie lock, so the
//! decision and the write are atomic.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    #[default]
    Upsert,
    RejectDuplicate,
    SinglePerMovie,
}

impl ReviewPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewPolicy::Upsert => "upsert",
            ReviewPolicy::RejectDuplicate => "reject_duplicate",
            ReviewPolicy::SinglePerMovie => "single_per_movie",
        }
    }
}

impl fmt::Display for ReviewPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown review policy {0:?} (expected upsert, reject_duplicate or single_per_movie)")]
pub struct UnknownPolicy(String);

impl FromStr for ReviewPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upsert" => Ok(ReviewPolicy::Upsert),
            "reject_duplicate" => Ok(ReviewPolicy::RejectDuplicate),
            "single_per_movie" => Ok(ReviewPolicy::SinglePerMovie),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// What the store should do with a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    Insert,
    /// Replace stars and text of the review with this id.
    Overwrite(Uuid),
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReviewConflict {
    #[error("you have already reviewed this movie")]
    AlreadyReviewed,
    #[error("this movie already has a review from another user")]
    MovieAlreadyReviewed,
}

/// Decides a submission from what is currently stored for the movie.
///
/// `own` is the caller's existing review on the movie, `others_exist` is
/// whether anyone else has reviewed it.
pub fn plan_write(
    policy: ReviewPolicy,
    own: Option<Uuid>,
    others_exist: bool,
) -> Result<WritePlan, ReviewConflict> {
    match policy {
        ReviewPolicy::Upsert => Ok(own.map_or(WritePlan::Insert, WritePlan::Overwrite)),
        ReviewPolicy::RejectDuplicate => match own {
            Some(_) => Err(ReviewConflict::AlreadyReviewed),
            None => Ok(WritePlan::Insert),
        },
        ReviewPolicy::SinglePerMovie => {
            if others_exist {
                return Err(ReviewConflict::MovieAlreadyReviewed);
            }
            Ok(own.map_or(WritePlan::Insert, WritePlan::Overwrite))
        }
    }
}
