use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::extract::not_blank;

/// Body of `PUT /ratereviews`. The reviewer is always the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewInput {
    pub movie: Uuid,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub stars: i32,
    /// Older clients send the misspelt `rewiew`.
    #[serde(alias = "rewiew")]
    #[validate(length(max = 2000), custom(function = "not_blank"))]
    pub review: String,
}

/// Query parameters accepted by `GET /ratereviews`.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewFilter {
    pub idmovie: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewScope {
    All,
    Movie(Uuid),
    /// The filter cannot match anything, e.g. a malformed movie id.
    Nothing,
}

impl ReviewFilter {
    pub fn scope(&self) -> ReviewScope {
        match self.idmovie.as_deref().map(str::trim) {
            None | Some("") => ReviewScope::All,
            Some(raw) => Uuid::parse_str(raw).map_or(ReviewScope::Nothing, ReviewScope::Movie),
        }
    }
}
