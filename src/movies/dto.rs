use serde::Deserialize;
use time::Date;
use validator::Validate;

use super::repo_types::Movie;
use crate::extract::not_blank;

/// Editable movie fields, used by create and full update.
///
/// Anything else in the body (`id`, `owner`, timestamps) is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct MovieInput {
    #[validate(length(max = 255), custom(function = "not_blank"))]
    pub title: String,
    #[validate(range(min = 1878, max = 2200, message = "out of range"))]
    pub year: i32,
    #[validate(length(max = 255), custom(function = "not_blank"))]
    pub rated: String,
    #[serde(with = "super::iso_date")]
    pub released_on: Date,
    #[validate(length(max = 255), custom(function = "not_blank"))]
    pub genre: String,
    #[validate(length(max = 255), custom(function = "not_blank"))]
    pub director: String,
    #[validate(length(max = 5000), custom(function = "not_blank"))]
    pub plot: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub audience_score: i32,
}

impl From<&Movie> for MovieInput {
    fn from(m: &Movie) -> Self {
        Self {
            title: m.title.clone(),
            year: m.year,
            rated: m.rated.clone(),
            released_on: m.released_on,
            genre: m.genre.clone(),
            director: m.director.clone(),
            plot: m.plot.clone(),
            audience_score: m.audience_score,
        }
    }
}

/// Partial update body; absent fields keep their stored value.
///
/// Field rules run after merging, against the full `MovieInput`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub rated: Option<String>,
    #[serde(default, with = "super::iso_date::option")]
    pub released_on: Option<Date>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub plot: Option<String>,
    pub audience_score: Option<i32>,
}

impl MoviePatch {
    pub fn apply(self, target: &mut MovieInput) {
        if let Some(v) = self.title {
            target.title = v;
        }
        if let Some(v) = self.year {
            target.year = v;
        }
        if let Some(v) = self.rated {
            target.rated = v;
        }
        if let Some(v) = self.released_on {
            target.released_on = v;
        }
        if let Some(v) = self.genre {
            target.genre = v;
        }
        if let Some(v) = self.director {
            target.director = v;
        }
        if let Some(v) = self.plot {
            target.plot = v;
        }
        if let Some(v) = self.audience_score {
            target.audience_score = v;
        }
    }
}

/// Query parameters accepted by `GET /movies`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MovieFilter {
    /// Exact, case-sensitive title match.
    pub title: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

impl MovieFilter {
    /// Empty parameters (`?title=`) mean "no filter".
    pub fn normalized(self) -> Self {
        fn non_empty(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }
        Self {
            title: non_empty(self.title),
            search: non_empty(self.search),
        }
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        let title_ok = self.title.as_deref().map_or(true, |t| movie.title == t);
        let search_ok = self.search.as_deref().map_or(true, |s| {
            movie.title.to_lowercase().contains(&s.to_lowercase())
        });
        title_ok && search_ok
    }
}
