use crate::state::AppState;
use axum::Router;
use time::Date;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

// `released_on` travels as `YYYY-MM-DD` on the wire
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub fn router() -> Router<AppState> {
    handlers::movie_routes()
}
