use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod policy;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::review_routes()
}
