//! REST backend for movies and their star-rating reviews.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod memory;
pub mod movies;
pub mod reviews;
pub mod state;

pub use app::build_app;
pub use state::AppState;
