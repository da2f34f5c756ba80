use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::dto::{MovieFilter, MovieInput, MoviePatch};
use super::repo_types::Movie;
use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    extract::ValidJson,
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie)
                .put(update_movie)
                .patch(patch_movie)
                .delete(delete_movie),
        )
}

/// Ids that do not parse cannot name a stored movie.
fn movie_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("movie not found".into()))
}

#[instrument(skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Query(filter): Query<MovieFilter>,
) -> Result<Json<Vec<Movie>>> {
    let filter = filter.normalized();
    let movies = state.movies.list(&filter).await?;
    debug!(count = movies.len(), "movies listed");
    Ok(Json(movies))
}

#[instrument(skip(state, input))]
pub async fn create_movie(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidJson(input): ValidJson<MovieInput>,
) -> Result<(StatusCode, HeaderMap, Json<Movie>)> {
    let movie = state.movies.create(caller, &input).await?;
    info!(movie_id = %movie.id, owner_id = %caller, title = %movie.title, "movie created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/movies/{}", movie.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(movie)))
}

#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Movie>> {
    let movie = state.movies.get(movie_id(&id)?).await?;
    Ok(Json(movie))
}

#[instrument(skip(state, input))]
pub async fn update_movie(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<MovieInput>,
) -> Result<Json<Movie>> {
    let movie = state.movies.update(movie_id(&id)?, &input).await?;
    info!(movie_id = %movie.id, editor_id = %caller, "movie updated");
    Ok(Json(movie))
}

#[instrument(skip(state, patch))]
pub async fn patch_movie(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<MoviePatch>,
) -> Result<Json<Movie>> {
    let id = movie_id(&id)?;
    let current = state.movies.get(id).await?;

    let mut input = MovieInput::from(&current);
    patch.apply(&mut input);
    input.validate()?;

    let movie = state.movies.update(id, &input).await?;
    info!(movie_id = %movie.id, editor_id = %caller, "movie patched");
    Ok(Json(movie))
}

#[instrument(skip(state))]
pub async fn delete_movie(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = movie_id(&id)?;
    state.movies.delete(id).await?;
    info!(movie_id = %id, deleted_by = %caller, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}
