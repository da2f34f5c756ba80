use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument, warn};

use super::dto::{ReviewFilter, ReviewInput, ReviewScope};
use super::repo_types::RateReview;
use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    extract::ValidJson,
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new().route("/ratereviews", get(list_reviews).put(submit_review))
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<RateReview>>> {
    let reviews = match filter.scope() {
        ReviewScope::All => state.reviews.list(None).await?,
        ReviewScope::Movie(id) => state.reviews.list(Some(id)).await?,
        ReviewScope::Nothing => {
            debug!(idmovie = ?filter.idmovie, "unparseable movie filter");
            Vec::new()
        }
    };
    Ok(Json(reviews))
}

/// Always answers 200, whether the review was created or replaced.
#[instrument(skip(state, input))]
pub async fn submit_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidJson(input): ValidJson<ReviewInput>,
) -> Result<Json<RateReview>> {
    let policy = state.config.review_policy;
    let submitted = state
        .reviews
        .submit(caller, &input, policy)
        .await
        .map_err(|e| {
            warn!(error = %e, reviewer_id = %caller, %policy, "review refused");
            AppError::from(e)
        })?;

    info!(
        review_id = %submitted.review.id,
        movie_id = %submitted.review.movie_id,
        reviewer_id = %caller,
        replaced = submitted.replaced,
        "review saved"
    );
    Ok(Json(submitted.review))
}
