//! Test infrastructure for integration tests.
//!
//! `TestApp` wraps an `axum_test::TestServer` running the production router
//! on top of the in-memory store, plus helpers to seed users, movies and
//! reviews directly through the repositories.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use time::macros::date;
use uuid::Uuid;

use moviereview::auth::repo_types::NewUser;
use moviereview::auth::services::JwtKeys;
use moviereview::config::AppConfig;
use moviereview::movies::dto::MovieInput;
use moviereview::movies::repo_types::Movie;
use moviereview::reviews::dto::ReviewInput;
use moviereview::reviews::policy::ReviewPolicy;
use moviereview::reviews::repo_types::RateReview;
use moviereview::{build_app, AppState};

pub const MOVIES: &str = "/api/v1/movies";
pub const REVIEWS: &str = "/api/v1/ratereviews";

pub struct TestApp {
    server: TestServer,
    state: AppState,
    keys: JwtKeys,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(ReviewPolicy::Upsert)
    }

    pub fn with_policy(policy: ReviewPolicy) -> Self {
        let config = Arc::new(AppConfig::for_tests(policy));
        let keys = JwtKeys::from(&config.jwt);
        let state = AppState::in_memory(config);
        let server =
            TestServer::new(build_app(state.clone())).expect("Failed to create test server");
        Self {
            server,
            state,
            keys,
        }
    }

    pub fn server(&self) -> &TestServer {
        &self.server
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Inserts a user straight into the store and signs an access token for it.
    pub async fn create_user(&self, username: &str) -> (Uuid, String) {
        let user = self
            .state
            .users
            .create(NewUser {
                email: format!("{username}@gmail.com"),
                username: username.into(),
                password_hash: "unused".into(),
                first_name: "Bob".into(),
                last_name: "White".into(),
                phone: "+50578251453".into(),
            })
            .await
            .expect("Failed to create user");
        let token = self.keys.sign_access(user.id).expect("Failed to sign token");
        (user.id, token)
    }

    /// Access token for an arbitrary id, stored or not.
    pub fn token_for(&self, user_id: Uuid) -> String {
        self.keys.sign_access(user_id).expect("Failed to sign token")
    }

    pub fn auth_header(&self, token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid token format"),
        )
    }

    pub async fn create_movie(&self, owner: Uuid, title: &str) -> Movie {
        self.state
            .movies
            .create(
                owner,
                &MovieInput {
                    title: title.into(),
                    year: 2003,
                    rated: "R (Sci-Fi Violence|Brief Language)".into(),
                    released_on: date!(2021 - 05 - 05),
                    genre: "Action, Sci Fi".into(),
                    director: "Andy Wachowski, Larry Wachowski".into(),
                    plot: "Neo (Keanu Reeves) believes that Morpheus can answer his question".into(),
                    audience_score: 0,
                },
            )
            .await
            .expect("Failed to create movie")
    }

    pub async fn seed_review(&self, owner: Uuid, movie: Uuid, stars: i32, text: &str) -> RateReview {
        self.state
            .reviews
            .submit(
                owner,
                &ReviewInput {
                    movie,
                    stars,
                    review: text.into(),
                },
                ReviewPolicy::Upsert,
            )
            .await
            .expect("Failed to seed review")
            .review
    }

    pub async fn reviews_of(&self, movie: Uuid) -> Vec<RateReview> {
        self.state
            .reviews
            .list(Some(movie))
            .await
            .expect("Failed to list reviews")
    }
}

pub fn matrix_body(title: &str) -> Value {
    json!({
        "title": title,
        "year": 1991,
        "rated": "R (Sci-Fi Violence|Brief Language)",
        "released_on": "2021-05-05",
        "genre": "Action, Sci Fi",
        "director": "Andy Wachowski, Larry Wachowski",
        "plot": "Neo (Keanu Reeves) believes that Morpheus (Laurence Fishburne) can answer his question -- What is the Matrix?",
        "audience_score": 0
    })
}
