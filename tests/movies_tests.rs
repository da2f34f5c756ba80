//! Integration tests for movie endpoints.

mod common;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use common::{matrix_body, TestApp, MOVIES};
use serde_json::{json, Value};
use uuid::Uuid;

// =============================================================================
// Listing & filtering
// =============================================================================

#[tokio::test]
async fn test_movie_list_authenticated() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    app.create_movie(user_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);

    let response = app.server().get(MOVIES).add_header(name, value).await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["title"], "THE MATRIX 2");
    assert_eq!(body[0]["released_on"], "2021-05-05");
}

#[tokio::test]
async fn test_movie_list_unauthenticated() {
    let app = TestApp::new();
    let (user_id, _token) = app.create_user("bobwhite").await;
    app.create_movie(user_id, "THE MATRIX 2").await;

    let response = app.server().get(MOVIES).await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized");
    assert!(body.get("title").is_none());
}

#[tokio::test]
async fn test_movie_list_rejects_invalid_token() {
    let app = TestApp::new();

    let response = app
        .server()
        .get(MOVIES)
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer forged.token.value"))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_movie_list_accepts_token_scheme() {
    let app = TestApp::new();
    let (_user_id, token) = app.create_user("bobwhite").await;

    let response = app
        .server()
        .get(MOVIES)
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {token}")).unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_movie_filter_by_existing_title() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    app.create_movie(user_id, "THE MATRIX 2").await;
    app.create_movie(user_id, "HEAT").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .get(MOVIES)
        .add_query_param("title", "THE MATRIX 2")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["title"], "THE MATRIX 2");
}

#[tokio::test]
async fn test_movie_filter_by_missing_title_is_empty() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    app.create_movie(user_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .get(MOVIES)
        .add_query_param("title", "la macarena")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_movie_search_is_case_insensitive_substring() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    app.create_movie(user_id, "THE MATRIX 2").await;
    app.create_movie(user_id, "The Matrix").await;
    app.create_movie(user_id, "HEAT").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .get(MOVIES)
        .add_query_param("search", "matrix")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 2);
}

// =============================================================================
// Create / retrieve / update / delete
// =============================================================================

#[tokio::test]
async fn test_movie_create_sets_owner_to_caller() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    let (other_id, _) = app.create_user("bobwhite2").await;
    let (name, value) = app.auth_header(&token);

    let mut body = matrix_body("THE MATRIX");
    body["owner"] = json!(other_id);

    let response = app
        .server()
        .post(MOVIES)
        .add_header(name, value)
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["owner"], json!(user_id));
    assert_eq!(created["audience_score"], 0);

    let id: Uuid = serde_json::from_value(created["id"].clone()).unwrap();
    let stored = app.state().movies.get(id).await.unwrap();
    assert_eq!(stored.owner_id, user_id);
}

#[tokio::test]
async fn test_movie_create_unauthenticated() {
    let app = TestApp::new();

    let response = app.server().post(MOVIES).json(&matrix_body("THE MATRIX")).await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_movie_create_rejects_invalid_fields() {
    let app = TestApp::new();
    let (_user_id, token) = app.create_user("bobwhite").await;
    let (name, value) = app.auth_header(&token);

    let mut body = matrix_body("");
    body["audience_score"] = json!(-1);

    let response = app
        .server()
        .post(MOVIES)
        .add_header(name, value)
        .json(&body)
        .await;

    response.assert_status_bad_request();
    let err: Value = response.json();
    assert_eq!(err["error"], "validation_error");
    let fields: Vec<&str> = err["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "audience_score"]);
}

#[tokio::test]
async fn test_movie_create_rejects_malformed_date() {
    let app = TestApp::new();
    let (_user_id, token) = app.create_user("bobwhite").await;
    let (name, value) = app.auth_header(&token);

    let mut body = matrix_body("THE MATRIX");
    body["released_on"] = json!("05/05/2021");

    let response = app
        .server()
        .post(MOVIES)
        .add_header(name, value)
        .json(&body)
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_movie_get_authenticated() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    let movie = app.create_movie(user_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .get(&format!("{MOVIES}/{}", movie.id))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], json!(movie.id));
}

#[tokio::test]
async fn test_movie_get_unknown_or_malformed_id_is_not_found() {
    let app = TestApp::new();
    let (_user_id, token) = app.create_user("bobwhite").await;
    let (name, value) = app.auth_header(&token);

    app.server()
        .get(&format!("{MOVIES}/{}", Uuid::new_v4()))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_not_found();

    app.server()
        .get(&format!("{MOVIES}/42"))
        .add_header(name, value)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_movie_update_by_another_user() {
    let app = TestApp::new();
    let (owner_id, _) = app.create_user("bobwhite").await;
    let (_editor_id, token) = app.create_user("bobwhite2").await;
    let movie = app.create_movie(owner_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);

    // Same shape as a serialized movie, including fields the server ignores
    let mut body = serde_json::to_value(&movie).unwrap();
    body["director"] = json!("robert deniro");

    let response = app
        .server()
        .put(&format!("{MOVIES}/{}", movie.id))
        .add_header(name, value)
        .json(&body)
        .await;

    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["director"], "robert deniro");
    assert_eq!(updated["owner"], json!(owner_id));
}

#[tokio::test]
async fn test_movie_update_unknown_id_is_not_found() {
    let app = TestApp::new();
    let (_user_id, token) = app.create_user("bobwhite").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .put(&format!("{MOVIES}/{}", Uuid::new_v4()))
        .add_header(name, value)
        .json(&matrix_body("THE MATRIX"))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_movie_patch_changes_only_given_fields() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    let movie = app.create_movie(user_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .patch(&format!("{MOVIES}/{}", movie.id))
        .add_header(name, value)
        .json(&json!({ "audience_score": 87 }))
        .await;

    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["audience_score"], 87);
    assert_eq!(updated["title"], "THE MATRIX 2");
}

#[tokio::test]
async fn test_movie_patch_validates_merged_result() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    let movie = app.create_movie(user_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);

    let response = app
        .server()
        .patch(&format!("{MOVIES}/{}", movie.id))
        .add_header(name, value)
        .json(&json!({ "title": "   " }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(app.state().movies.get(movie.id).await.unwrap().title, "THE MATRIX 2");
}

#[tokio::test]
async fn test_movie_delete_then_get_is_not_found() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    let movie = app.create_movie(user_id, "THE MATRIX 2").await;
    let (name, value) = app.auth_header(&token);
    let url = format!("{MOVIES}/{}", movie.id);

    app.server()
        .delete(&url)
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server()
        .get(&url)
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_not_found();

    app.server()
        .delete(&url)
        .add_header(name, value)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_movie_delete_removes_its_reviews() {
    let app = TestApp::new();
    let (user_id, token) = app.create_user("bobwhite").await;
    let movie = app.create_movie(user_id, "THE MATRIX 2").await;
    app.seed_review(user_id, movie.id, 5, "Nice movie").await;
    let (name, value) = app.auth_header(&token);

    app.server()
        .delete(&format!("{MOVIES}/{}", movie.id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(app.reviews_of(movie.id).await.is_empty());
}
