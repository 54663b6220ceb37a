//! HTTP routes for Connector

pub mod auth_routes;
pub mod health;
pub mod posts;
pub mod profiles;
pub mod response;
pub mod users;
pub mod views;

use std::error::Error as StdError;
use std::sync::Arc;

use bytes::Bytes;
use hyper::body::Body;
use hyper::{HeaderMap, Method, Request, Response};

use crate::server::AppState;
use crate::types::{ConnectorError, Result};

pub use health::{health_check, readiness_check, version_info};
pub use response::{cors_preflight, error_response, BoxBody};

/// Handle everything under `/api/`
pub async fn handle_api_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();

    let body = if matches!(parts.method, Method::POST | Method::PUT) {
        match response::read_body(body, state.args.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => return error_response(&e),
        }
    } else {
        Bytes::new()
    };

    let path = parts.uri.path();
    let segments: Vec<&str> = path
        .strip_prefix("/api")
        .unwrap_or(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match route(&state, &parts.method, &segments, &parts.headers, &body).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

async fn route(
    state: &AppState,
    method: &Method,
    segments: &[&str],
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Response<BoxBody>> {
    match (method, segments) {
        // Accounts and sessions
        (&Method::POST, ["users"]) => users::register(state, body).await,
        (&Method::POST, ["auth"]) => auth_routes::login(state, body).await,
        (&Method::GET, ["auth"]) => auth_routes::current_user(state, headers).await,

        // Profiles
        (&Method::GET, ["profiles"]) => profiles::list_profiles(state).await,
        (&Method::POST, ["profiles"]) => profiles::upsert_profile(state, headers, body).await,
        (&Method::GET, ["profiles", "me"]) => profiles::my_profile(state, headers).await,
        (&Method::DELETE, ["profiles", "me"]) => profiles::delete_account(state, headers).await,
        (&Method::GET, ["profiles", "user", user_id]) => {
            profiles::profile_by_user(state, user_id).await
        }
        (&Method::PUT, ["profiles", "me", "experience"]) => {
            profiles::add_experience(state, headers, body).await
        }
        (&Method::DELETE, ["profiles", "me", "experience", id]) => {
            profiles::remove_experience(state, headers, id).await
        }
        (&Method::PUT, ["profiles", "me", "education"]) => {
            profiles::add_education(state, headers, body).await
        }
        (&Method::DELETE, ["profiles", "me", "education", id]) => {
            profiles::remove_education(state, headers, id).await
        }

        // Posts; "me" must win over the ":id" pattern
        (&Method::GET, ["posts"]) => posts::list_posts(state, headers).await,
        (&Method::POST, ["posts"]) => posts::create_post(state, headers, body).await,
        (&Method::GET, ["posts", "me"]) => posts::my_posts(state, headers).await,
        (&Method::GET, ["posts", id]) => posts::get_post(state, headers, id).await,
        (&Method::DELETE, ["posts", id]) => posts::delete_post(state, headers, id).await,
        (&Method::PUT, ["posts", id, "likes"]) => posts::like_post(state, headers, id).await,
        (&Method::PUT, ["posts", id, "dislike"]) => posts::unlike_post(state, headers, id).await,
        (&Method::POST, ["posts", id, "comments"]) => {
            posts::add_comment(state, headers, id, body).await
        }
        (&Method::DELETE, ["posts", id, "comments", comment_id]) => {
            posts::remove_comment(state, headers, id, comment_id).await
        }

        _ => Err(ConnectorError::NotFound("Route not found".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtValidator;
    use crate::config::Args;
    use crate::store::MemoryStore;
    use bson::oid::ObjectId;
    use http_body_util::{BodyExt, Full};
    use hyper::StatusCode;
    use serde_json::{json, Value};

    fn test_state() -> Arc<AppState> {
        let args = Args::dev();
        let jwt = JwtValidator::new(args.jwt_secret().unwrap(), 3600).unwrap();
        Arc::new(AppState::new(args, Arc::new(MemoryStore::new()), jwt))
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        let payload = body.map(|b| b.to_string()).unwrap_or_default();
        let req = builder.body(Full::new(Bytes::from(payload))).unwrap();

        let response = handle_api_request(req, state.clone()).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(state: &Arc<AppState>, name: &str) -> String {
        let (status, body) = call(
            state,
            Method::POST,
            "/api/users",
            None,
            Some(json!({
                "name": name,
                "email": format!("{}@example.com", name),
                "password": "secret123",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_post(state: &Arc<AppState>, token: &str, text: &str) -> String {
        let (status, body) = call(
            state,
            Method::POST,
            "/api/posts",
            Some(token),
            Some(json!({ "text": text })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body[0]["_id"].as_str().unwrap().to_string()
    }

    async fn create_profile(state: &Arc<AppState>, token: &str) {
        let (status, _) = call(
            state,
            Method::POST,
            "/api/profiles",
            Some(token),
            Some(json!({ "status": "Developer", "skills": "rust, go" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_validation_reports_every_field() {
        let state = test_state();
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "nope", "password": "123" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let params: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["param"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(params, ["name", "email", "password"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let state = test_state();
        register(&state, "ann").await;

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "name": "Ann", "email": "ANN@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_and_current_user() {
        let state = test_state();
        register(&state, "ann").await;

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/auth",
            None,
            Some(json!({ "email": "ann@example.com", "password": "wrong-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/auth",
            None,
            Some(json!({ "email": "ann@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = call(&state, Method::GET, "/api/auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "ann@example.com");
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_private_routes_require_token() {
        let state = test_state();
        let (status, _) = call(&state, Method::GET, "/api/posts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&state, Method::GET, "/api/auth", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_not_found() {
        let state = test_state();
        let (status, _) = call(&state, Method::GET, "/api/nothing/here", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_like_unlike_walkthrough() {
        let state = test_state();
        let author = register(&state, "author").await;
        let u1 = register(&state, "u1").await;
        let u2 = register(&state, "u2").await;
        let post = create_post(&state, &author, "hello").await;
        let likes = format!("/api/posts/{}/likes", post);
        let dislike = format!("/api/posts/{}/dislike", post);

        let (status, body) = call(&state, Method::PUT, &likes, Some(&u1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["likes"].as_array().unwrap().len(), 1);
        assert_eq!(body["likes"][0]["name"], "u1");

        let (status, _) = call(&state, Method::PUT, &likes, Some(&u1), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&state, Method::PUT, &dislike, Some(&u2), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&state, Method::PUT, &dislike, Some(&u1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["likes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_removal_ownership() {
        let state = test_state();
        let author = register(&state, "author").await;
        let commenter = register(&state, "commenter").await;
        let stranger = register(&state, "stranger").await;
        let post = create_post(&state, &author, "hello").await;
        let comments = format!("/api/posts/{}/comments", post);

        let (status, body) = call(
            &state,
            Method::POST,
            &comments,
            Some(&commenter),
            Some(json!({ "text": "first" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let first = body[0]["_id"].as_str().unwrap().to_string();

        let (_, body) = call(
            &state,
            Method::POST,
            &comments,
            Some(&commenter),
            Some(json!({ "text": "second" })),
        )
        .await;
        assert_eq!(body[0]["text"], "second");
        let second = body[0]["_id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &state,
            Method::DELETE,
            &format!("{}/{}", comments, first),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &state,
            Method::DELETE,
            &format!("{}/{}", comments, first),
            Some(&commenter),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        // The post author may remove someone else's comment
        let (status, body) = call(
            &state,
            Method::DELETE,
            &format!("{}/{}", comments, second),
            Some(&author),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = call(
            &state,
            Method::DELETE,
            &format!("{}/{}", comments, second),
            Some(&author),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_requires_text() {
        let state = test_state();
        let author = register(&state, "author").await;
        let post = create_post(&state, &author, "hello").await;

        let (status, body) = call(
            &state,
            Method::POST,
            &format!("/api/posts/{}/comments", post),
            Some(&author),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["param"], "text");
    }

    #[tokio::test]
    async fn test_post_delete_ownership_and_listing() {
        let state = test_state();
        let author = register(&state, "author").await;
        let other = register(&state, "other").await;
        let first = create_post(&state, &author, "first").await;
        create_post(&state, &author, "second").await;
        let path = format!("/api/posts/{}", first);

        let (status, _) = call(&state, Method::DELETE, &path, Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&state, Method::DELETE, &path, Some(&author), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Post removed");
        assert_eq!(body["posts"]["count"], 1);
        assert_eq!(body["posts"]["posts"][0]["text"], "second");

        let (status, _) = call(&state, Method::GET, &path, Some(&author), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_post_id_not_found() {
        let state = test_state();
        let token = register(&state, "ann").await;
        let (status, _) = call(&state, Method::GET, "/api/posts/not-an-id", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_posts_me_lists_only_callers_posts() {
        let state = test_state();
        let ann = register(&state, "ann").await;
        let bob = register(&state, "bob").await;
        create_post(&state, &ann, "from ann").await;
        create_post(&state, &bob, "from bob").await;

        let (_, mine) = call(&state, Method::GET, "/api/posts/me", Some(&ann), None).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["text"], "from ann");

        let (_, all) = call(&state, Method::GET, "/api/posts", Some(&ann), None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        assert_eq!(all[0]["text"], "from bob");
    }

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let state = test_state();
        let token = register(&state, "ann").await;

        let (status, _) = call(&state, Method::GET, "/api/profiles/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        create_profile(&state, &token).await;
        let (status, profile) =
            call(&state, Method::GET, "/api/profiles/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["skills"], json!(["RUST", "GO"]));
        assert_eq!(profile["user"]["name"], "ann");

        let user_id = profile["user"]["_id"].as_str().unwrap().to_string();
        let (status, public) = call(
            &state,
            Method::GET,
            &format!("/api/profiles/user/{}", user_id),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public["status"], "Developer");

        let (status, _) = call(&state, Method::GET, "/api/profiles/user/bogus", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, all) = call(&state, Method::GET, "/api/profiles", None, None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_experience_add_and_remove() {
        let state = test_state();
        let token = register(&state, "ann").await;
        create_profile(&state, &token).await;

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/profiles/me/experience",
            Some(&token),
            Some(json!({ "title": "Dev" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);

        let (_, profile) = call(&state, Method::GET, "/api/profiles/me", Some(&token), None).await;
        assert!(profile["experience"].as_array().unwrap().is_empty());

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/profiles/me/experience",
            Some(&token),
            Some(json!({ "title": "Dev", "company": "Acme", "from": "2020-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body[0]["_id"].as_str().unwrap().to_string();

        let missing = format!("/api/profiles/me/experience/{}", ObjectId::new().to_hex());
        let (status, _) = call(&state, Method::DELETE, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            &state,
            Method::DELETE,
            &format!("/api/profiles/me/experience/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_education_add_and_remove() {
        let state = test_state();
        let token = register(&state, "ann").await;
        create_profile(&state, &token).await;

        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/profiles/me/education",
            Some(&token),
            Some(json!({
                "school": "MIT",
                "degree": "BSc",
                "fieldofstudy": "CS",
                "from": "2010-09-01",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["fieldofstudy"], "CS");
        let id = body[0]["_id"].as_str().unwrap().to_string();

        let missing = format!("/api/profiles/me/education/{}", ObjectId::new().to_hex());
        let (status, _) = call(&state, Method::DELETE, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, profile) = call(&state, Method::GET, "/api/profiles/me", Some(&token), None).await;
        assert_eq!(profile["education"].as_array().unwrap().len(), 1);

        let (status, body) = call(
            &state,
            Method::DELETE,
            &format!("/api/profiles/me/education/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_account_delete_cascades() {
        let state = test_state();
        let token = register(&state, "ann").await;
        let reader = register(&state, "reader").await;
        create_profile(&state, &token).await;
        create_post(&state, &token, "bye").await;

        let (status, _) = call(&state, Method::DELETE, "/api/profiles/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, posts) = call(&state, Method::GET, "/api/posts", Some(&reader), None).await;
        assert!(posts.as_array().unwrap().is_empty());

        let (_, profiles) = call(&state, Method::GET, "/api/profiles", None, None).await;
        assert!(profiles.as_array().unwrap().is_empty());

        let (status, _) = call(&state, Method::GET, "/api/auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let state = test_state();
        let huge = "x".repeat(state.args.max_body_bytes + 1);
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "name": huge })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
