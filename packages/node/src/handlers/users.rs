//! User directory handlers.
//!
//! - `POST /v1/users`                — register a user and its profile.
//! - `GET  /v1/users/{id}`           — look up a user.
//! - `GET  /v1/users/{id}/followers` — users with an accepted edge towards `id`.
//! - `GET  /v1/users/{id}/following` — users `id` has an accepted edge towards.
//!
//! Registration is open: the gateway in front of the node decides who may
//! call it.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tether::{validate_email, validate_username, FollowStatus, User};
use tether_node_api::{RegisterRequest, RegisterResponse, UserListResponse};

use crate::error::AppError;

use super::{parse_user_id, AppState};

/// `POST /v1/users` — register a user.
///
/// Returns 201 with the user and its freshly created profile. Returns 409 if
/// the username is taken and 422 if the username or email is malformed.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    validate_username(&req.username)?;
    if let Some(email) = &req.email {
        validate_email(email)?;
    }

    let (user, profile) = state
        .store(
            state
                .storage
                .create_user(&req.username, req.email.as_deref(), req.public),
        )
        .await?;

    tracing::info!(user = %user.id, username = %user.username, public = profile.public, "user registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { user, profile })))
}

/// `GET /v1/users/{id}` — look up a user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_user_id(&id)?;
    Ok(Json(state.require_user(id).await?))
}

/// `GET /v1/users/{id}/followers` — accepted followers, ordered by id.
pub async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserListResponse>, AppError> {
    let id = parse_user_id(&id)?;
    state.require_user(id).await?;

    let ids: Vec<_> = state
        .store(state.storage.list_followers(id, FollowStatus::Accepted))
        .await?
        .into_iter()
        .map(|e| e.follower)
        .collect();
    Ok(Json(UserListResponse {
        items: state.summaries(&ids).await?,
    }))
}

/// `GET /v1/users/{id}/following` — accepted followees, ordered by id.
pub async fn list_following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserListResponse>, AppError> {
    let id = parse_user_id(&id)?;
    state.require_user(id).await?;

    let ids: Vec<_> = state
        .store(state.storage.list_following(id, FollowStatus::Accepted))
        .await?
        .into_iter()
        .map(|e| e.following)
        .collect();
    Ok(Json(UserListResponse {
        items: state.summaries(&ids).await?,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tether::FollowStatus;

    use crate::handlers::test_support::{build_app, new_storage, seed_user, send};

    #[tokio::test]
    async fn register_returns_201_with_private_profile() {
        let app = build_app(new_storage());
        let (status, body) = send(
            &app,
            "POST",
            "/v1/users",
            None,
            Some(json!({ "username": "alice", "email": "alice@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["profile"]["public"], false);
        assert_eq!(body["profile"]["owner"], body["user"]["id"]);
    }

    #[tokio::test]
    async fn duplicate_username_returns_409() {
        let app = build_app(new_storage());
        let req = json!({ "username": "alice" });
        send(&app, "POST", "/v1/users", None, Some(req.clone())).await;
        let (status, body) = send(&app, "POST", "/v1/users", None, Some(req)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "conflict");
    }

    #[tokio::test]
    async fn bad_username_returns_422() {
        let app = build_app(new_storage());
        let (status, body) = send(
            &app,
            "POST",
            "/v1/users",
            None,
            Some(json!({ "username": "not valid!" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "validation_failed");
    }

    #[tokio::test]
    async fn malformed_body_returns_400() {
        let app = build_app(new_storage());
        let (status, body) =
            send(&app, "POST", "/v1/users", None, Some(json!({ "name": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_json");
    }

    #[tokio::test]
    async fn get_user_found_and_missing() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let app = build_app(storage);

        let (status, body) = send(&app, "GET", &format!("/v1/users/{alice}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (status, _) = send(&app, "GET", "/v1/users/999", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/v1/users/abc", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn follower_lists_show_accepted_edges_only() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let bob = seed_user(&storage, "bob", false).await;
        let carol = seed_user(&storage, "carol", false).await;
        storage.create_edge(carol, alice, FollowStatus::Accepted).await.unwrap();
        storage.create_edge(bob, alice, FollowStatus::Pending).await.unwrap();
        let app = build_app(storage);

        let (status, body) =
            send(&app, "GET", &format!("/v1/users/{alice}/followers"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["username"], "carol");

        let (_, body) =
            send(&app, "GET", &format!("/v1/users/{carol}/following"), None, None).await;
        assert_eq!(body["items"][0]["id"], alice.get());

        let (_, body) =
            send(&app, "GET", &format!("/v1/users/{bob}/following"), None, None).await;
        assert!(body["items"].as_array().unwrap().is_empty());
    }
}
