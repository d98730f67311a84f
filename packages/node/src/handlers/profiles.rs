//! Profile handlers.
//!
//! - `GET   /v1/profiles`      — every other user's profile.
//! - `GET   /v1/profiles/me`   — the caller's own profile.
//! - `PATCH /v1/profiles/me`   — partial update of the caller's profile.
//! - `GET   /v1/profiles/{id}` — any user's profile.
//!
//! Every view carries the accepted follower and following lists. Only the
//! owner can update a profile: the update route has no id in its path.
//!
//! Making a private profile public leaves existing pending requests pending;
//! the target still resolves them explicitly.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tether::{validate_profile_patch, FollowStatus, ProfilePatch, UserId};
use tether_node_api::{ProfileListResponse, ProfileUpdateRequest, ProfileView};

use crate::error::AppError;
use crate::middleware::auth::CurrentActor;

use super::{parse_user_id, AppState};

/// `GET /v1/profiles` — all profiles except the caller's, ordered by user id.
pub async fn list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ProfileListResponse>, AppError> {
    let users = state.store(state.storage.list_users()).await?;
    let mut items = Vec::with_capacity(users.len());
    for user in users.into_iter().filter(|u| u.id != actor) {
        items.push(profile_view(&state, user.id).await?);
    }
    Ok(Json(ProfileListResponse { items }))
}

/// `GET /v1/profiles/me`
pub async fn get_own(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(profile_view(&state, actor).await?))
}

/// `PATCH /v1/profiles/me` — returns the updated view.
///
/// Returns 422 if the patch is empty or a field is out of bounds.
pub async fn update_own(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<ProfileView>, AppError> {
    let Json(req) = payload?;
    let patch = ProfilePatch::from(req);
    validate_profile_patch(&patch)?;

    let profile = state
        .store(state.storage.update_profile(actor, &patch))
        .await?;
    tracing::info!(user = %actor, public = profile.public, "profile updated");

    Ok(Json(profile_view(&state, actor).await?))
}

/// `GET /v1/profiles/{id}`
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileView>, AppError> {
    let id = parse_user_id(&id)?;
    Ok(Json(profile_view(&state, id).await?))
}

async fn profile_view(state: &AppState, id: UserId) -> Result<ProfileView, AppError> {
    let user = state.require_user(id).await?;
    let profile = state
        .store(state.storage.get_profile(id))
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {id} has no profile")))?;

    let follower_ids: Vec<_> = state
        .store(state.storage.list_followers(id, FollowStatus::Accepted))
        .await?
        .into_iter()
        .map(|e| e.follower)
        .collect();
    let following_ids: Vec<_> = state
        .store(state.storage.list_following(id, FollowStatus::Accepted))
        .await?
        .into_iter()
        .map(|e| e.following)
        .collect();

    Ok(ProfileView {
        user: user.id,
        username: user.username,
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        public: profile.public,
        followers: state.summaries(&follower_ids).await?,
        following: state.summaries(&following_ids).await?,
    })
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
    async fn own_profile_requires_actor() {
        let app = build_app(new_storage());
        let (status, body) = send(&app, "GET", "/v1/profiles/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn directory_lists_everyone_but_the_caller() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let bob = seed_user(&storage, "bob", true).await;
        let carol = seed_user(&storage, "carol", false).await;
        storage.create_edge(alice, bob, FollowStatus::Accepted).await.unwrap();
        let app = build_app(storage);

        let (status, body) = send(&app, "GET", "/v1/profiles", Some(alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        let names: Vec<&str> = items.iter().map(|p| p["username"].as_str().unwrap()).collect();
        assert_eq!(names, ["bob", "carol"]);
        assert_eq!(items[0]["user"], bob.get());
        assert_eq!(items[0]["public"], true);
        assert_eq!(items[0]["followers"][0]["username"], "alice");
        assert_eq!(items[1]["user"], carol.get());

        let (status, body) = send(&app, "GET", "/v1/profiles", Some(bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["items"][0]["username"], "alice");

        let (status, _) = send(&app, "GET", "/v1/profiles", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_actor_is_unauthorized() {
        let app = build_app(new_storage());
        let (status, _) =
            send(&app, "GET", "/v1/profiles/me", Some(tether::UserId(77)), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn view_includes_accepted_lists() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let bob = seed_user(&storage, "bob", false).await;
        let carol = seed_user(&storage, "carol", false).await;
        storage.create_edge(bob, alice, FollowStatus::Accepted).await.unwrap();
        storage.create_edge(carol, alice, FollowStatus::Pending).await.unwrap();
        storage.create_edge(alice, carol, FollowStatus::Accepted).await.unwrap();
        let app = build_app(storage);

        let (status, body) = send(&app, "GET", "/v1/profiles/me", Some(alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["followers"].as_array().unwrap().len(), 1);
        assert_eq!(body["followers"][0]["username"], "bob");
        assert_eq!(body["following"][0]["username"], "carol");

        let (status, other) =
            send(&app, "GET", &format!("/v1/profiles/{alice}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(other, body);
    }

    #[tokio::test]
    async fn patch_updates_fields() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let app = build_app(storage);

        let (status, body) = send(
            &app,
            "PATCH",
            "/v1/profiles/me",
            Some(alice),
            Some(json!({ "public": true, "bio": "hello", "avatar_url": "https://img.example/a.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["public"], true);
        assert_eq!(body["bio"], "hello");
        assert_eq!(body["avatar_url"], "https://img.example/a.png");

        let (_, body) = send(
            &app,
            "PATCH",
            "/v1/profiles/me",
            Some(alice),
            Some(json!({ "avatar_url": null })),
        )
        .await;
        assert!(body.get("avatar_url").is_none());
        assert_eq!(body["bio"], "hello");
    }

    #[tokio::test]
    async fn patch_rejects_empty_and_oversized() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let app = build_app(storage);

        let (status, _) =
            send(&app, "PATCH", "/v1/profiles/me", Some(alice), Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let long_bio = "x".repeat(501);
        let (status, _) = send(
            &app,
            "PATCH",
            "/v1/profiles/me",
            Some(alice),
            Some(json!({ "bio": long_bio })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn going_public_keeps_pending_requests() {
        let storage = new_storage();
        let alice = seed_user(&storage, "alice", false).await;
        let bob = seed_user(&storage, "bob", false).await;
        storage.create_edge(bob, alice, FollowStatus::Pending).await.unwrap();
        let app = build_app(storage.clone());

        send(
            &app,
            "PATCH",
            "/v1/profiles/me",
            Some(alice),
            Some(json!({ "public": true })),
        )
        .await;

        let edge = storage.get_edge(bob, alice).await.unwrap().unwrap();
        assert_eq!(edge.status, FollowStatus::Pending);
    }
}
