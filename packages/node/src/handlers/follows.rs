//! Follow-graph handlers.
//!
//! - `POST   /v1/follows`         — request to follow a user, or cancel a pending request.
//! - `DELETE /v1/follows/{id}`    — unfollow a user.
//! - `GET    /v1/follow-requests` — pending requests addressed to the caller.
//! - `POST   /v1/follow-requests` — accept or cancel a pending request.
//!
//! All four require a [`CurrentActor`]. State operations answer with an
//! [`OutcomeResponse`](tether_node_api::OutcomeResponse); see
//! [`outcome_status`](super::outcome_status) for the status mapping.
//! Action strings are parsed here, before any storage access.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use tether::{FollowError, FollowStatus, RequestAction, ResponseAction};
use tether_node_api::{
    FollowRequest, PendingRequestEntry, PendingRequestsResponse, RespondRequest, UserSummary,
};

use crate::error::AppError;
use crate::middleware::auth::CurrentActor;

use super::{outcome_response, AppState};

/// `POST /v1/follows` — follow `following_id`.
///
/// Public targets are followed at once (201 `follow_succeeded`), private
/// targets get a pending request (201 `pending_approval`). With
/// `action: "cancel"` a pending request is withdrawn (200 `request_canceled`);
/// on a fresh request the action is ignored.
///
/// An existing edge is reported as 400 with `already_following` or
/// `pending_request_exists`. Returns 404 for an unknown target and 400
/// `invalid_operation` for a self-follow or an unrecognised action.
pub async fn request_follow(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<FollowRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let action = RequestAction::parse_optional(req.action.as_deref())
        .map_err(FollowError::InvalidOperation)?;

    let transition = state
        .engine
        .request_follow(actor, req.following_id, action)
        .await?;
    Ok(outcome_response(transition.outcome))
}

/// `DELETE /v1/follows/{id}` — stop following `id`.
///
/// Returns 404 `not_following` unless an accepted edge exists. A pending
/// request is withdrawn through `POST /v1/follows` instead.
pub async fn unfollow(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(target): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // An id that cannot name a user cannot be followed either.
    let target = target
        .parse()
        .map_err(|_| FollowError::NotFollowing)?;

    let transition = state.engine.unfollow(actor, target).await?;
    Ok(outcome_response(transition.outcome))
}

/// `GET /v1/follow-requests` — pending requests addressed to the caller,
/// ordered by requester id.
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<PendingRequestsResponse>, AppError> {
    let edges = state
        .store(state.storage.list_followers(actor, FollowStatus::Pending))
        .await?;
    let ids: Vec<_> = edges.iter().map(|e| e.follower).collect();
    let users = state.store(state.storage.get_users(&ids)).await?;

    let items = edges
        .into_iter()
        .filter_map(|edge| {
            users
                .iter()
                .find(|u| u.id == edge.follower)
                .map(|u| PendingRequestEntry {
                    follower: UserSummary::from(u),
                    requested_at: edge.created_at,
                })
        })
        .collect();
    Ok(Json(PendingRequestsResponse { items }))
}

/// `POST /v1/follow-requests` — answer the pending request from `follower_id`.
///
/// `action` is `accept` (200 `request_accepted`) or `cancel`
/// (200 `request_canceled`), case-insensitive. Anything else is 400
/// `invalid_action`. Returns 404 if there is no pending request from that user.
pub async fn respond(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let action: ResponseAction = match req.action.as_deref().map(str::trim) {
        None | Some("") => {
            return Err(FollowError::InvalidAction(
                "action is required; expected one of: accept, cancel".into(),
            )
            .into())
        }
        Some(raw) => raw.parse().map_err(FollowError::InvalidAction)?,
    };

    let transition = state
        .engine
        .respond_to_request(actor, req.follower_id, action)
        .await?;
    Ok(outcome_response(transition.outcome))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
