//! HTTP request handlers for all Tether node endpoints.
//!
//! Each submodule covers a logical group of endpoints. Handlers are async
//! functions that receive Axum extractors and return
//! `Result<impl IntoResponse, AppError>`.
//!
//! Handlers parse wire input (ids, action strings) into domain types once and
//! hand them to the [`FollowEngine`]. No follow-graph decision is taken here.

pub mod follows;
pub mod profiles;
pub mod users;

use std::future::Future;
use std::sync::Arc;

use axum::{http::StatusCode, Json};
use tether::{Outcome, User, UserId};
use tether_node_api::{OutcomeResponse, UserSummary};

use crate::{
    config::NodeConfig,
    engine::FollowEngine,
    error::AppError,
    storage::{Storage, StorageError},
};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub engine: FollowEngine,
    pub config: NodeConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: NodeConfig) -> Self {
        let engine = FollowEngine::new(Arc::clone(&storage), config.store_timeout);
        Self {
            storage,
            engine,
            config,
        }
    }

    /// Run a storage call under the configured store timeout.
    pub async fn store<T>(
        &self,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, AppError> {
        Ok(self.engine.bounded(fut).await?)
    }

    /// Resolve ids to summaries, keeping the order of `ids`.
    pub(crate) async fn summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, AppError> {
        let users = self.store(self.storage.get_users(ids)).await?;
        Ok(ids
            .iter()
            .filter_map(|id| users.iter().find(|u| u.id == *id))
            .map(UserSummary::from)
            .collect())
    }

    /// Look up a user, mapping absence to 404.
    pub(crate) async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.store(self.storage.get_user(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }
}

/// Parse a `{id}` path segment. Anything that is not a positive integer
/// cannot name a user.
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("user {raw} not found")))
}

/// HTTP status for an outcome. Outcomes where an existing edge blocked the
/// request are reported as 400 with the outcome body.
pub(crate) fn outcome_status(outcome: Outcome) -> StatusCode {
    match outcome {
        Outcome::FollowSucceeded | Outcome::PendingApproval => StatusCode::CREATED,
        Outcome::AlreadyFollowing | Outcome::PendingRequestExists => StatusCode::BAD_REQUEST,
        Outcome::RequestCanceled | Outcome::RequestAccepted | Outcome::Unfollowed => {
            StatusCode::OK
        }
    }
}

pub(crate) fn outcome_response(outcome: Outcome) -> (StatusCode, Json<OutcomeResponse>) {
    (outcome_status(outcome), Json(OutcomeResponse::from(outcome)))
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------
