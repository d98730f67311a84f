//! Follow Request Engine.
//!
//! Applies the pure state machine in [`tether::machine`] against a shared
//! [`Storage`]. The engine holds no per-request state; any number of
//! concurrent requests may share one instance.
//!
//! # Races
//!
//! Every mutation goes through a conditional storage primitive:
//! `create_edge` fails with `Conflict` when an edge already exists, and
//! `set_edge_status` / `delete_edge` fail with `NotFound` when the edge is no
//! longer in the expected status. Either failure means another request changed
//! the pair between our read and our write. The engine then re-reads the edge
//! and decides once more. After a second lost race it reads the pair one last
//! time without writing: if that state answers the call (already following,
//! no pending request, ...) the answer is returned, otherwise the call fails
//! with [`EngineError::Conflict`].
//!
//! Every storage call is bounded by the configured store timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tether::{
    ensure_distinct, on_request, on_response, on_unfollow, Effect, FollowError, FollowStatus,
    Outcome, RequestAction, ResponseAction, Step, UserId,
};
use tracing::{debug, info, warn};

use crate::storage::{Storage, StorageError};

/// Errors the engine can return.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A caller-facing failure of the operation itself.
    #[error(transparent)]
    Follow(#[from] FollowError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A storage call did not finish within the store timeout.
    #[error("storage did not respond within {0:?}")]
    Timeout(Duration),

    /// The pair changed underneath us twice in a row and still needs a write.
    #[error("follow edge {follower} -> {following} changed concurrently; retry the request")]
    Conflict { follower: UserId, following: UserId },
}

/// Result of a successful operation: what happened and the edge status that
/// holds afterwards (`None` when no edge exists).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub outcome: Outcome,
    pub status: Option<FollowStatus>,
}

enum Attempt {
    Done(Transition),
    Raced,
}

/// The follow-request state machine bound to a storage backend.
#[derive(Clone)]
pub struct FollowEngine {
    storage: Arc<dyn Storage>,
    store_timeout: Duration,
}

impl FollowEngine {
    pub fn new(storage: Arc<dyn Storage>, store_timeout: Duration) -> Self {
        Self {
            storage,
            store_timeout,
        }
    }

    /// `actor` asks to follow `target`, optionally canceling a pending request.
    pub async fn request_follow(
        &self,
        actor: UserId,
        target: UserId,
        action: Option<RequestAction>,
    ) -> Result<Transition, EngineError> {
        if !self.bounded(self.storage.user_exists(target)).await? {
            return Err(FollowError::NotFound(format!("user {target} not found")).into());
        }
        ensure_distinct(actor, target)?;

        let profile = self
            .bounded(self.storage.get_profile(target))
            .await?
            .ok_or_else(|| FollowError::NotFound(format!("profile of user {target} not found")))?;
        let public = profile.public;

        self.drive(actor, target, move |current| {
            Ok(on_request(current, public, action))
        })
        .await
    }

    /// `actor` accepts or cancels the pending request `requester -> actor`.
    pub async fn respond_to_request(
        &self,
        actor: UserId,
        requester: UserId,
        action: ResponseAction,
    ) -> Result<Transition, EngineError> {
        if !self.bounded(self.storage.user_exists(requester)).await? {
            return Err(FollowError::NotFound(format!("user {requester} not found")).into());
        }

        self.drive(requester, actor, move |current| on_response(current, action))
            .await
    }

    /// `actor` stops following `target`.
    pub async fn unfollow(&self, actor: UserId, target: UserId) -> Result<Transition, EngineError> {
        self.drive(actor, target, on_unfollow).await
    }

    /// Run a storage call under the store timeout.
    pub async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, EngineError> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(timeout = ?self.store_timeout, "storage call timed out");
                Err(EngineError::Timeout(self.store_timeout))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn drive<F>(
        &self,
        follower: UserId,
        following: UserId,
        decide: F,
    ) -> Result<Transition, EngineError>
    where
        F: Fn(Option<FollowStatus>) -> Result<Step, FollowError>,
    {
        if let Attempt::Done(t) = self.attempt(follower, following, &decide).await? {
            return Ok(t);
        }

        warn!(%follower, %following, "follow edge changed during transition; re-evaluating");
        if let Attempt::Done(t) = self.attempt(follower, following, &decide).await? {
            return Ok(t);
        }

        // Settle on whatever the pair looks like now; no third write.
        let current = self.current(follower, following).await?;
        let step = decide(current)?;
        if step.effect.is_mutation() {
            warn!(%follower, %following, "follow edge changed again; giving up");
            return Err(EngineError::Conflict {
                follower,
                following,
            });
        }
        debug!(%follower, %following, outcome = %step.outcome, "follow edge settled after races");
        Ok(Transition {
            outcome: step.outcome,
            status: step.resulting_status(current),
        })
    }

    async fn current(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<FollowStatus>, EngineError> {
        Ok(self
            .bounded(self.storage.get_edge(follower, following))
            .await?
            .map(|e| e.status))
    }

    async fn attempt<F>(
        &self,
        follower: UserId,
        following: UserId,
        decide: &F,
    ) -> Result<Attempt, EngineError>
    where
        F: Fn(Option<FollowStatus>) -> Result<Step, FollowError>,
    {
        let current = self.current(follower, following).await?;
        let step = decide(current)?;

        let applied = match step.effect {
            Effect::None => Ok(()),
            Effect::Create(status) => self
                .bounded(self.storage.create_edge(follower, following, status))
                .await
                .map(drop),
            Effect::SetStatus { from, to } => self
                .bounded(self.storage.set_edge_status(follower, following, from, to))
                .await
                .map(drop),
            Effect::Delete { expected } => {
                self.bounded(self.storage.delete_edge(follower, following, expected))
                    .await
            }
        };

        match applied {
            Ok(()) => {
                let status = step.resulting_status(current);
                if step.effect.is_mutation() {
                    info!(%follower, %following, outcome = %step.outcome, ?status, "follow edge updated");
                } else {
                    debug!(%follower, %following, outcome = %step.outcome, ?status, "follow edge unchanged");
                }
                Ok(Attempt::Done(Transition {
                    outcome: step.outcome,
                    status,
                }))
            }
            Err(EngineError::Storage(StorageError::Conflict(_)))
            | Err(EngineError::Storage(StorageError::NotFound)) => Ok(Attempt::Raced),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
