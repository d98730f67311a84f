//! The follow-request state machine.
//!
//! For a single ordered pair `(follower, following)` the relationship is in
//! one of three states:
//!
//! ```text
//!            request (private)            accept
//!   ABSENT ─────────────────────▶ PENDING ────────▶ ACCEPTED
//!     │  ▲                           │                 │
//!     │  └────────── cancel ─────────┘                 │
//!     │  ▲                                             │
//!     │  └──────────────────── unfollow ───────────────┘
//!     └────────────── request (public) ──────────────▶ ACCEPTED
//! ```
//!
//! The functions here are pure: they take the current state (the status of
//! the edge, or `None` when there is no edge) and return a [`Step`] naming
//! the storage [`Effect`] to apply and the [`Outcome`] to report. Applying
//! the effect atomically is the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::FollowError;
use crate::types::{FollowStatus, RequestAction, ResponseAction, UserId};

/// The mutation a transition requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Observation only.
    None,
    /// Insert a new edge with this status. Must fail if an edge already exists.
    Create(FollowStatus),
    /// Change the status of an edge that is currently `from`.
    SetStatus { from: FollowStatus, to: FollowStatus },
    /// Remove an edge that is currently `expected`.
    Delete { expected: FollowStatus },
}

impl Effect {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Effect::None)
    }
}

/// Semantic result of a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Public target: the edge was created already accepted.
    FollowSucceeded,
    /// Private target: the edge was created pending.
    PendingApproval,
    /// An accepted edge already exists; nothing changed.
    AlreadyFollowing,
    /// A pending edge already exists; nothing changed.
    PendingRequestExists,
    /// A pending edge was deleted.
    RequestCanceled,
    /// A pending edge became accepted.
    RequestAccepted,
    /// An accepted edge was deleted.
    Unfollowed,
}

impl Outcome {
    /// Machine-readable code, identical to the serialised form.
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::FollowSucceeded => "follow_succeeded",
            Outcome::PendingApproval => "pending_approval",
            Outcome::AlreadyFollowing => "already_following",
            Outcome::PendingRequestExists => "pending_request_exists",
            Outcome::RequestCanceled => "request_canceled",
            Outcome::RequestAccepted => "request_accepted",
            Outcome::Unfollowed => "unfollowed",
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::FollowSucceeded => "You are now following this user.",
            Outcome::PendingApproval => "Follow request sent and awaiting approval.",
            Outcome::AlreadyFollowing => "You are already following this user.",
            Outcome::PendingRequestExists => "A follow request to this user is already pending.",
            Outcome::RequestCanceled => "Follow request canceled.",
            Outcome::RequestAccepted => "Follow request accepted.",
            Outcome::Unfollowed => "You have unfollowed this user.",
        }
    }

    /// Value of the `reqstatus` field reported alongside the outcome.
    ///
    /// `"rejected"` reports a request that no longer exists.
    pub fn reqstatus(&self) -> Option<&'static str> {
        match self {
            Outcome::FollowSucceeded | Outcome::AlreadyFollowing | Outcome::RequestAccepted => {
                Some("accepted")
            }
            Outcome::PendingApproval | Outcome::PendingRequestExists => Some("pending"),
            Outcome::RequestCanceled => Some("rejected"),
            Outcome::Unfollowed => None,
        }
    }

    /// Whether an existing edge blocked the request. These outcomes are
    /// reported with a client-error status even though nothing failed.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Outcome::AlreadyFollowing | Outcome::PendingRequestExists)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A decided transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub effect: Effect,
    pub outcome: Outcome,
}

impl Step {
    fn observe(outcome: Outcome) -> Self {
        Self {
            effect: Effect::None,
            outcome,
        }
    }

    /// Status of the edge once the effect has been applied, starting from
    /// `current`.
    pub fn resulting_status(&self, current: Option<FollowStatus>) -> Option<FollowStatus> {
        match self.effect {
            Effect::None => current,
            Effect::Create(s) => Some(s),
            Effect::SetStatus { to, .. } => Some(to),
            Effect::Delete { .. } => None,
        }
    }
}

/// Reject following oneself.
pub fn ensure_distinct(actor: UserId, target: UserId) -> Result<(), FollowError> {
    if actor == target {
        return Err(FollowError::InvalidOperation("You cannot follow yourself.".into()));
    }
    Ok(())
}

/// Decide a follow request by the follower.
///
/// `action` only has meaning while a request is pending; on a fresh request
/// it is ignored and the request proceeds normally.
pub fn on_request(
    current: Option<FollowStatus>,
    target_public: bool,
    action: Option<RequestAction>,
) -> Step {
    match current {
        Some(FollowStatus::Accepted) => Step::observe(Outcome::AlreadyFollowing),
        Some(FollowStatus::Pending) => match action {
            Some(RequestAction::Cancel) => Step {
                effect: Effect::Delete {
                    expected: FollowStatus::Pending,
                },
                outcome: Outcome::RequestCanceled,
            },
            None => Step::observe(Outcome::PendingRequestExists),
        },
        None if target_public => Step {
            effect: Effect::Create(FollowStatus::Accepted),
            outcome: Outcome::FollowSucceeded,
        },
        None => Step {
            effect: Effect::Create(FollowStatus::Pending),
            outcome: Outcome::PendingApproval,
        },
    }
}

/// Decide the followed user's answer to a pending request.
pub fn on_response(
    current: Option<FollowStatus>,
    action: ResponseAction,
) -> Result<Step, FollowError> {
    if current != Some(FollowStatus::Pending) {
        return Err(FollowError::NotFound("no pending follow request from this user".into()));
    }
    Ok(match action {
        ResponseAction::Accept => Step {
            effect: Effect::SetStatus {
                from: FollowStatus::Pending,
                to: FollowStatus::Accepted,
            },
            outcome: Outcome::RequestAccepted,
        },
        ResponseAction::Cancel => Step {
            effect: Effect::Delete {
                expected: FollowStatus::Pending,
            },
            outcome: Outcome::RequestCanceled,
        },
    })
}

/// Decide an unfollow. A pending outbound request is not "following".
pub fn on_unfollow(current: Option<FollowStatus>) -> Result<Step, FollowError> {
    match current {
        Some(FollowStatus::Accepted) => Ok(Step {
            effect: Effect::Delete {
                expected: FollowStatus::Accepted,
            },
            outcome: Outcome::Unfollowed,
        }),
        _ => Err(FollowError::NotFollowing),
    }
}
