//! Follow-graph types — `POST/DELETE /v1/follows`, `GET/POST /v1/follow-requests`.
//!
//! Action strings travel as free-form text on the wire and are parsed into
//! [`tether::RequestAction`] / [`tether::ResponseAction`] by the node before
//! any state is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether::{Outcome, UserId};

use crate::user::UserSummary;

/// Request body for `POST /v1/follows` — ask to follow a user.
///
/// `action: "cancel"` withdraws a request that is still pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowRequest {
    pub following_id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Request body for `POST /v1/follow-requests` — answer a pending request
/// addressed to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RespondRequest {
    pub follower_id: UserId,

    /// `"accept"` or `"cancel"`, case-insensitive.
    #[serde(default)]
    pub action: Option<String>,
}

/// Body returned by every follow-graph state operation.
///
/// ```json
/// { "outcome": "pending_approval", "detail": "Follow request sent and awaiting approval.", "reqstatus": "pending" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeResponse {
    pub outcome: Outcome,
    pub detail: String,

    /// `accepted`, `pending`, or `rejected` (request no longer exists).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reqstatus: Option<String>,
}

impl From<Outcome> for OutcomeResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            outcome,
            detail: outcome.message().to_string(),
            reqstatus: outcome.reqstatus().map(str::to_string),
        }
    }
}

/// A pending request addressed to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingRequestEntry {
    pub follower: UserSummary,
    pub requested_at: DateTime<Utc>,
}

/// Returned by `GET /v1/follow-requests`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingRequestsResponse {
    pub items: Vec<PendingRequestEntry>,
}
