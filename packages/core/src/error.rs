use thiserror::Error;

/// Failures of a follow-graph operation that are reported to the caller.
///
/// Expected states of a relationship (already following, request already
/// pending, ...) are not errors; they are [`Outcome`](crate::Outcome) values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FollowError {
    /// A referenced user or edge does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is well-formed but not allowed (self-follow, malformed
    /// request action).
    #[error("{0}")]
    InvalidOperation(String),

    /// The action given when answering a pending request is not recognised.
    #[error("{0}")]
    InvalidAction(String),

    /// Unfollow was requested but no accepted edge exists.
    #[error("you are not following this user")]
    NotFollowing,

    /// No authenticated actor accompanies the request.
    #[error("{0}")]
    Unauthorized(String),
}
