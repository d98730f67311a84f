//! Domain core of the Tether follow-graph service.
//!
//! This crate holds the types and the decision logic of the service with no
//! I/O attached. The `tether-node` crate applies the decisions against
//! storage and exposes them over HTTP.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | [`UserId`], [`User`], [`Profile`], [`FollowEdge`], [`FollowStatus`], action enums |
//! | [`machine`] | The follow-request state machine: [`on_request`], [`on_response`], [`on_unfollow`] |
//! | [`error`] | [`FollowError`], the caller-facing failure taxonomy |
//! | [`validation`] | Username, email and profile field checks |
//!
//! # Quick start
//!
//! ```rust
//! use tether::{on_request, Effect, FollowStatus, Outcome};
//!
//! // No edge yet, private target: the request goes pending.
//! let step = on_request(None, false, None);
//! assert_eq!(step.effect, Effect::Create(FollowStatus::Pending));
//! assert_eq!(step.outcome, Outcome::PendingApproval);
//! ```

pub mod error;
pub mod machine;
pub mod types;
pub mod validation;

pub use error::FollowError;
pub use machine::{ensure_distinct, on_request, on_response, on_unfollow, Effect, Outcome, Step};
pub use types::{
    FollowEdge, FollowStatus, Profile, ProfilePatch, RequestAction, ResponseAction, User, UserId,
};
pub use validation::{
    validate_email, validate_profile_patch, validate_username, ValidationError,
};
