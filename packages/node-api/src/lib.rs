//! Request and response types for the Tether node HTTP API.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | POST | `/v1/users` | [`RegisterRequest`] → [`RegisterResponse`] |
//! | GET | `/v1/users/{id}` | → [`tether::User`] |
//! | GET | `/v1/users/{id}/followers` | → [`UserListResponse`] |
//! | GET | `/v1/users/{id}/following` | → [`UserListResponse`] |
//! | GET | `/v1/profiles` | → [`ProfileListResponse`] |
//! | GET | `/v1/profiles/me` | → [`ProfileView`] |
//! | PATCH | `/v1/profiles/me` | [`ProfileUpdateRequest`] → [`ProfileView`] |
//! | GET | `/v1/profiles/{id}` | → [`ProfileView`] |
//! | POST | `/v1/follows` | [`FollowRequest`] → [`OutcomeResponse`] |
//! | DELETE | `/v1/follows/{id}` | → [`OutcomeResponse`] |
//! | GET | `/v1/follow-requests` | → [`PendingRequestsResponse`] |
//! | POST | `/v1/follow-requests` | [`RespondRequest`] → [`OutcomeResponse`] |
//!
//! Errors on every endpoint use [`ErrorResponse`].

pub mod error;
pub mod follow;
pub mod profile;
pub mod user;

pub use error::ErrorResponse;
pub use follow::{
    FollowRequest, OutcomeResponse, PendingRequestEntry, PendingRequestsResponse, RespondRequest,
};
pub use profile::{ProfileListResponse, ProfileUpdateRequest, ProfileView};
pub use user::{RegisterRequest, RegisterResponse, UserListResponse, UserSummary};
