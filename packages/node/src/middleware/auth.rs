//! Actor extraction.
//!
//! Credentials are verified by the gateway in front of the node, which then
//! forwards the authenticated user's id in a trusted header (`x-actor-id` by
//! default, see [`NodeConfig`](crate::config::NodeConfig)). [`CurrentActor`]
//! reads that header and confirms the user is registered here.
//!
//! Returns 401 when the header is absent, is not a positive integer, or names
//! a user this node does not know.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tether::{FollowError, UserId};

use crate::{error::AppError, handlers::AppState};

/// The authenticated caller of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentActor(pub UserId);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        let parsed = actor_from_headers(&parts.headers, &app_state.config.actor_header);
        async move {
            let id = parsed.map_err(FollowError::Unauthorized)?;
            if !app_state.store(app_state.storage.user_exists(id)).await? {
                return Err(
                    FollowError::Unauthorized(format!("user {id} is not registered")).into(),
                );
            }
            Ok(CurrentActor(id))
        }
    }
}

/// Read the actor id from `header`.
pub(crate) fn actor_from_headers(headers: &HeaderMap, header: &str) -> Result<UserId, String> {
    let raw = headers
        .get(header)
        .ok_or_else(|| format!("missing {header} header"))?
        .to_str()
        .map_err(|_| format!("{header} header is not valid text"))?;
    raw.trim()
        .parse::<UserId>()
        .map_err(|_| format!("{header} header must be a positive user id"))
}
