//! Registration and user lookup types — `POST /v1/users`, `GET /v1/users/{id}`.

use serde::{Deserialize, Serialize};
use tether::{Profile, User, UserId};

/// Request body for `POST /v1/users`.
///
/// Credentials are handled by the gateway in front of the node; registration
/// here only allocates the identity and its profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Initial visibility of the profile. Defaults to private.
    #[serde(default)]
    pub public: bool,
}

/// Response body for a successful registration (HTTP 201).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterResponse {
    pub user: User,
    pub profile: Profile,
}

/// Compact user reference used in follower/following lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
        }
    }
}

/// Returned by `GET /v1/users/{id}/followers` and `GET /v1/users/{id}/following`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserListResponse {
    pub items: Vec<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_defaults_to_private() {
        let req: RegisterRequest = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert!(!req.public);
        assert!(req.email.is_none());
    }
}
