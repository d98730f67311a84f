//! Profile types — `GET /v1/profiles`, `GET/PATCH /v1/profiles/me`,
//! `GET /v1/profiles/{id}`.

use serde::{Deserialize, Deserializer, Serialize};
use tether::{ProfilePatch, UserId};

use crate::user::UserSummary;

/// A profile as shown to clients, with its accepted follow lists.
///
/// # Example
///
/// ```json
/// {
///   "user": 7,
///   "username": "alice",
///   "bio": "",
///   "public": false,
///   "followers": [{ "id": 9, "username": "bob" }],
///   "following": []
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileView {
    pub user: UserId,
    pub username: String,
    pub bio: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    pub public: bool,

    /// Users with an accepted edge towards this user.
    pub followers: Vec<UserSummary>,

    /// Users this user has an accepted edge towards.
    pub following: Vec<UserSummary>,
}

/// Returned by `GET /v1/profiles`: every profile except the caller's, ordered
/// by user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileListResponse {
    pub items: Vec<ProfileView>,
}

/// Request body for `PATCH /v1/profiles/me`.
///
/// Omitted fields are left unchanged; `"avatar_url": null` clears the avatar.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<Option<String>>,
}

impl From<ProfileUpdateRequest> for ProfilePatch {
    fn from(req: ProfileUpdateRequest) -> Self {
        ProfilePatch {
            public: req.public,
            bio: req.bio,
            avatar_url: req.avatar_url,
        }
    }
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Some)
}
