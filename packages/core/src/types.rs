//! Core data types of the follow graph.
//!
//! This module defines the records the service persists and exchanges:
//! [`UserId`], [`User`], [`Profile`], [`FollowStatus`], [`FollowEdge`], and
//! the two closed action enums [`RequestAction`] and [`ResponseAction`] that
//! free-form action strings are parsed into at the request boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a registered user.
///
/// Assigned by storage on registration. Serialises as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a [`UserId`] from its decimal representation.
///
/// Only strictly positive integers are accepted.
impl std::str::FromStr for UserId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(n) if n > 0 => Ok(UserId(n)),
            _ => Err(format!("invalid user id {:?}; expected a positive integer", s)),
        }
    }
}

impl From<i64> for UserId {
    fn from(n: i64) -> Self {
        UserId(n)
    }
}

/// A registered account. Immutable for the purposes of the follow graph
/// beyond its existence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,

    /// Unique handle, validated by [`validate_username`](crate::validate_username).
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Per-user profile. Exactly one exists for every [`User`]; it is created in
/// the same storage operation as the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub owner: UserId,

    /// Public profiles auto-accept every follow request.
    #[serde(default)]
    pub public: bool,

    #[serde(default)]
    pub bio: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// A fresh private profile with empty metadata.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            public: false,
            bio: String::new(),
            avatar_url: None,
        }
    }
}

/// Partial update applied to a [`Profile`] by its owner.
///
/// `None` fields are left unchanged. `avatar_url: Some(None)` clears the
/// avatar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub public: Option<bool>,
    pub bio: Option<String>,
    pub avatar_url: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.public.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }

    /// Apply the patch in place.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(public) = self.public {
            profile.public = public;
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(avatar_url) = &self.avatar_url {
            profile.avatar_url = avatar_url.clone();
        }
    }
}

/// Status of a persisted follow edge.
///
/// There is no terminal "rejected" status: a canceled or unfollowed edge is
/// deleted. Serialises as a lowercase string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    /// Awaiting a decision by the followed user.
    Pending,
    /// The follower is following.
    Accepted,
}

impl std::fmt::Display for FollowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowStatus::Pending => write!(f, "pending"),
            FollowStatus::Accepted => write!(f, "accepted"),
        }
    }
}

impl std::str::FromStr for FollowStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FollowStatus::Pending),
            "accepted" => Ok(FollowStatus::Accepted),
            _ => Err(format!(
                "unknown follow status {:?}; expected one of: pending, accepted",
                s
            )),
        }
    }
}

/// A directed, stateful relationship from `follower` to `following`.
///
/// Keyed by the ordered pair; at most one edge exists per pair and
/// `follower != following` always holds for persisted edges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowEdge {
    pub follower: UserId,
    pub following: UserId,
    pub status: FollowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowEdge {
    pub fn new(follower: UserId, following: UserId, status: FollowStatus) -> Self {
        let now = Utc::now();
        Self {
            follower,
            following,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Optional action attached to a follow request by the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Withdraw a pending request.
    Cancel,
}

impl RequestAction {
    /// Parse an optional wire action. Absent and empty strings mean "no
    /// action"; matching is case-insensitive.
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, String> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

impl std::str::FromStr for RequestAction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("cancel") {
            Ok(RequestAction::Cancel)
        } else {
            Err(format!("unknown follow request action {:?}; expected: cancel", s))
        }
    }
}

/// Decision the followed user takes on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    Accept,
    Cancel,
}

impl std::str::FromStr for ResponseAction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("accept") {
            Ok(ResponseAction::Accept)
        } else if s.eq_ignore_ascii_case("cancel") {
            Ok(ResponseAction::Cancel)
        } else {
            Err(format!(
                "unknown response action {:?}; expected one of: accept, cancel",
                s
            ))
        }
    }
}
