//! Storage abstraction layer for the Tether node.
//!
//! The [`Storage`] trait is the contract between the follow engine / HTTP
//! layer and persistence. It covers the three stores of the service:
//!
//! - **User Directory** — identity allocation and existence checks.
//! - **Profile Store** — the per-user public/private flag and metadata.
//! - **Follow Edge Store** — directed edges keyed by the ordered pair
//!   `(follower, following)`.
//!
//! Storage makes no follow-graph decisions. It does, however, own the atomic
//! primitives the engine relies on: [`Storage::create_edge`] is a conditional
//! insert, and [`Storage::set_edge_status`] / [`Storage::delete_edge`] only
//! act on an edge that is still in the expected status.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, ephemeral nodes |
//! | [`SqliteStorage`] | Production; durable single-file database |
//!
//! [`MemoryStorage`]: memory::MemoryStorage
//! [`SqliteStorage`]: sqlite::SqliteStorage

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use tether::{FollowEdge, FollowStatus, Profile, ProfilePatch, User, UserId};

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested item does not exist, or is not in the expected state.
    #[error("not found")]
    NotFound,

    /// An item with the same key already exists (duplicate username, or an
    /// edge for the same ordered pair).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write would break a storage invariant (e.g. a self-edge).
    #[error("invalid: {0}")]
    Invalid(String),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// The persistence contract for a Tether node.
///
/// All methods are `async` and return `Result<_, StorageError>`. Implementations
/// must be `Send + Sync + 'static` so they can be held in an `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    // --- Users ---------------------------------------------------------------

    /// Register a user and create its profile in one atomic step.
    ///
    /// Returns [`StorageError::Conflict`] if `username` is taken.
    async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        public: bool,
    ) -> Result<(User, Profile), StorageError>;

    /// Retrieve a user by id. Returns `None` if not registered.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Return `true` if a user with `id` is registered.
    async fn user_exists(&self, id: UserId) -> Result<bool, StorageError>;

    /// Retrieve several users at once, ordered by id. Unknown ids are skipped.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, StorageError>;

    /// Every registered user, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    // --- Profiles ------------------------------------------------------------

    /// Retrieve the profile owned by `owner`. Returns `None` if not registered.
    async fn get_profile(&self, owner: UserId) -> Result<Option<Profile>, StorageError>;

    /// Apply a partial update to the profile owned by `owner`.
    ///
    /// Returns [`StorageError::NotFound`] if the user is not registered.
    async fn update_profile(
        &self,
        owner: UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, StorageError>;

    // --- Follow edges --------------------------------------------------------

    /// Look up the edge for an ordered pair by key.
    async fn get_edge(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<FollowEdge>, StorageError>;

    /// Insert a new edge. This is a single conditional insert: it returns
    /// [`StorageError::Conflict`] if an edge already exists for the ordered
    /// pair, and [`StorageError::Invalid`] for a self-edge.
    async fn create_edge(
        &self,
        follower: UserId,
        following: UserId,
        status: FollowStatus,
    ) -> Result<FollowEdge, StorageError>;

    /// Move an edge from status `from` to status `to`.
    ///
    /// Returns [`StorageError::NotFound`] if no edge for the pair currently has
    /// status `from`.
    async fn set_edge_status(
        &self,
        follower: UserId,
        following: UserId,
        from: FollowStatus,
        to: FollowStatus,
    ) -> Result<FollowEdge, StorageError>;

    /// Delete the edge for the pair if it currently has status `expected`.
    ///
    /// Returns [`StorageError::NotFound`] otherwise.
    async fn delete_edge(
        &self,
        follower: UserId,
        following: UserId,
        expected: FollowStatus,
    ) -> Result<(), StorageError>;

    /// Edges pointing at `user` with the given status, ordered by follower id.
    async fn list_followers(
        &self,
        user: UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowEdge>, StorageError>;

    /// Edges leaving `user` with the given status, ordered by following id.
    async fn list_following(
        &self,
        user: UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowEdge>, StorageError>;
}
