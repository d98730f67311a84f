//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral nodes.
//!
//! Every write takes the write lock for its whole check-then-mutate sequence,
//! which is what makes [`Storage::create_edge`] a conditional insert here.
//! Edges live in a `HashMap` keyed by the ordered pair, so single-edge
//! lookups never scan.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tether::{FollowEdge, FollowStatus, Profile, ProfilePatch, User, UserId};

use super::{Storage, StorageError};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct Inner {
    next_user_id: i64,
    /// Ordered by id so listings come out sorted without a second pass.
    users: BTreeMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    profiles: HashMap<UserId, Profile>,
    edges: HashMap<(UserId, UserId), FollowEdge>,
}

impl Inner {
    fn new() -> Self {
        Self {
            next_user_id: 1,
            users: BTreeMap::new(),
            usernames: HashMap::new(),
            profiles: HashMap::new(),
            edges: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`Storage`].
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored edges, in any status. Used by tests.
    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for MemoryStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        public: bool,
    ) -> Result<(User, Profile), StorageError> {
        let mut inner = self.write();
        if inner.usernames.contains_key(username) {
            return Err(StorageError::Conflict(format!(
                "username {username} is already taken"
            )));
        }

        let id = UserId(inner.next_user_id);
        inner.next_user_id += 1;

        let user = User {
            id,
            username: username.to_string(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };
        let mut profile = Profile::new(id);
        profile.public = public;

        inner.usernames.insert(user.username.clone(), id);
        inner.users.insert(id, user.clone());
        inner.profiles.insert(id, profile.clone());
        Ok((user, profile))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, StorageError> {
        Ok(self.read().users.contains_key(&id))
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, StorageError> {
        let inner = self.read();
        let mut users: Vec<User> = ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect();
        users.sort_by_key(|u| u.id);
        users.dedup_by_key(|u| u.id);
        Ok(users)
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.read().users.values().cloned().collect())
    }

    // --- Profiles ------------------------------------------------------------

    async fn get_profile(&self, owner: UserId) -> Result<Option<Profile>, StorageError> {
        Ok(self.read().profiles.get(&owner).cloned())
    }

    async fn update_profile(
        &self,
        owner: UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, StorageError> {
        let mut inner = self.write();
        let profile = inner
            .profiles
            .get_mut(&owner)
            .ok_or(StorageError::NotFound)?;
        patch.apply(profile);
        Ok(profile.clone())
    }

    // --- Follow edges --------------------------------------------------------

    async fn get_edge(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<FollowEdge>, StorageError> {
        Ok(self.read().edges.get(&(follower, following)).cloned())
    }

    async fn create_edge(
        &self,
        follower: UserId,
        following: UserId,
        status: FollowStatus,
    ) -> Result<FollowEdge, StorageError> {
        if follower == following {
            return Err(StorageError::Invalid(format!(
                "user {follower} cannot follow itself"
            )));
        }

        let mut inner = self.write();
        if inner.edges.contains_key(&(follower, following)) {
            return Err(StorageError::Conflict(format!(
                "edge {follower} -> {following} already exists"
            )));
        }
        let edge = FollowEdge::new(follower, following, status);
        inner.edges.insert((follower, following), edge.clone());
        Ok(edge)
    }

    async fn set_edge_status(
        &self,
        follower: UserId,
        following: UserId,
        from: FollowStatus,
        to: FollowStatus,
    ) -> Result<FollowEdge, StorageError> {
        let mut inner = self.write();
        match inner.edges.get_mut(&(follower, following)) {
            Some(edge) if edge.status == from => {
                edge.status = to;
                edge.updated_at = Utc::now();
                Ok(edge.clone())
            }
            _ => Err(StorageError::NotFound),
        }
    }

    async fn delete_edge(
        &self,
        follower: UserId,
        following: UserId,
        expected: FollowStatus,
    ) -> Result<(), StorageError> {
        let mut inner = self.write();
        let key = (follower, following);
        if !inner.edges.get(&key).is_some_and(|e| e.status == expected) {
            return Err(StorageError::NotFound);
        }
        inner.edges.remove(&key);
        Ok(())
    }

    async fn list_followers(
        &self,
        user: UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowEdge>, StorageError> {
        let inner = self.read();
        let mut result: Vec<FollowEdge> = inner
            .edges
            .values()
            .filter(|e| e.following == user && e.status == status)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.follower);
        Ok(result)
    }

    async fn list_following(
        &self,
        user: UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowEdge>, StorageError> {
        let inner = self.read();
        let mut result: Vec<FollowEdge> = inner
            .edges
            .values()
            .filter(|e| e.follower == user && e.status == status)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.following);
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
