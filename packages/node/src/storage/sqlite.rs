//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! - `users` — registered identities; `username` is unique.
//! - `profiles` — one row per user, inserted in the same transaction.
//! - `follow_edges` — one row per ordered `(follower, following)` pair. The
//!   composite primary key is what turns `INSERT` into the conditional insert
//!   the engine relies on.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tether::{FollowEdge, FollowStatus, Profile, ProfilePatch, User, UserId};

use super::{Storage, StorageError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    owner       INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    public      INTEGER NOT NULL DEFAULT 0,
    bio         TEXT NOT NULL DEFAULT '',
    avatar_url  TEXT
);

CREATE TABLE IF NOT EXISTS follow_edges (
    follower    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    following   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status      TEXT NOT NULL CHECK (status IN ('pending', 'accepted')),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (follower, following),
    CHECK (follower <> following)
);
CREATE INDEX IF NOT EXISTS idx_follow_edges_following ON follow_edges(following, status);
";

const EDGE_COLUMNS: &str = "follower, following, status, created_at, updated_at";

// ---------------------------------------------------------------------------
// SqliteStorage
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`Storage`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StorageError::Internal("connection mutex poisoned".into()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Error and row conversions
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

/// Map a write error, turning key violations into [`StorageError::Conflict`].
fn map_write_err(e: rusqlite::Error, what: String) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StorageError::Conflict(what)
        }
        _ => map_err(e),
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Internal(format!("bad timestamp {s:?}: {e}")))
}

fn parse_status(s: &str) -> Result<FollowStatus, StorageError> {
    s.parse().map_err(StorageError::Internal)
}

/// Raw edge columns as read from a row; converted after the row borrow ends.
type EdgeRow = (i64, i64, String, String, String);

fn read_edge_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn edge_from_row(r: EdgeRow) -> Result<FollowEdge, StorageError> {
    let (follower, following, status, created_at, updated_at) = r;
    Ok(FollowEdge {
        follower: UserId(follower),
        following: UserId(following),
        status: parse_status(&status)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

type UserRow = (i64, String, Option<String>, String);

fn user_from_row(r: UserRow) -> Result<User, StorageError> {
    let (id, username, email, created_at) = r;
    Ok(User {
        id: UserId(id),
        username,
        email,
        created_at: parse_ts(&created_at)?,
    })
}

fn select_edge(
    conn: &Connection,
    follower: i64,
    following: i64,
) -> Result<Option<FollowEdge>, StorageError> {
    conn.query_row(
        &format!("SELECT {EDGE_COLUMNS} FROM follow_edges WHERE follower = ?1 AND following = ?2"),
        params![follower, following],
        read_edge_row,
    )
    .optional()
    .map_err(map_err)?
    .map(edge_from_row)
    .transpose()
}

fn select_profile(conn: &Connection, owner: i64) -> Result<Option<Profile>, StorageError> {
    conn.query_row(
        "SELECT owner, public, bio, avatar_url FROM profiles WHERE owner = ?1",
        params![owner],
        |row| {
            Ok(Profile {
                owner: UserId(row.get(0)?),
                public: row.get(1)?,
                bio: row.get(2)?,
                avatar_url: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(map_err)
}

fn list_edges(
    conn: &Connection,
    key_column: &str,
    order_column: &str,
    user: i64,
    status: FollowStatus,
) -> Result<Vec<FollowEdge>, StorageError> {
    let sql = format!(
        "SELECT {EDGE_COLUMNS} FROM follow_edges
         WHERE {key_column} = ?1 AND status = ?2
         ORDER BY {order_column} ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_err)?;
    let rows = stmt
        .query_map(params![user, status.to_string()], read_edge_row)
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    rows.into_iter().map(edge_from_row).collect()
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for SqliteStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        public: bool,
    ) -> Result<(User, Profile), StorageError> {
        let username = username.to_string();
        let email = email.map(str::to_string);

        self.with_conn(move |conn| {
            let created_at = Utc::now();
            let tx = conn.transaction().map_err(map_err)?;

            tx.execute(
                "INSERT INTO users (username, email, created_at) VALUES (?1, ?2, ?3)",
                params![username, email, created_at.to_rfc3339()],
            )
            .map_err(|e| map_write_err(e, format!("username {username} is already taken")))?;
            let id = tx.last_insert_rowid();

            tx.execute(
                "INSERT INTO profiles (owner, public) VALUES (?1, ?2)",
                params![id, public],
            )
            .map_err(map_err)?;
            tx.commit().map_err(map_err)?;

            let user = User {
                id: UserId(id),
                username,
                email,
                created_at,
            };
            let mut profile = Profile::new(user.id);
            profile.public = public;
            Ok((user, profile))
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, username, email, created_at FROM users WHERE id = ?1",
                params![id.get()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(map_err)?
            .map(user_from_row)
            .transpose()
        })
        .await
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, StorageError> {
        self.with_conn(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM users WHERE id = ?1",
                    params![id.get()],
                    |row| row.get(0),
                )
                .map_err(map_err)?;
            Ok(count > 0)
        })
        .await
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        self.with_conn(move |conn| {
            let placeholders: Vec<&str> = ids.iter().map(|_| "?").collect();
            let sql = format!(
                "SELECT id, username, email, created_at FROM users
                 WHERE id IN ({}) ORDER BY id ASC",
                placeholders.join(",")
            );
            let mut stmt = conn.prepare(&sql).map_err(map_err)?;
            let rows: Vec<UserRow> = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            rows.into_iter().map(user_from_row).collect()
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, email, created_at FROM users ORDER BY id ASC")
                .map_err(map_err)?;
            let rows: Vec<UserRow> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            rows.into_iter().map(user_from_row).collect()
        })
        .await
    }

    // --- Profiles ------------------------------------------------------------

    async fn get_profile(&self, owner: UserId) -> Result<Option<Profile>, StorageError> {
        self.with_conn(move |conn| select_profile(conn, owner.get())).await
    }

    async fn update_profile(
        &self,
        owner: UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, StorageError> {
        let patch = patch.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let mut profile = select_profile(&tx, owner.get())?.ok_or(StorageError::NotFound)?;
            patch.apply(&mut profile);
            tx.execute(
                "UPDATE profiles SET public = ?2, bio = ?3, avatar_url = ?4 WHERE owner = ?1",
                params![owner.get(), profile.public, profile.bio, profile.avatar_url],
            )
            .map_err(map_err)?;
            tx.commit().map_err(map_err)?;
            Ok(profile)
        })
        .await
    }

    // --- Follow edges --------------------------------------------------------

    async fn get_edge(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<FollowEdge>, StorageError> {
        self.with_conn(move |conn| select_edge(conn, follower.get(), following.get()))
            .await
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

        self.with_conn(move |conn| {
            let edge = FollowEdge::new(follower, following, status);
            conn.execute(
                &format!("INSERT INTO follow_edges ({EDGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                params![
                    follower.get(),
                    following.get(),
                    status.to_string(),
                    edge.created_at.to_rfc3339(),
                    edge.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| map_write_err(e, format!("edge {follower} -> {following} already exists")))?;
            Ok(edge)
        })
        .await
    }

    async fn set_edge_status(
        &self,
        follower: UserId,
        following: UserId,
        from: FollowStatus,
        to: FollowStatus,
    ) -> Result<FollowEdge, StorageError> {
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE follow_edges SET status = ?4, updated_at = ?5
                     WHERE follower = ?1 AND following = ?2 AND status = ?3",
                    params![
                        follower.get(),
                        following.get(),
                        from.to_string(),
                        to.to_string(),
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(map_err)?;
            if changed == 0 {
                return Err(StorageError::NotFound);
            }
            select_edge(conn, follower.get(), following.get())?.ok_or(StorageError::NotFound)
        })
        .await
    }

    async fn delete_edge(
        &self,
        follower: UserId,
        following: UserId,
        expected: FollowStatus,
    ) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "DELETE FROM follow_edges
                     WHERE follower = ?1 AND following = ?2 AND status = ?3",
                    params![follower.get(), following.get(), expected.to_string()],
                )
                .map_err(map_err)?;
            if changed == 0 {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn list_followers(
        &self,
        user: UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowEdge>, StorageError> {
        self.with_conn(move |conn| list_edges(conn, "following", "follower", user.get(), status))
            .await
    }

    async fn list_following(
        &self,
        user: UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowEdge>, StorageError> {
        self.with_conn(move |conn| list_edges(conn, "follower", "following", user.get(), status))
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
