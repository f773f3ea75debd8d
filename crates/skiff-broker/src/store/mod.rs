// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session store interfaces and backends.
//!
//! This module defines the durable (user, session) → machine mapping and
//! its backend implementations. There is deliberately no in-process cache
//! in front of a backend: multiple broker processes may serve the same
//! user, and affinity correctness depends on reads reflecting the most
//! recent successful write for a key.

pub mod memory;
pub mod postgres;

pub use self::memory::MemorySessionStore;
pub use self::postgres::PostgresSessionStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether retrying the same operation could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Backend(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
        )
    }
}

/// A single (user, session) → machine affinity record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    /// Owning user.
    pub user_id: String,
    /// Browser session, opaque and distinct from the user id.
    pub session_id: String,
    /// Machine currently bound to the session, if any.
    pub machine_id: Option<String>,
    /// The user's volume, if one has been assigned through this session.
    pub volume_id: Option<String>,
    /// When the record was first written.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

/// Durable mapping of (user id, session id) → (machine id, volume id).
///
/// All writes are upserts on the composite key; there is no insert path
/// that could duplicate a pair. Backends must survive process restarts
/// and serve read-after-write per key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the record for one (user, session) pair.
    async fn get(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Insert or update the record for one (user, session) pair.
    ///
    /// A `None` field leaves the stored value untouched on an existing
    /// record; the write never clobbers a previously assigned id.
    async fn upsert(
        &self,
        user_id: &str,
        session_id: &str,
        machine_id: Option<&str>,
        volume_id: Option<&str>,
    ) -> Result<(), StoreError>;

    /// All records for a user, oldest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SessionRecord>, StoreError>;
}
