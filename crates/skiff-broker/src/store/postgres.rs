// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL session store backend.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{SessionRecord, SessionStore, StoreError};

/// Session store backed by the `user_sessions` table.
///
/// The composite primary key makes the single-row upsert the transaction
/// boundary; no coarser locking is needed anywhere in the broker.
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn get(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT user_id, session_id, machine_id, volume_id, created_at, updated_at
            FROM user_sessions
            WHERE user_id = $1 AND session_id = $2
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(
        &self,
        user_id: &str,
        session_id: &str,
        machine_id: Option<&str>,
        volume_id: Option<&str>,
    ) -> Result<(), StoreError> {
        // COALESCE keeps previously assigned ids when the caller passes
        // None; last write wins per field otherwise.
        sqlx::query(
            r#"
            INSERT INTO user_sessions (user_id, session_id, machine_id, volume_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (user_id, session_id) DO UPDATE SET
                machine_id = COALESCE($3, user_sessions.machine_id),
                volume_id = COALESCE($4, user_sessions.volume_id),
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(machine_id)
        .bind(volume_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let records = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT user_id, session_id, machine_id, volume_id, created_at, updated_at
            FROM user_sessions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
