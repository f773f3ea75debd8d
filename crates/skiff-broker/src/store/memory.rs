// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory session store for tests and embedded development.
//!
//! Keeps the exact upsert semantics of the PostgreSQL backend (composite
//! key, COALESCE-style partial updates) without durability. Not for
//! production: state dies with the process and is invisible to other
//! broker processes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{SessionRecord, SessionStore, StoreError};

/// Session store held in a process-local map.
#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<(String, String), SessionRecord>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(user_id.to_string(), session_id.to_string()))
            .cloned())
    }

    async fn upsert(
        &self,
        user_id: &str,
        session_id: &str,
        machine_id: Option<&str>,
        volume_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let key = (user_id.to_string(), session_id.to_string());
        let now = Utc::now();

        match records.get_mut(&key) {
            Some(record) => {
                if let Some(machine_id) = machine_id {
                    record.machine_id = Some(machine_id.to_string());
                }
                if let Some(volume_id) = volume_id {
                    record.volume_id = Some(volume_id.to_string());
                }
                record.updated_at = now;
            }
            None => {
                records.insert(
                    key,
                    SessionRecord {
                        user_id: user_id.to_string(),
                        session_id: session_id.to_string(),
                        machine_id: machine_id.map(str::to_string),
                        volume_id: volume_id.map(str::to_string),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }

        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let records = self.records.lock().await;
        let mut matching: Vec<SessionRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }
}
