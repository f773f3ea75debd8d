// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-user volume provisioning.

use std::sync::Arc;

use chrono::Utc;
use skiff_machines::{CreateVolumeRequest, MachinesClient};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{BrokerError, Result};
use crate::retry::with_backoff;
use crate::store::{SessionStore, StoreError};

/// Ensures exactly one durable volume exists per user.
///
/// The volume is created lazily on first machine provisioning and reused
/// for the lifetime of the account; nothing in the broker ever destroys
/// one. One-volume-per-user is an emergent invariant: this is the only
/// component that creates volumes, and it always consults the session
/// records first.
pub struct VolumeProvisioner {
    store: Arc<dyn SessionStore>,
    machines: Arc<MachinesClient>,
    size_gb: u32,
    region: String,
}

impl VolumeProvisioner {
    /// Create a provisioner over the given store and control plane client.
    pub fn new(store: Arc<dyn SessionStore>, machines: Arc<MachinesClient>, config: &Config) -> Self {
        Self {
            store,
            machines,
            size_gb: config.volume_size_gb,
            region: config.region.clone(),
        }
    }

    /// Return the user's volume id, creating the volume if none exists yet.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create(&self, user_id: &str) -> Result<String> {
        let sessions = with_backoff("volume scan", StoreError::is_transient, || {
            self.store.list_by_user(user_id)
        })
        .await?;

        // Volumes are not multiplexed across users, so any prior mapping
        // that carries one is correct; take the first.
        if let Some(volume_id) = sessions.into_iter().find_map(|s| s.volume_id) {
            debug!(volume_id = %volume_id, "Reusing existing volume");
            return Ok(volume_id);
        }

        // The timestamp in the name is for traceability, not uniqueness.
        let request = CreateVolumeRequest {
            name: format!("user-{}-{}", user_id, Utc::now().timestamp_millis()),
            size_gb: self.size_gb,
            region: self.region.clone(),
        };

        let volume = self
            .machines
            .create_volume(&request)
            .await
            .map_err(BrokerError::VolumeProvisioning)?;

        info!(volume_id = %volume.id, "Created volume");
        Ok(volume.id)
    }
}
