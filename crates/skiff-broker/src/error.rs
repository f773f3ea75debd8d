// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for skiff-broker.

use thiserror::Error;

use skiff_machines::MachinesError;

use crate::store::StoreError;

/// Broker errors surfaced to request handlers.
///
/// Read failures inside the reuse search never appear here; they are
/// swallowed and the resolver falls through to fresh provisioning. Only
/// the write path (volume creation, machine creation, session upserts)
/// can fail a resolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrokerError {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The durable session store failed. Never degraded silently;
    /// affinity correctness depends on the store.
    #[error("Session store unavailable: {0}")]
    Store(#[from] StoreError),

    /// Creating the user's volume failed. There is no volume-less
    /// fallback: workspaces are defined to carry persistent storage.
    #[error("Volume provisioning failed: {0}")]
    VolumeProvisioning(#[source] MachinesError),

    /// Creating a machine failed.
    #[error("Machine creation failed: {0}")]
    MachineCreation(#[source] MachinesError),

    /// Signing a capability token failed.
    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Result type using BrokerError.
pub type Result<T> = std::result::Result<T, BrokerError>;
