// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for skiff-machines.

use thiserror::Error;

/// Result type using MachinesError.
pub type Result<T> = std::result::Result<T, MachinesError>;

/// Errors that can occur when talking to the Machines control plane.
#[derive(Debug, Error)]
pub enum MachinesError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The API rejected the request with a non-success status.
    ///
    /// The raw response body is attached so callers can log the control
    /// plane's own diagnostics.
    #[error("machines API error ({status}): {body}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Network-level failure: connect, timeout, TLS, or body read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Machine does not exist (404 on a lifecycle verb).
    ///
    /// `get_machine` and `list_machines` express absence as `None`/empty
    /// instead; this variant is only produced by start/stop/destroy.
    #[error("machine not found: {0}")]
    MachineNotFound(String),
}

impl MachinesError {
    /// Whether retrying the identical request could plausibly succeed.
    ///
    /// Only network-level trouble qualifies. API rejections are
    /// deterministic, and absence is a result, not a fault.
    pub fn is_transient(&self) -> bool {
        match self {
            MachinesError::Transport(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
