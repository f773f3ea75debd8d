// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Skiff Machines Client
//!
//! Typed client for the Fly Machines control plane, covering the machine
//! and volume lifecycle that skiff workspaces are built on.
//!
//! The client is deliberately thin: one method per lifecycle verb, typed
//! request/response bodies, bearer auth, bounded timeouts, and no retries.
//! `get_machine` reports an unknown id as `Ok(None)` so callers can treat
//! absence as a normal outcome, while API-level rejections carry the raw
//! response body for diagnostics.
//!
//! # Example
//!
//! ```no_run
//! use skiff_machines::{MachinesClient, MachinesConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MachinesClient::new(MachinesConfig::new("skiff-runtime", "fly_tok"))?;
//!
//! if let Some(machine) = client.get_machine("d8912345").await? {
//!     println!("machine {} is {}", machine.id, machine.state.as_str());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::MachinesClient;
pub use config::{DEFAULT_API_BASE, MachinesConfig};
pub use error::{MachinesError, Result};
pub use types::{
    CreateMachineRequest, CreateVolumeRequest, GuestConfig, Machine, MachineConfig, MachineState,
    MountConfig, PortConfig, RestartPolicy, ServiceConfig, Volume,
};
