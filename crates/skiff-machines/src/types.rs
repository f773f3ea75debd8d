// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire types for the Machines control plane.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a machine, as reported by the control plane.
///
/// The control plane is the authoritative source for this value; it is
/// observed via polling and never inferred locally. A `Destroyed` machine
/// can never come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineState {
    /// Machine record exists but has never started.
    Created,
    /// Boot in progress.
    Starting,
    /// Up and serving.
    Started,
    /// Shutdown in progress.
    Stopping,
    /// Halted, restartable.
    Stopped,
    /// Being replaced by the platform.
    Replacing,
    /// Teardown in progress.
    Destroying,
    /// Gone for good.
    Destroyed,
}

impl MachineState {
    /// Whether the machine is up and can serve traffic.
    pub fn is_started(&self) -> bool {
        matches!(self, MachineState::Started)
    }

    /// Whether the machine is on its way out or already gone.
    pub fn is_gone(&self) -> bool {
        matches!(self, MachineState::Destroying | MachineState::Destroyed)
    }

    /// Lowercase wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Created => "created",
            MachineState::Starting => "starting",
            MachineState::Started => "started",
            MachineState::Stopping => "stopping",
            MachineState::Stopped => "stopped",
            MachineState::Replacing => "replacing",
            MachineState::Destroying => "destroying",
            MachineState::Destroyed => "destroyed",
        }
    }
}

/// A machine as returned by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Opaque machine id assigned by the API.
    pub id: String,
    /// Name supplied at creation time.
    pub name: String,
    /// Current lifecycle state.
    pub state: MachineState,
    /// Region the machine was placed in.
    #[serde(default)]
    pub region: String,
    /// Private IPv6 address inside the app's network.
    #[serde(default)]
    pub private_ip: Option<String>,
    /// When the machine was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the machine record last changed.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A storage volume as returned by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    /// Opaque volume id assigned by the API.
    pub id: String,
    /// Name supplied at creation time.
    pub name: String,
    /// Volume state (e.g. "created").
    #[serde(default)]
    pub state: String,
    /// Provisioned size in gigabytes.
    pub size_gb: u32,
    /// Region the volume lives in.
    #[serde(default)]
    pub region: String,
    /// Whether the volume is encrypted at rest.
    #[serde(default)]
    pub encrypted: bool,
    /// When the volume was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Restart policy for a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Policy name ("no", "always", "on-failure").
    pub policy: String,
}

impl RestartPolicy {
    /// Never restart; the machine is single-use.
    pub fn no() -> Self {
        Self {
            policy: "no".to_string(),
        }
    }
}

/// CPU/memory sizing for a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestConfig {
    /// CPU kind ("shared" or "performance").
    pub cpu_kind: String,
    /// Number of CPUs.
    pub cpus: u32,
    /// Memory in megabytes.
    pub memory_mb: u32,
}

/// A volume mount inside a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Volume id to mount.
    pub volume: String,
    /// Mount path inside the machine.
    pub path: String,
}

/// A single exposed port on a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    /// External port number.
    pub port: u16,
    /// Connection handlers ("tls", "http").
    pub handlers: Vec<String>,
}

/// A network service exposed by a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Transport protocol ("tcp").
    pub protocol: String,
    /// Port the workload listens on inside the machine.
    pub internal_port: u16,
    /// Externally exposed ports.
    pub ports: Vec<PortConfig>,
}

/// Machine configuration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Container image reference.
    pub image: String,
    /// Restart policy.
    pub restart: RestartPolicy,
    /// Destroy the machine when the workload exits.
    pub auto_destroy: bool,
    /// CPU/memory sizing.
    pub guest: GuestConfig,
    /// Environment variables passed to the workload.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Volume mounts.
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
    /// Exposed network services.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// Request body for machine creation.
///
/// `name` doubles as the idempotency key: callers mint a fresh one per
/// create attempt so accidental duplicates stay distinguishable instead of
/// being silently merged by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMachineRequest {
    /// Unique machine name.
    pub name: String,
    /// Machine configuration.
    pub config: MachineConfig,
}

/// Request body for volume creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVolumeRequest {
    /// Volume name (traceability, not uniqueness).
    pub name: String,
    /// Size in gigabytes.
    pub size_gb: u32,
    /// Region to place the volume in.
    pub region: String,
}
