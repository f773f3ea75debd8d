// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Skiff Broker - Session-to-Machine Affinity
//!
//! This crate provisions and reuses ephemeral workspace machines on behalf
//! of authenticated users. Each user gets exactly one durable storage
//! volume; each browser session maps to the machine currently serving it,
//! and concurrently open sessions of one user share a single running
//! machine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Request Handlers (external)                    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │ resolve(user_id, session_id)
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      skiff-broker (This Crate)                       │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐   │
//! │  │   Affinity   │  │    Volume    │  │  Capability Token Issuer │   │
//! │  │   Resolver   │  │  Provisioner │  │        (HS256 JWT)       │   │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────────────────┘   │
//! │         │                 │                                          │
//! │         ▼                 ▼                                          │
//! │  ┌─────────────────────────────┐   ┌──────────────────────────────┐ │
//! │  │        Session Store        │   │        skiff-machines        │ │
//! │  │  (user, session) → machine  │   │   Fly Machines control plane │ │
//! │  └──────────────┬──────────────┘   └──────────────┬───────────────┘ │
//! └─────────────────┼─────────────────────────────────┼─────────────────┘
//!                   ▼                                 ▼
//!            ┌────────────┐                  ┌─────────────────┐
//!            │ PostgreSQL │                  │ api.machines.dev │
//!            └────────────┘                  └─────────────────┘
//! ```
//!
//! # Resolution chain
//!
//! `AffinityResolver::resolve` walks three steps, each short-circuiting:
//!
//! | Step | Action |
//! |------|--------|
//! | 1 | Reuse the session's own machine if it is `started` |
//! | 2 | Adopt any other `started` machine of the same user |
//! | 3 | Provision a fresh machine with the user's volume mounted |
//!
//! Machine probes that fail (unknown id, API rejection, timeout) are
//! treated as "nothing reusable there" and fall through; resolution only
//! fails on the write path: volume creation, machine creation, or the
//! session store.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `SKIFF_DATABASE_URL` | Yes* | - | PostgreSQL connection string |
//! | `DATABASE_URL` | Yes* | - | Fallback if above not set |
//! | `SKIFF_TOKEN_SECRET` | Yes | - | HS256 secret for capability tokens |
//! | `FLY_API_TOKEN` | Yes | - | Machines control plane token |
//! | `SKIFF_FLY_APP` | No | `skiff-runtime` | Fly app owning the machines |
//! | `SKIFF_RUNTIME_DOMAIN` | No | `skiff-runtime.fly.dev` | Workspace URL domain |
//! | `SKIFF_WORKSPACE_IMAGE` | No | `registry.fly.io/skiff-workspace:latest` | Workspace image |
//! | `SKIFF_REGION` | No | `sjc` | Volume placement region |
//! | `SKIFF_VOLUME_SIZE_GB` | No | `10` | Per-user volume size |
//! | `SKIFF_WORKSPACE_PORT` | No | `10000` | Workload port inside the machine |
//! | `SKIFF_WORKSPACE_DIR` | No | `/workspace` | Volume mount path |
//!
//! # Modules
//!
//! - [`config`]: Broker configuration from environment variables
//! - [`error`]: Error types surfaced to request handlers
//! - [`migrations`]: PostgreSQL schema for the session store
//! - [`resolver`]: The session-to-machine resolution chain
//! - [`retry`]: Bounded backoff for transient store failures
//! - [`store`]: Durable session mapping, PostgreSQL and in-memory backends
//! - [`token`]: Capability token issuing
//! - [`volumes`]: Per-user volume provisioning

#![deny(missing_docs)]

/// Broker configuration loaded from environment variables.
pub mod config;

/// Error types for broker operations.
pub mod error;

/// PostgreSQL schema for the session store.
pub mod migrations;

/// Session-to-machine affinity resolution.
pub mod resolver;

/// Bounded retry with exponential backoff.
pub mod retry;

/// Durable session mapping and its backends.
pub mod store;

/// Capability token issuing.
pub mod token;

/// Per-user volume provisioning.
pub mod volumes;

pub use config::Config;
pub use error::{BrokerError, Result};
pub use resolver::{AffinityResolver, ResolvedMachine};
pub use store::{
    MemorySessionStore, PostgresSessionStore, SessionRecord, SessionStore, StoreError,
};
pub use token::{CapabilityClaims, CapabilityTokenIssuer, TOKEN_TTL_SECS};
pub use volumes::VolumeProvisioner;
