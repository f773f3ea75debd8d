// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session-to-machine affinity resolution.
//!
//! The orchestration core of the broker. Given a user and a session,
//! [`AffinityResolver::resolve`] returns a healthy machine URL, reusing a
//! running machine where possible and provisioning a fresh one where
//! necessary, and always leaves the session store updated before
//! returning.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use skiff_machines::{
    CreateMachineRequest, GuestConfig, Machine, MachineConfig, MachineState, MachinesClient,
    MountConfig, PortConfig, RestartPolicy, ServiceConfig,
};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{BrokerError, Result};
use crate::retry::with_backoff;
use crate::store::{SessionStore, StoreError};
use crate::volumes::VolumeProvisioner;

/// A machine resolved for a session.
#[derive(Debug, Clone)]
pub struct ResolvedMachine {
    /// Machine id as assigned by the control plane.
    pub machine_id: String,
    /// HTTPS URL the machine is reachable under.
    pub url: String,
    /// Observed (or, for a fresh machine, assumed) lifecycle state.
    pub state: MachineState,
}

/// Resolves `(user, session)` pairs to running machines.
///
/// Two simultaneous first-time resolutions for the same pair can both
/// observe "no machine yet" and both create one; the second upsert wins
/// and the surplus machine runs unreferenced. That race is accepted: it
/// can only happen on the very first request of a brand-new session, and
/// a distributed lock around creation would trade it for a worse failure
/// mode (lock holder crash).
pub struct AffinityResolver {
    store: Arc<dyn SessionStore>,
    machines: Arc<MachinesClient>,
    volumes: VolumeProvisioner,
    config: Config,
}

impl AffinityResolver {
    /// Create a resolver over the given store and control plane client.
    pub fn new(store: Arc<dyn SessionStore>, machines: Arc<MachinesClient>, config: Config) -> Self {
        let volumes = VolumeProvisioner::new(store.clone(), machines.clone(), &config);
        Self {
            store,
            machines,
            volumes,
            config,
        }
    }

    /// Resolve the machine serving `(user_id, session_id)`.
    ///
    /// Resolution order, each step short-circuiting on success:
    ///
    /// 1. the session's own mapping, if its machine is `started`;
    /// 2. any other `started` machine of the same user, adopted into this
    ///    session's mapping;
    /// 3. a freshly created machine with the user's volume mounted.
    ///
    /// Machine probe failures during 1–2 (absence, API rejection, timeout)
    /// mean "no reusable machine there" and fall through; only creation
    /// and session store access can fail the call.
    #[instrument(skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn resolve(&self, user_id: &str, session_id: &str) -> Result<ResolvedMachine> {
        // Step 1: exact-session reuse. The hot path for all but the first
        // request of a session.
        let mapping = with_backoff("session lookup", StoreError::is_transient, || {
            self.store.get(user_id, session_id)
        })
        .await?;

        let stale_machine_id = match mapping.and_then(|record| record.machine_id) {
            Some(machine_id) => {
                if let Some(machine) = self.probe(&machine_id).await {
                    if machine.state.is_started() {
                        debug!(machine_id = %machine.id, "Reusing session machine");
                        return Ok(self.resolved(machine.id, machine.state));
                    }
                    debug!(
                        machine_id = %machine.id,
                        state = machine.state.as_str(),
                        "Mapped machine not started"
                    );
                }
                // The mapping references a dead or unusable machine; it is
                // stale from here on and excluded from the candidate scan.
                Some(machine_id)
            }
            None => None,
        };

        // Step 2: cross-session reuse. One live machine per user, shared
        // across that user's concurrently open sessions.
        let sessions = with_backoff("session scan", StoreError::is_transient, || {
            self.store.list_by_user(user_id)
        })
        .await?;

        for record in &sessions {
            let Some(machine_id) = record.machine_id.as_deref() else {
                continue;
            };
            if stale_machine_id.as_deref() == Some(machine_id) {
                continue;
            }
            let Some(machine) = self.probe(machine_id).await else {
                continue;
            };
            if !machine.state.is_started() {
                debug!(
                    machine_id,
                    state = machine.state.as_str(),
                    "Skipping candidate machine"
                );
                continue;
            }

            // Adopt the machine into this session's mapping so the next
            // lookup takes the hot path. The source record's volume rides
            // along to keep the new mapping self-contained.
            self.upsert(
                user_id,
                session_id,
                Some(machine_id),
                record.volume_id.as_deref(),
            )
            .await?;

            info!(machine_id, "Adopted running machine from another session");
            return Ok(self.resolved(machine_id.to_string(), machine.state));
        }

        // Step 3: fresh provisioning.
        self.provision(user_id, session_id).await
    }

    /// Create a machine for the user and bind it to the session.
    async fn provision(&self, user_id: &str, session_id: &str) -> Result<ResolvedMachine> {
        let volume_id = self.volumes.get_or_create(user_id).await?;

        // A fresh name per attempt keeps accidental duplicates
        // distinguishable; the control plane never merges two creates.
        let request = self.machine_request(user_id, &volume_id);
        let machine = self
            .machines
            .create_machine(&request)
            .await
            .map_err(BrokerError::MachineCreation)?;

        self.upsert(user_id, session_id, Some(&machine.id), Some(&volume_id))
            .await?;

        info!(
            machine_id = %machine.id,
            volume_id = %volume_id,
            "Provisioned machine for session"
        );

        // The machine launches in start-immediately mode; report it as
        // started without a poll-to-ready loop so resolution latency stays
        // bounded. Callers needing strict readiness poll get_machine.
        Ok(self.resolved(machine.id, MachineState::Started))
    }

    /// Fetch a machine's state, treating every failure as absence.
    async fn probe(&self, machine_id: &str) -> Option<Machine> {
        match self.machines.get_machine(machine_id).await {
            Ok(found) => found,
            Err(err) => {
                debug!(machine_id, %err, "Machine probe failed");
                None
            }
        }
    }

    async fn upsert(
        &self,
        user_id: &str,
        session_id: &str,
        machine_id: Option<&str>,
        volume_id: Option<&str>,
    ) -> Result<()> {
        with_backoff("session upsert", StoreError::is_transient, || {
            self.store.upsert(user_id, session_id, machine_id, volume_id)
        })
        .await?;
        Ok(())
    }

    fn resolved(&self, machine_id: String, state: MachineState) -> ResolvedMachine {
        let url = format!("https://{}.{}", machine_id, self.config.runtime_domain);
        ResolvedMachine {
            machine_id,
            url,
            state,
        }
    }

    fn machine_request(&self, user_id: &str, volume_id: &str) -> CreateMachineRequest {
        let env = HashMap::from([
            ("PORT".to_string(), self.config.internal_port.to_string()),
            (
                "WORKSPACE_DIR".to_string(),
                self.config.workspace_dir.clone(),
            ),
            ("DEPLOYMENT_MODE".to_string(), "ephemeral".to_string()),
        ]);

        CreateMachineRequest {
            name: format!("ephemeral-{}-{}", user_id, Utc::now().timestamp_millis()),
            config: MachineConfig {
                image: self.config.image.clone(),
                restart: RestartPolicy::no(),
                auto_destroy: true,
                guest: GuestConfig {
                    cpu_kind: self.config.cpu_kind.clone(),
                    cpus: self.config.cpus,
                    memory_mb: self.config.memory_mb,
                },
                env,
                mounts: vec![MountConfig {
                    volume: volume_id.to_string(),
                    path: self.config.workspace_dir.clone(),
                }],
                services: vec![ServiceConfig {
                    protocol: "tcp".to_string(),
                    internal_port: self.config.internal_port,
                    ports: vec![
                        PortConfig {
                            port: 443,
                            handlers: vec!["tls".to_string(), "http".to_string()],
                        },
                        PortConfig {
                            port: 80,
                            handlers: vec!["http".to_string()],
                        },
                    ],
                }],
            },
        }
    }
}
