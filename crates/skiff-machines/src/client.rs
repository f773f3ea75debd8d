// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! MachinesClient for the Fly Machines control plane.

use reqwest::{Response, StatusCode};
use tracing::{debug, info, instrument};

use crate::config::MachinesConfig;
use crate::error::{MachinesError, Result};
use crate::types::{CreateMachineRequest, CreateVolumeRequest, Machine, Volume};

/// Typed client for the Machines control plane.
///
/// One method per lifecycle verb, bearer-authenticated, with bounded
/// timeouts. The client never retries: reads report absence as `None`,
/// and creates are not idempotent at the API, so retry policy belongs to
/// the caller (which must mint a fresh machine name per attempt).
pub struct MachinesClient {
    http: reqwest::Client,
    config: MachinesConfig,
}

impl MachinesClient {
    /// Create a new client with the given configuration.
    pub fn new(config: MachinesConfig) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(MachinesError::Config("API token is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(MachinesConfig::from_env()?)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &MachinesConfig {
        &self.config
    }

    fn machines_url(&self) -> String {
        format!(
            "{}/apps/{}/machines",
            self.config.api_base, self.config.app_name
        )
    }

    fn volumes_url(&self) -> String {
        format!(
            "{}/apps/{}/volumes",
            self.config.api_base, self.config.app_name
        )
    }

    /// Consume a non-success response into an `Api` error with the body attached.
    async fn api_error(response: Response) -> MachinesError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        MachinesError::Api { status, body }
    }

    /// Map a lifecycle-verb response: 404 to `MachineNotFound`, other
    /// non-success to `Api`.
    async fn expect_success(machine_id: &str, response: Response) -> Result<()> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(MachinesError::MachineNotFound(machine_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }

    // =========================================================================
    // Machines
    // =========================================================================

    /// Create a new machine.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_machine(&self, request: &CreateMachineRequest) -> Result<Machine> {
        info!("Creating machine");

        let response = self
            .http
            .post(self.machines_url())
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let machine: Machine = response.json().await?;
        info!(machine_id = %machine.id, "Machine created");
        Ok(machine)
    }

    /// Fetch a machine by id.
    ///
    /// Returns `Ok(None)` when the machine does not exist; an unknown id is
    /// an expected outcome, not a fault.
    #[instrument(skip(self), fields(machine_id = %machine_id))]
    pub async fn get_machine(&self, machine_id: &str) -> Result<Option<Machine>> {
        debug!("Fetching machine");

        let response = self
            .http
            .get(format!("{}/{}", self.machines_url(), machine_id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Machine not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let machine: Machine = response.json().await?;
        debug!(state = machine.state.as_str(), "Machine fetched");
        Ok(Some(machine))
    }

    /// List all machines in the app.
    #[instrument(skip(self))]
    pub async fn list_machines(&self) -> Result<Vec<Machine>> {
        debug!("Listing machines");

        let response = self
            .http
            .get(self.machines_url())
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let machines: Vec<Machine> = response.json().await?;
        debug!(count = machines.len(), "Machines listed");
        Ok(machines)
    }

    /// Start a stopped machine.
    #[instrument(skip(self), fields(machine_id = %machine_id))]
    pub async fn start_machine(&self, machine_id: &str) -> Result<()> {
        info!("Starting machine");

        let response = self
            .http
            .post(format!("{}/{}/start", self.machines_url(), machine_id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        Self::expect_success(machine_id, response).await
    }

    /// Stop a running machine.
    #[instrument(skip(self), fields(machine_id = %machine_id))]
    pub async fn stop_machine(&self, machine_id: &str) -> Result<()> {
        info!("Stopping machine");

        let response = self
            .http
            .post(format!("{}/{}/stop", self.machines_url(), machine_id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        Self::expect_success(machine_id, response).await
    }

    /// Destroy a machine. Irreversible.
    #[instrument(skip(self), fields(machine_id = %machine_id))]
    pub async fn destroy_machine(&self, machine_id: &str) -> Result<()> {
        info!("Destroying machine");

        let response = self
            .http
            .delete(format!("{}/{}", self.machines_url(), machine_id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        Self::expect_success(machine_id, response).await
    }

    // =========================================================================
    // Volumes
    // =========================================================================

    /// Create a new storage volume.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_volume(&self, request: &CreateVolumeRequest) -> Result<Volume> {
        info!(size_gb = request.size_gb, region = %request.region, "Creating volume");

        let response = self
            .http
            .post(self.volumes_url())
            .bearer_auth(&self.config.api_token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let volume: Volume = response.json().await?;
        info!(volume_id = %volume.id, "Volume created");
        Ok(volume)
    }

    /// List all volumes in the app.
    #[instrument(skip(self))]
    pub async fn list_volumes(&self) -> Result<Vec<Volume>> {
        debug!("Listing volumes");

        let response = self
            .http
            .get(self.volumes_url())
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let volumes: Vec<Volume> = response.json().await?;
        debug!(count = volumes.len(), "Volumes listed");
        Ok(volumes)
    }
}
