// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for skiff-broker.

/// Broker configuration loaded from environment variables.
///
/// The Machines API credentials live in
/// [`MachinesConfig`](skiff_machines::MachinesConfig), loaded separately.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string for the session store.
    pub database_url: String,
    /// Domain workspace machines are reachable under
    /// (`https://{machine_id}.{runtime_domain}`).
    pub runtime_domain: String,
    /// Container image launched on new machines.
    pub image: String,
    /// Region for volume placement.
    pub region: String,
    /// Size of each per-user volume in gigabytes.
    pub volume_size_gb: u32,
    /// CPU kind for new machines ("shared" or "performance").
    pub cpu_kind: String,
    /// CPU count for new machines.
    pub cpus: u32,
    /// Memory for new machines in megabytes.
    pub memory_mb: u32,
    /// Port the workspace workload listens on inside the machine.
    pub internal_port: u16,
    /// Mount path of the user volume, also exported as `WORKSPACE_DIR`.
    pub workspace_dir: String,
    /// HS256 secret for capability tokens.
    pub token_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("SKIFF_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("SKIFF_DATABASE_URL or DATABASE_URL"))?;

        let token_secret = std::env::var("SKIFF_TOKEN_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("SKIFF_TOKEN_SECRET"))?;

        let runtime_domain = std::env::var("SKIFF_RUNTIME_DOMAIN")
            .unwrap_or_else(|_| "skiff-runtime.fly.dev".to_string());

        let image = std::env::var("SKIFF_WORKSPACE_IMAGE")
            .unwrap_or_else(|_| "registry.fly.io/skiff-workspace:latest".to_string());

        let region = std::env::var("SKIFF_REGION").unwrap_or_else(|_| "sjc".to_string());

        let volume_size_gb: u32 = std::env::var("SKIFF_VOLUME_SIZE_GB")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("SKIFF_VOLUME_SIZE_GB"))?;

        let cpu_kind =
            std::env::var("SKIFF_WORKSPACE_CPU_KIND").unwrap_or_else(|_| "shared".to_string());

        let cpus: u32 = std::env::var("SKIFF_WORKSPACE_CPUS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("SKIFF_WORKSPACE_CPUS"))?;

        let memory_mb: u32 = std::env::var("SKIFF_WORKSPACE_MEMORY_MB")
            .unwrap_or_else(|_| "2048".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("SKIFF_WORKSPACE_MEMORY_MB"))?;

        let internal_port: u16 = std::env::var("SKIFF_WORKSPACE_PORT")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("SKIFF_WORKSPACE_PORT"))?;

        let workspace_dir =
            std::env::var("SKIFF_WORKSPACE_DIR").unwrap_or_else(|_| "/workspace".to_string());

        Ok(Self {
            database_url,
            runtime_domain,
            image,
            region,
            volume_size_gb,
            cpu_kind,
            cpus,
            memory_mb,
            internal_port,
            workspace_dir,
            token_secret,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// An environment variable has an unparseable value.
    #[error("Invalid value for environment variable: {0}")]
    InvalidEnvVar(&'static str),
}
