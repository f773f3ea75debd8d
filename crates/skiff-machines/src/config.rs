// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the Machines client.

use std::time::Duration;

use crate::error::{MachinesError, Result};

/// Default base URL of the Fly Machines API.
pub const DEFAULT_API_BASE: &str = "https://api.machines.dev/v1";

/// Configuration for the [`MachinesClient`](crate::MachinesClient).
#[derive(Debug, Clone)]
pub struct MachinesConfig {
    /// Base URL of the Machines API.
    pub api_base: String,
    /// Fly app that owns the machines and volumes.
    pub app_name: String,
    /// Static bearer token for the control plane.
    pub api_token: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl MachinesConfig {
    /// Create a configuration with default base URL and timeouts.
    pub fn new(app_name: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            app_name: app_name.into(),
            api_token: api_token.into(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLY_API_TOKEN`: bearer token for the control plane (required)
    /// - `SKIFF_FLY_APP`: Fly app name (default: "skiff-runtime")
    /// - `SKIFF_MACHINES_API_BASE`: API base URL (default: `DEFAULT_API_BASE`)
    /// - `SKIFF_MACHINES_TIMEOUT_MS`: request timeout in milliseconds (default: 30000)
    /// - `SKIFF_MACHINES_CONNECT_TIMEOUT_MS`: connect timeout in milliseconds (default: 10000)
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("FLY_API_TOKEN")
            .map_err(|_| MachinesError::Config("FLY_API_TOKEN is not set".to_string()))?;

        let app_name =
            std::env::var("SKIFF_FLY_APP").unwrap_or_else(|_| "skiff-runtime".to_string());

        let api_base =
            std::env::var("SKIFF_MACHINES_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let request_timeout_ms: u64 = std::env::var("SKIFF_MACHINES_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|e| {
                MachinesError::Config(format!("invalid SKIFF_MACHINES_TIMEOUT_MS: {}", e))
            })?;

        let connect_timeout_ms: u64 = std::env::var("SKIFF_MACHINES_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|e| {
                MachinesError::Config(format!("invalid SKIFF_MACHINES_CONNECT_TIMEOUT_MS: {}", e))
            })?;

        Ok(Self {
            api_base,
            app_name,
            api_token,
            request_timeout: Duration::from_millis(request_timeout_ms),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
        })
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = MachinesConfig::new("my-app", "tok_123");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.app_name, "my-app");
        assert_eq!(config.api_token, "tok_123");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_methods() {
        let config = MachinesConfig::new("my-app", "tok_123")
            .with_api_base("http://127.0.0.1:4280/v1")
            .with_request_timeout(Duration::from_millis(500))
            .with_connect_timeout(Duration::from_millis(250));

        assert_eq!(config.api_base, "http://127.0.0.1:4280/v1");
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }
}
