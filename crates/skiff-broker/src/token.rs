// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Capability tokens for freshly provisioned machines.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token lifetime in seconds. Long enough to outlive any ephemeral
/// machine, short enough that expiry is the only revocation needed.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by a capability token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityClaims {
    /// User the token acts for.
    pub sub: String,
    /// Machine the token is scoped to.
    pub machine_id: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Mints signed, time-boxed assertions that let a freshly created machine
/// authenticate back to the control plane.
///
/// Tokens are self-contained and never persisted. Verification happens on
/// the receiving side (the machine or a gateway); the broker only signs.
pub struct CapabilityTokenIssuer {
    encoding_key: EncodingKey,
}

impl CapabilityTokenIssuer {
    /// Create an issuer signing with the given HS256 secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token scoping `user_id` to `machine_id`, valid for 24 hours.
    pub fn issue(&self, user_id: &str, machine_id: &str) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = CapabilityClaims {
            sub: user_id.to_string(),
            machine_id: machine_id.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding_key,
        )?)
    }
}
