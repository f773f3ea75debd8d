// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bounded retry with exponential backoff.
//!
//! Applied to session store operations only. Machine and volume creation
//! are never retried here: create is not idempotent at the control plane,
//! so a repeat attempt needs a fresh name minted by the caller.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Maximum attempts per operation.
const MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubled for each attempt after that.
const BASE_DELAY: Duration = Duration::from_millis(100);

/// Run `op` up to three times, sleeping between attempts.
///
/// Retries only while `is_transient` classifies the failure as worth
/// another attempt; deterministic failures propagate immediately.
pub async fn with_backoff<T, E, Fut>(
    label: &'static str,
    is_transient: impl Fn(&E) -> bool,
    mut op: impl FnMut() -> Fut,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = BASE_DELAY;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
                warn!(op = label, attempt, %err, "Transient failure, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
