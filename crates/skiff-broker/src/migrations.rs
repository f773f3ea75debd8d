// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database schema for skiff-broker.
//!
//! The schema is embedded at compile time and applied with `IF NOT EXISTS`
//! guards, so [`run`] is safe to call on every startup.
//!
//! # Example
//!
//! ```ignore
//! use sqlx::PgPool;
//! use skiff_broker::migrations;
//!
//! let pool = PgPool::connect(&database_url).await?;
//! migrations::run(&pool).await?;
//! ```

/// Apply the broker schema to the given database.
pub async fn run(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../migrations/schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}
