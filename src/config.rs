// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{LedgerError, Result};

pub const QUICK_THRESHOLD: &str = "quick_threshold";
pub const BACKUP_RETENTION: &str = "backup_retention";
pub const BACKUP_INTERVAL_SECS: &str = "backup_interval_secs";
pub const DEFAULT_OWNER: &str = "default_owner";

pub const KNOWN_KEYS: [&str; 4] = [
    QUICK_THRESHOLD,
    BACKUP_RETENTION,
    BACKUP_INTERVAL_SECS,
    DEFAULT_OWNER,
];

/// Runtime settings stored in the `settings` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Quick expenses below this amount prefer cash-like methods.
    pub quick_threshold: Decimal,
    pub backup_retention: usize,
    pub backup_interval_secs: u64,
    pub default_owner: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quick_threshold: Decimal::from(100),
            backup_retention: 7,
            backup_interval_secs: 24 * 60 * 60,
            default_owner: None,
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut s = Self::default();
        if let Some(v) = get_setting(conn, QUICK_THRESHOLD)? {
            s.quick_threshold = parse_value(QUICK_THRESHOLD, &v)?;
        }
        if let Some(v) = get_setting(conn, BACKUP_RETENTION)? {
            s.backup_retention = parse_value(BACKUP_RETENTION, &v)?;
        }
        if let Some(v) = get_setting(conn, BACKUP_INTERVAL_SECS)? {
            s.backup_interval_secs = parse_value(BACKUP_INTERVAL_SECS, &v)?;
        }
        s.default_owner = get_setting(conn, DEFAULT_OWNER)?.filter(|v| !v.trim().is_empty());
        Ok(s)
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs.max(1))
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, v: &str) -> Result<T> {
    v.trim()
        .parse::<T>()
        .map_err(|_| LedgerError::validation(format!("Invalid value '{}' for setting '{}'", v, key)))
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?)
}

/// Validates the value for known keys before storing it.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    match key {
        QUICK_THRESHOLD => {
            let d: Decimal = parse_value(key, value)?;
            if d.is_sign_negative() {
                return Err(LedgerError::validation("quick_threshold must not be negative"));
            }
        }
        BACKUP_RETENTION => {
            let n: usize = parse_value(key, value)?;
            if n == 0 {
                return Err(LedgerError::validation("backup_retention must be at least 1"));
            }
        }
        BACKUP_INTERVAL_SECS => {
            parse_value::<u64>(key, value)?;
        }
        DEFAULT_OWNER => {}
        other => {
            return Err(LedgerError::validation(format!(
                "Unknown setting '{}' (known: {})",
                other,
                KNOWN_KEYS.join(", ")
            )));
        }
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}
