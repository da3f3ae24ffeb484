// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-database JSON snapshot used for backup and restore.
//!
//! Restore replaces everything: the snapshot is fully parsed and checked
//! before any existing row is touched, then cleared and reinserted in one
//! transaction.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::models::{Bill, Category, Owner, PaymentMethod};
use crate::store;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub owners: Vec<Owner>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: SnapshotData,
}

/// What a backup file must at least look like before it is trusted.
#[derive(Deserialize)]
struct Envelope {
    version: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    data: Option<SnapshotData>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub owners: usize,
    pub categories: usize,
    pub payment_methods: usize,
    pub bills: usize,
}

impl Snapshot {
    pub fn capture(conn: &Connection) -> Result<Self> {
        Ok(Self {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp: Utc::now(),
            data: SnapshotData {
                bills: store::list_bills(conn, &Default::default())?,
                categories: store::list_categories(conn)?,
                owners: store::list_owners(conn)?,
                payment_methods: store::list_payment_methods(conn, None)?,
            },
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a snapshot without touching any store.
    pub fn parse(json: &str) -> Result<Self> {
        let env: Envelope = serde_json::from_str(json)
            .map_err(|e| LedgerError::Format(format!("Unreadable backup: {}", e)))?;
        let version = env
            .version
            .ok_or_else(|| LedgerError::Format("Backup is missing 'version'".into()))?;
        let data = env
            .data
            .ok_or_else(|| LedgerError::Format("Backup is missing 'data'".into()))?;
        if version.split('.').next() != SNAPSHOT_VERSION.split('.').next() {
            return Err(LedgerError::Format(format!(
                "Unsupported backup version '{}'",
                version
            )));
        }
        let snapshot = Self {
            version,
            timestamp: env.timestamp.unwrap_or_default(),
            data,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn read_from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::parse(&json)
    }

    /// Every reference inside the snapshot must resolve inside the snapshot.
    pub fn validate(&self) -> Result<()> {
        let d = &self.data;
        let owners: HashSet<_> = d.owners.iter().map(|o| o.id).collect();
        let categories: HashSet<_> = d.categories.iter().map(|c| c.id).collect();
        let methods: HashSet<_> = d.payment_methods.iter().map(|m| m.id()).collect();

        for m in &d.payment_methods {
            if !owners.contains(&m.owner_id()) {
                return Err(LedgerError::Format(format!(
                    "Payment method {} references unknown owner {}",
                    m.id(),
                    m.owner_id()
                )));
            }
        }
        for b in &d.bills {
            if !methods.contains(&b.payment_method_id) {
                return Err(LedgerError::Format(format!(
                    "Bill {} references unknown payment method {}",
                    b.id, b.payment_method_id
                )));
            }
            if !owners.contains(&b.owner_id) {
                return Err(LedgerError::Format(format!(
                    "Bill {} references unknown owner {}",
                    b.id, b.owner_id
                )));
            }
            if b.category_ids.is_empty() {
                return Err(LedgerError::Format(format!("Bill {} has no categories", b.id)));
            }
            if let Some(c) = b.category_ids.iter().find(|c| !categories.contains(*c)) {
                return Err(LedgerError::Format(format!(
                    "Bill {} references unknown category {}",
                    b.id, c
                )));
            }
        }
        Ok(())
    }

    /// Clears the store and inserts the snapshot, ids and balances included.
    pub fn restore_into(&self, conn: &mut Connection) -> Result<RestoreSummary> {
        self.validate()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        store::clear_all(&tx)?;
        let d = &self.data;
        for o in &d.owners {
            store::restore_owner(&tx, o)?;
        }
        for c in &d.categories {
            store::restore_category(&tx, c)?;
        }
        for m in &d.payment_methods {
            store::restore_payment_method(&tx, m)?;
        }
        for b in &d.bills {
            store::restore_bill(&tx, b)?;
        }
        tx.commit()?;
        let summary = RestoreSummary {
            owners: d.owners.len(),
            categories: d.categories.len(),
            payment_methods: d.payment_methods.len(),
            bills: d.bills.len(),
        };
        info!(
            owners = summary.owners,
            categories = summary.categories,
            payment_methods = summary.payment_methods,
            bills = summary.bills,
            "restored snapshot"
        );
        Ok(summary)
    }
}
