// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Billbook", "billbook"));

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2).ok_or_else(|| {
        LedgerError::StorageUnavailable("Could not determine platform-specific data dir".into())
    })?;
    let dir = proj.data_dir();
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("billbook.sqlite"))
}

/// Owns the SQLite connection backing every entity collection.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
    degraded: bool,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::StorageUnavailable(format!("Open DB at {}: {}", path.display(), e))
        })?;
        init_schema(&conn).map_err(|e| {
            LedgerError::StorageUnavailable(format!("Init schema at {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "opened store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            degraded: false,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::StorageUnavailable(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: None,
            degraded: false,
        })
    }

    /// Opens the on-disk store, or falls back to a degraded in-memory one
    /// when the file cannot be opened or initialized.
    pub fn open_or_fallback(path: &Path) -> Result<Self> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(err) => {
                warn!(error = %err, "persistent store unavailable, using in-memory store");
                let mut store = Self::open_in_memory()?;
                store.degraded = true;
                Ok(store)
            }
        }
    }

    /// Separate connection that can never take the write lock.
    pub fn open_read_only(path: &Path) -> Result<Connection> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| LedgerError::StorageUnavailable(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

pub fn open_or_init(path: Option<PathBuf>) -> Result<Store> {
    let path = match path {
        Some(p) => p,
        None => db_path()?,
    };
    Store::open_or_fallback(&path)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS owners(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        transaction_type TEXT NOT NULL DEFAULT 'expense'
            CHECK(transaction_type IN ('expense','income','excluded')),
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS payment_methods(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        account_type TEXT NOT NULL CHECK(account_type IN ('savings','credit')),
        transaction_type TEXT NOT NULL DEFAULT 'expense',
        balance TEXT NOT NULL DEFAULT '0', -- amount owed for credit accounts
        credit_limit TEXT,
        billing_date INTEGER,
        owner_id INTEGER NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(owner_id, name),
        FOREIGN KEY(owner_id) REFERENCES owners(id)
    );

    CREATE TABLE IF NOT EXISTS bills(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        transaction_type TEXT NOT NULL
            CHECK(transaction_type IN ('expense','income','excluded')),
        payment_method_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL,
        note TEXT,
        date TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(payment_method_id) REFERENCES payment_methods(id),
        FOREIGN KEY(owner_id) REFERENCES owners(id)
    );
    CREATE INDEX IF NOT EXISTS idx_bills_date ON bills(date);
    CREATE INDEX IF NOT EXISTS idx_bills_identity
        ON bills(date, amount, transaction_type, owner_id, payment_method_id);

    CREATE TABLE IF NOT EXISTS bill_categories(
        bill_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        PRIMARY KEY(bill_id, category_id),
        FOREIGN KEY(bill_id) REFERENCES bills(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
    "#,
    )?;
    Ok(())
}
