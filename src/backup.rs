// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Rolling JSON backups of the whole store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::codec::snapshot::{RestoreSummary, Snapshot};
use crate::db::Store;
use crate::error::Result;

const PREFIX: &str = "backup-";
const EXTENSION: &str = "json";
const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    retention: usize,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention: retention.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a snapshot of `conn` and prunes old backups.
    pub fn create_backup(&self, conn: &Connection) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let snapshot = Snapshot::capture(conn)?;
        let now = snapshot.timestamp;
        let filename = format!(
            "{}{}-{:03}.{}",
            PREFIX,
            now.format(STAMP_FORMAT),
            now.timestamp_subsec_millis(),
            EXTENSION
        );
        let path = self.dir.join(&filename);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &path)?;
        let pruned = self.enforce_retention()?;
        info!(path = %path.display(), bills = snapshot.data.bills.len(), pruned = pruned.len(), "backup written");
        Ok(path)
    }

    /// Newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == EXTENSION) {
                if let Some(info) = parse_backup_info(&path) {
                    out.push(info);
                }
            }
        }
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(out)
    }

    /// Keeps the newest `retention` backups and deletes the rest.
    pub fn enforce_retention(&self) -> Result<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        for old in self.list_backups()?.into_iter().skip(self.retention) {
            fs::remove_file(&old.path)?;
            deleted.push(old.path);
        }
        Ok(deleted)
    }

    /// Replaces the store's contents with the backup. The file is parsed and
    /// validated completely before anything is cleared.
    pub fn restore(&self, store: &mut Store, path: &Path) -> Result<RestoreSummary> {
        let snapshot = Snapshot::read_from_path(path)?;
        snapshot.restore_into(store.conn_mut())
    }

    /// Backup for unattended callers: never fails, reports success as a flag.
    pub fn run_scheduled(&self, conn: &Connection) -> bool {
        match self.create_backup(conn) {
            Ok(_) => true,
            Err(err) => {
                error!(error = %err, dir = %self.dir.display(), "scheduled backup failed");
                false
            }
        }
    }
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stem = filename.strip_prefix(PREFIX)?.strip_suffix(".json")?;
    // backup-YYYYMMDD-HHMMSS-mmm.json
    let stamp = stem.get(..15)?;
    let created = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    let millis: i64 = stem.get(16..).and_then(|m| m.parse().ok()).unwrap_or(0);
    let created_at = created.and_utc() + chrono::Duration::milliseconds(millis);
    let size_bytes = fs::metadata(path).ok()?.len();
    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Runs `run_scheduled` every `interval` on its own thread with a read-only
/// connection until `stop` is set. The first backup is taken immediately.
pub fn spawn_periodic(
    db_path: PathBuf,
    manager: BackupManager,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut next = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            if Instant::now() >= next {
                match Store::open_read_only(&db_path) {
                    Ok(conn) => {
                        manager.run_scheduled(&conn);
                    }
                    Err(err) => {
                        warn!(error = %err, path = %db_path.display(), "scheduled backup skipped");
                    }
                }
                next = Instant::now() + interval;
            }
            thread::sleep(POLL.min(interval));
        }
    })
}
