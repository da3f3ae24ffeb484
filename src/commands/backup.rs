// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, anyhow, bail};

use crate::backup::{BackupManager, spawn_periodic};
use crate::config::Settings;
use crate::db::{self, Store};
use crate::ledger::Ledger;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(ledger.conn())?;
    let dir = backup_dir(ledger.store(), m.get_one::<PathBuf>("dir"))?;
    let manager = BackupManager::new(dir, settings.backup_retention);

    match m.subcommand() {
        Some(("create", _)) => {
            let path = manager.create_backup(ledger.conn())?;
            println!("Backup written to {}", path.display());
        }
        Some(("list", sub)) => {
            let backups = manager.list_backups()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &backups)? {
                let rows = backups
                    .iter()
                    .map(|b| {
                        vec![
                            b.filename.clone(),
                            b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                            b.size_bytes.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["File", "Created (UTC)", "Bytes"], rows));
            }
        }
        Some(("restore", sub)) => {
            let path = sub.get_one::<PathBuf>("path").unwrap();
            let summary = manager
                .restore(ledger.store_mut(), path)
                .with_context(|| format!("Restore {}", path.display()))?;
            println!(
                "Restored {} owners, {} categories, {} payment methods, {} bills",
                summary.owners, summary.categories, summary.payment_methods, summary.bills
            );
        }
        Some(("watch", _)) => {
            let db_path = ledger
                .store()
                .path()
                .map(|p| p.to_path_buf())
                .ok_or_else(|| anyhow!("Scheduled backups need an on-disk database"))?;
            println!(
                "Backing up {} every {}s into {} (Ctrl-C to stop)",
                db_path.display(),
                settings.backup_interval_secs,
                manager.dir().display()
            );
            let stop = Arc::new(AtomicBool::new(false));
            let handle = spawn_periodic(db_path, manager, settings.backup_interval(), stop);
            if handle.join().is_err() {
                bail!("Backup thread panicked");
            }
        }
        _ => {}
    }
    Ok(())
}

/// `--dir`, else `backups/` next to the database, else under the data dir.
pub fn backup_dir(store: &Store, explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = explicit {
        return Ok(d.clone());
    }
    if let Some(parent) = store.path().and_then(|p| p.parent()) {
        return Ok(parent.join("backups"));
    }
    Ok(db::data_dir()?.join("backups"))
}
