// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::codec::{NameIndex, Snapshot, tabular};
use crate::models::BillFilter;
use crate::store;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("bills", sub)) => {
            let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
            let out = sub.get_one::<String>("out").unwrap();
            let n = export_bills(conn, &fmt, Path::new(out))?;
            println!("Exported {} bills to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `csv` writes the tabular bill file, `json` the full snapshot envelope.
pub fn export_bills(conn: &Connection, fmt: &str, out: &Path) -> Result<usize> {
    match fmt {
        "csv" => {
            let bills = store::list_bills(conn, &BillFilter::default())?;
            let names = NameIndex::load(conn)?;
            let n = tabular::write_bills_to_path(out, &bills, &names)
                .with_context(|| format!("Write CSV {}", out.display()))?;
            Ok(n)
        }
        "json" => {
            let snapshot = Snapshot::capture(conn)?;
            std::fs::write(out, snapshot.to_json()?)
                .with_context(|| format!("Write JSON {}", out.display()))?;
            Ok(snapshot.data.bills.len())
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
}
