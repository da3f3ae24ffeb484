// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Context, Result};

use crate::codec::tabular;
use crate::ledger::{ImportSummary, Ledger};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("bills", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let summary = import_bills(ledger, Path::new(path))?;
            println!(
                "Imported {} bills ({} failed, {} duplicates skipped)",
                summary.success, summary.failed, summary.skipped
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

pub fn import_bills(ledger: &mut Ledger, path: &Path) -> Result<ImportSummary> {
    let rows = tabular::read_rows_from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let summary = ledger.bulk_import(&rows)?;
    Ok(summary)
}
