// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use billbook::{cli, commands, db, init_tracing, ledger::Ledger, store};

fn main() -> Result<()> {
    init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let store = db::open_or_init(matches.get_one::<PathBuf>("db").cloned())?;
    if store.is_degraded() {
        warn!("changes in this session will not be saved");
    }
    let mut ledger = Ledger::new(store);

    match matches.subcommand() {
        Some(("init", _)) => {
            let seeded = store::seed_defaults(ledger.conn())?;
            match ledger.store().path() {
                Some(p) => println!("Database initialized at {}", p.display()),
                None => println!("Database initialized in memory"),
            }
            if seeded {
                println!("Seeded owner 'Me', a 'Cash' account and starter categories");
            }
        }
        Some(("owner", sub)) => commands::owners::handle(ledger.conn(), sub)?,
        Some(("category", sub)) => commands::categories::handle(ledger.conn(), sub)?,
        Some(("method", sub)) => commands::methods::handle(ledger.conn(), sub)?,
        Some(("bill", sub)) => commands::bills::handle(&mut ledger, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut ledger, sub)?,
        Some(("export", sub)) => commands::exporter::handle(ledger.conn(), sub)?,
        Some(("backup", sub)) => commands::backup::handle(&mut ledger, sub)?,
        Some(("stats", sub)) => commands::stats::handle(ledger.conn(), sub)?,
        Some(("quick", sub)) => commands::quick::handle(&mut ledger, sub)?,
        Some(("config", sub)) => commands::config::handle(ledger.conn(), sub)?,
        Some(("doctor", _)) => commands::doctor::handle(ledger.conn())?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
