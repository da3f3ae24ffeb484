// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::store;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let owner = store::insert_owner(conn, name)?;
            println!("Added owner '{}' (id {})", owner.name, owner.id);
        }
        Some(("list", sub)) => {
            let owners = store::list_owners(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &owners)? {
                let rows = owners
                    .iter()
                    .map(|o| vec![o.id.to_string(), o.name.clone()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Owner"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
