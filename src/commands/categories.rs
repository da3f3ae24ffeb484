// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::models::TransactionType;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
            let cat = store::insert_category(conn, name, kind)?;
            println!("Added {} category '{}'", cat.transaction_type, cat.name);
        }
        Some(("list", sub)) => {
            let cats = store::list_categories(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let rows = cats
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.transaction_type.label().to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Category", "Type"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
