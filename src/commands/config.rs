// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::config::{self, Settings};
use crate::utils::pretty_table;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => match sub.get_one::<String>("key") {
            Some(key) => match config::get_setting(conn, key)? {
                Some(v) => println!("{}", v),
                None => println!("{} is not set", key),
            },
            None => {
                let s = Settings::load(conn)?;
                let rows = vec![
                    vec![config::QUICK_THRESHOLD.to_string(), s.quick_threshold.to_string()],
                    vec![config::BACKUP_RETENTION.to_string(), s.backup_retention.to_string()],
                    vec![
                        config::BACKUP_INTERVAL_SECS.to_string(),
                        s.backup_interval_secs.to_string(),
                    ],
                    vec![
                        config::DEFAULT_OWNER.to_string(),
                        s.default_owner.unwrap_or_default(),
                    ],
                ];
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        },
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let value = sub.get_one::<String>("value").unwrap();
            config::set_setting(conn, key, value)?;
            println!("{} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}
