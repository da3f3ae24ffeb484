// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::config::Settings;
use crate::ledger::Ledger;
use crate::models::Owner;
use crate::quick::{QUICK_ITEMS, quick_expense};
use crate::store;
use crate::utils::{fmt_money, now_local, owner_by_name, parse_date_time, pretty_table};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    if m.get_flag("list") {
        let rows = QUICK_ITEMS
            .iter()
            .map(|i| {
                vec![
                    i.label.to_string(),
                    i.aliases.join(", "),
                    fmt_money(&i.amount),
                    i.category.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Item", "Aliases", "Amount", "Category"], rows)
        );
        return Ok(());
    }

    let settings = Settings::load(ledger.conn())?;
    let owner = resolve_owner(
        ledger.conn(),
        m.get_one::<String>("owner").map(String::as_str),
        &settings,
    )?;
    let item = m.get_one::<String>("item").unwrap();
    let at = match m.get_one::<String>("date") {
        Some(s) => parse_date_time(s)?,
        None => now_local(),
    };
    let id = quick_expense(ledger, owner.id, item, at, settings.quick_threshold)?;
    if let Some(bill) = ledger.bill(id)? {
        let method = ledger
            .payment_method(bill.payment_method_id)?
            .map(|pm| pm.name().to_string())
            .unwrap_or_default();
        println!(
            "Recorded {} {} for {} with '{}' (bill {})",
            bill.note.unwrap_or_default(),
            fmt_money(&bill.amount.abs()),
            owner.name,
            method,
            id
        );
    }
    Ok(())
}

/// `--owner`, then the `default_owner` setting, then the first owner.
pub fn resolve_owner(conn: &Connection, name: Option<&str>, settings: &Settings) -> Result<Owner> {
    if let Some(n) = name.or(settings.default_owner.as_deref()) {
        return owner_by_name(conn, n);
    }
    store::list_owners(conn)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No owners yet; run `billbook init` or `billbook owner add`"))
}
