// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::codec::NameIndex;
use crate::commands::bills::filter_from_args;
use crate::stats::{Statistics, aggregate};
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let stats = compute(conn, m)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &stats)? {
        return Ok(());
    }
    let names = NameIndex::load(conn)?;
    let name = |map: &std::collections::HashMap<i64, String>, id: i64| {
        map.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    };

    println!(
        "{}",
        pretty_table(
            &["Bills", "Income", "Expense", "Excluded", "Net"],
            vec![vec![
                stats.bill_count.to_string(),
                fmt_money(&stats.total_income),
                fmt_money(&stats.total_expense),
                fmt_money(&stats.total_excluded),
                fmt_money(&stats.net_income),
            ]],
        )
    );

    let rows = stats
        .by_category
        .iter()
        .map(|c| {
            vec![
                name(&names.categories, c.category_id),
                fmt_money(&c.amount),
                c.count.to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Category", "Amount", "Bills"], rows));

    let rows = stats
        .by_owner
        .iter()
        .map(|o| {
            vec![
                name(&names.owners, o.owner_id),
                fmt_money(&o.income),
                fmt_money(&o.expense),
                fmt_money(&o.excluded),
                o.count.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Owner", "Income", "Expense", "Excluded", "Bills"], rows)
    );

    let rows = stats
        .by_payment_method
        .iter()
        .map(|p| {
            vec![
                name(&names.methods, p.payment_method_id),
                fmt_money(&p.amount),
                p.count.to_string(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Method", "Amount", "Bills"], rows));
    Ok(())
}

pub fn compute(conn: &Connection, m: &clap::ArgMatches) -> Result<Statistics> {
    let filter = filter_from_args(conn, m)?;
    let bills = store::list_bills(conn, &filter)?;
    Ok(aggregate(&bills))
}
