// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

use crate::codec::NameIndex;
use crate::ledger::Ledger;
use crate::models::{BillDraft, BillFilter, BillPatch, TransactionType};
use crate::store;
use crate::utils::{
    category_ids, fmt_money, maybe_print_json, method_by_name, now_local, owner_by_name,
    parse_date, parse_date_time, parse_decimal, pretty_table,
};

pub fn handle(ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ledger.remove_bill(id)?;
            println!("Removed bill {}", id);
        }
        Some(("list", sub)) => list(ledger.conn(), sub)?,
        _ => {}
    }
    Ok(())
}

fn add(ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let conn = ledger.conn();
    let owner = owner_by_name(conn, sub.get_one::<String>("owner").unwrap())?;
    let method = method_by_name(conn, &owner, sub.get_one::<String>("method").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let categories = category_ids(conn, sub.get_one::<String>("categories").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date_time(s)?,
        None => now_local(),
    };
    let note = sub.get_one::<String>("note").cloned();

    let id = ledger
        .record_bill(BillDraft {
            amount,
            transaction_type: kind,
            payment_method_id: method.id(),
            category_ids: categories,
            owner_id: owner.id,
            note,
            date,
        })
        .context("Record bill")?;
    println!(
        "Recorded {} {} on {} with '{}' (bill {})",
        kind,
        amount.abs(),
        store::fmt_date_time(&date),
        method.name(),
        id
    );
    Ok(())
}

fn edit(ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let bill = ledger
        .bill(id)?
        .ok_or_else(|| anyhow!("Bill {} not found", id))?;
    let conn = ledger.conn();

    let mut patch = BillPatch::default();
    if let Some(a) = sub.get_one::<String>("amount") {
        patch = patch.amount(parse_decimal(a)?);
    }
    if let Some(t) = sub.get_one::<String>("type") {
        patch = patch.transaction_type(t.parse()?);
    }
    if let Some(name) = sub.get_one::<String>("method") {
        let pm = store::payment_method_by_name(conn, bill.owner_id, name)?
            .ok_or_else(|| anyhow!("Payment method '{}' not found for the bill's owner", name))?;
        patch = patch.payment_method(pm.id());
    }
    if let Some(names) = sub.get_one::<String>("categories") {
        patch = patch.categories(category_ids(conn, names)?);
    }
    if let Some(d) = sub.get_one::<String>("date") {
        patch = patch.date(parse_date_time(d)?);
    }
    if sub.get_flag("clear-note") {
        patch = patch.note(None);
    } else if let Some(n) = sub.get_one::<String>("note") {
        patch = patch.note(Some(n.clone()));
    }

    ledger.amend_bill(id, patch).context("Amend bill")?;
    println!("Updated bill {}", id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.transaction_type.clone(),
                    r.amount.clone(),
                    r.categories.clone(),
                    r.owner.clone(),
                    r.payment_method.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Amount", "Categories", "Owner", "Method", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BillRow {
    pub id: i64,
    pub date: String,
    pub transaction_type: String,
    pub amount: String,
    pub categories: String,
    pub owner: String,
    pub payment_method: String,
    pub note: String,
}

/// Builds a [`BillFilter`] from `--owner`, `--method`, `--type`,
/// `--category`, `--from` and `--to`.
pub fn filter_from_args(conn: &Connection, sub: &clap::ArgMatches) -> Result<BillFilter> {
    let mut filter = BillFilter::default();
    let owner = match sub.try_get_one::<String>("owner").ok().flatten() {
        Some(name) => Some(owner_by_name(conn, name)?),
        None => None,
    };
    if let Some(o) = &owner {
        filter.owner_id = Some(o.id);
    }
    if let Some(name) = sub.try_get_one::<String>("method").ok().flatten() {
        let o = owner
            .as_ref()
            .ok_or_else(|| anyhow!("--method needs --owner"))?;
        filter.payment_method_id = Some(method_by_name(conn, o, name)?.id());
    }
    if let Some(t) = sub.try_get_one::<String>("type").ok().flatten() {
        filter.transaction_type = Some(t.parse()?);
    }
    if let Some(c) = sub.try_get_one::<String>("category").ok().flatten() {
        filter.category_ids = category_ids(conn, c)?;
    }
    if let Some(d) = sub.try_get_one::<String>("from").ok().flatten() {
        filter.from = Some(parse_date(d)?);
    }
    if let Some(d) = sub.try_get_one::<String>("to").ok().flatten() {
        filter.to = Some(parse_date(d)?);
    }
    Ok(filter)
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<BillRow>> {
    let filter = filter_from_args(conn, sub)?;
    let mut bills = store::list_bills(conn, &filter)?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        bills.truncate(*limit);
    }
    let names = NameIndex::load(conn)?;
    let name = |m: &std::collections::HashMap<i64, String>, id: i64| {
        m.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    };
    Ok(bills
        .iter()
        .map(|b| BillRow {
            id: b.id,
            date: store::fmt_date_time(&b.date),
            transaction_type: b.transaction_type.label().to_string(),
            amount: fmt_money(&b.amount),
            categories: b
                .category_ids
                .iter()
                .map(|c| name(&names.categories, *c))
                .collect::<Vec<_>>()
                .join(","),
            owner: name(&names.owners, b.owner_id),
            payment_method: name(&names.methods, b.payment_method_id),
            note: b.note.clone().unwrap_or_default(),
        })
        .collect())
}
