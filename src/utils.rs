// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::models::{CategoryId, Owner, PaymentMethod};
use crate::store;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_date_time(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD[ HH:MM[:SS]]", s))
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    d.round_dp(2).to_string()
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn owner_by_name(conn: &Connection, name: &str) -> Result<Owner> {
    store::owner_by_name(conn, name)?.ok_or_else(|| anyhow!("Owner '{}' not found", name))
}

pub fn method_by_name(conn: &Connection, owner: &Owner, name: &str) -> Result<PaymentMethod> {
    store::payment_method_by_name(conn, owner.id, name)?.ok_or_else(|| {
        anyhow!(
            "Payment method '{}' not found for owner '{}'",
            name,
            owner.name
        )
    })
}

/// Resolves a comma-separated list of category names.
pub fn category_ids(conn: &Connection, names: &str) -> Result<Vec<CategoryId>> {
    let mut ids = Vec::new();
    for name in names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let cat = store::category_by_name(conn, name)?
            .ok_or_else(|| anyhow!("Category '{}' not found", name))?;
        ids.push(cat.id);
    }
    Ok(ids)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
