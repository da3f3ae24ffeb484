// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{NewPaymentMethod, PaymentMethod};
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, owner_by_name, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add-savings", sub)) => {
            let owner = owner_by_name(conn, sub.get_one::<String>("owner").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let pm = store::insert_payment_method(
                conn,
                &NewPaymentMethod::savings(name.as_str(), owner.id, balance),
            )?;
            println!(
                "Added savings account '{}' for {} (balance {})",
                pm.name(),
                owner.name,
                fmt_money(&pm.ledger_value())
            );
        }
        Some(("add-credit", sub)) => {
            let owner = owner_by_name(conn, sub.get_one::<String>("owner").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
            let billing_date = *sub.get_one::<u8>("billing-date").unwrap();
            let pm = store::insert_payment_method(
                conn,
                &NewPaymentMethod::credit(name.as_str(), owner.id, limit, billing_date),
            )?;
            println!(
                "Added credit account '{}' for {} (limit {})",
                pm.name(),
                owner.name,
                fmt_money(&limit)
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let owner_id = match sub.get_one::<String>("owner") {
        Some(name) => Some(owner_by_name(conn, name)?.id),
        None => None,
    };
    let methods = store::list_payment_methods(conn, owner_id)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &methods)? {
        return Ok(());
    }
    let owners: HashMap<i64, String> = store::list_owners(conn)?
        .into_iter()
        .map(|o| (o.id, o.name))
        .collect();
    let rows = methods
        .iter()
        .map(|pm| {
            let (balance, limit, available) = match pm {
                PaymentMethod::Savings(s) => (fmt_money(&s.balance), String::new(), String::new()),
                PaymentMethod::Credit(c) => (
                    fmt_money(&c.outstanding_balance),
                    fmt_money(&c.credit_limit),
                    pm.available_credit().map(|a| fmt_money(&a)).unwrap_or_default(),
                ),
            };
            vec![
                pm.id().to_string(),
                owners.get(&pm.owner_id()).cloned().unwrap_or_default(),
                pm.name().to_string(),
                pm.account_type().to_string(),
                balance,
                limit,
                available,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Owner", "Name", "Type", "Balance/Owed", "Limit", "Available"],
            rows
        )
    );
    Ok(())
}
