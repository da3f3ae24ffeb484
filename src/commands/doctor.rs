// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

const CHECKS: &[(&str, &str)] = &[
    (
        "bill_missing_payment_method",
        "SELECT b.id, b.payment_method_id FROM bills b
         LEFT JOIN payment_methods p ON p.id=b.payment_method_id
         WHERE p.id IS NULL ORDER BY b.id",
    ),
    (
        "bill_missing_owner",
        "SELECT b.id, b.owner_id FROM bills b
         LEFT JOIN owners o ON o.id=b.owner_id
         WHERE o.id IS NULL ORDER BY b.id",
    ),
    (
        "bill_missing_category",
        "SELECT bc.bill_id, bc.category_id FROM bill_categories bc
         LEFT JOIN categories c ON c.id=bc.category_id
         WHERE c.id IS NULL ORDER BY bc.bill_id",
    ),
    (
        "bill_without_category",
        "SELECT b.id, '' FROM bills b
         WHERE NOT EXISTS (SELECT 1 FROM bill_categories bc WHERE bc.bill_id=b.id)
         ORDER BY b.id",
    ),
    (
        "payment_method_missing_owner",
        "SELECT p.id, p.owner_id FROM payment_methods p
         LEFT JOIN owners o ON o.id=p.owner_id
         WHERE o.id IS NULL ORDER BY p.id",
    ),
];

/// Rows that no longer resolve. Foreign keys are enforced on every
/// connection this crate opens, so issues only come from databases edited
/// by other tools.
pub fn find_issues(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();
    for &(kind, sql) in CHECKS {
        let mut stmt = conn.prepare(sql)?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            let target: rusqlite::types::Value = r.get(1)?;
            let detail = match target {
                rusqlite::types::Value::Integer(t) => format!("{} -> {}", id, t),
                _ => id.to_string(),
            };
            issues.push(Issue { kind, detail });
        }
    }
    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = find_issues(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
