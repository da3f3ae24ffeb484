// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! CRUD primitives over the entity tables.
//!
//! Every function takes a plain `&Connection` so it can run either directly
//! or inside a `rusqlite::Transaction` opened by the ledger.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::balance::{canonical, orient};
use crate::error::{LedgerError, Result};
use crate::models::{
    Bill, BillDraft, BillFilter, BillId, Category, CategoryId, CreditAccount, NewPaymentMethod,
    Owner, OwnerId, PaymentMethod, PaymentMethodId, SavingsAccount, TransactionType,
};

pub const DATE_TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_date_time(d: &NaiveDateTime) -> String {
    d.format(DATE_TIME_FMT).to_string()
}

fn conversion_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn decimal_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| conversion_err(idx, format!("Invalid decimal '{}': {}", s, e)))
}

fn kind_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<TransactionType> {
    let s: String = r.get(idx)?;
    TransactionType::from_label(&s)
        .ok_or_else(|| conversion_err(idx, format!("Unknown transaction type '{}'", s)))
}

fn date_time_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let s: String = r.get(idx)?;
    NaiveDateTime::parse_from_str(&s, DATE_TIME_FMT)
        .map_err(|e| conversion_err(idx, format!("Invalid bill date '{}': {}", s, e)))
}

fn required_name(entity: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation(format!("{} name is empty", entity)));
    }
    Ok(name.to_string())
}

fn next_sort_order(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {}", table);
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

// Owners

const OWNER_COLS: &str = "id, name, sort_order, created_at, updated_at";

fn owner_from_row(r: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: r.get(0)?,
        name: r.get(1)?,
        sort_order: r.get(2)?,
        created_at: r.get(3)?,
        updated_at: r.get(4)?,
    })
}

pub fn insert_owner(conn: &Connection, name: &str) -> Result<Owner> {
    let name = required_name("Owner", name)?;
    if owner_by_name(conn, &name)?.is_some() {
        return Err(LedgerError::validation(format!(
            "Owner '{}' already exists",
            name
        )));
    }
    let now = Utc::now();
    let sort_order = next_sort_order(conn, "owners")?;
    conn.execute(
        "INSERT INTO owners(name, sort_order, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![name, sort_order, now],
    )?;
    Ok(Owner {
        id: conn.last_insert_rowid(),
        name,
        sort_order,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_owner(conn: &Connection, id: OwnerId) -> Result<Option<Owner>> {
    let sql = format!("SELECT {} FROM owners WHERE id=?1", OWNER_COLS);
    Ok(conn
        .query_row(&sql, params![id], owner_from_row)
        .optional()?)
}

pub fn owner_by_name(conn: &Connection, name: &str) -> Result<Option<Owner>> {
    let sql = format!("SELECT {} FROM owners WHERE name=?1", OWNER_COLS);
    Ok(conn
        .query_row(&sql, params![name.trim()], owner_from_row)
        .optional()?)
}

pub fn list_owners(conn: &Connection) -> Result<Vec<Owner>> {
    let sql = format!("SELECT {} FROM owners ORDER BY sort_order, id", OWNER_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], owner_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// Categories

const CATEGORY_COLS: &str = "id, name, transaction_type, sort_order, created_at, updated_at";

fn category_from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        transaction_type: kind_at(r, 2)?,
        sort_order: r.get(3)?,
        created_at: r.get(4)?,
        updated_at: r.get(5)?,
    })
}

pub fn insert_category(
    conn: &Connection,
    name: &str,
    kind: TransactionType,
) -> Result<Category> {
    let name = required_name("Category", name)?;
    if category_by_name(conn, &name)?.is_some() {
        return Err(LedgerError::validation(format!(
            "Category '{}' already exists",
            name
        )));
    }
    let now = Utc::now();
    let sort_order = next_sort_order(conn, "categories")?;
    conn.execute(
        "INSERT INTO categories(name, transaction_type, sort_order, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![name, kind.as_str(), sort_order, now],
    )?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        name,
        transaction_type: kind,
        sort_order,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_category(conn: &Connection, id: CategoryId) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id=?1", CATEGORY_COLS);
    Ok(conn
        .query_row(&sql, params![id], category_from_row)
        .optional()?)
}

pub fn category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE name=?1", CATEGORY_COLS);
    Ok(conn
        .query_row(&sql, params![name.trim()], category_from_row)
        .optional()?)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let sql = format!(
        "SELECT {} FROM categories ORDER BY sort_order, id",
        CATEGORY_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], category_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_or_create_category(
    conn: &Connection,
    name: &str,
    kind: TransactionType,
) -> Result<Category> {
    match category_by_name(conn, name)? {
        Some(c) => Ok(c),
        None => insert_category(conn, name, kind),
    }
}

// Payment methods

const METHOD_COLS: &str = "id, name, account_type, transaction_type, balance, credit_limit, \
     billing_date, owner_id, sort_order, created_at, updated_at";

fn method_from_row(r: &Row<'_>) -> rusqlite::Result<PaymentMethod> {
    let account_type: String = r.get(2)?;
    match account_type.as_str() {
        "savings" => Ok(PaymentMethod::Savings(SavingsAccount {
            id: r.get(0)?,
            name: r.get(1)?,
            transaction_type: kind_at(r, 3)?,
            balance: decimal_at(r, 4)?,
            owner_id: r.get(7)?,
            sort_order: r.get(8)?,
            created_at: r.get(9)?,
            updated_at: r.get(10)?,
        })),
        "credit" => {
            let limit: Option<String> = r.get(5)?;
            let credit_limit = match limit {
                Some(s) => s
                    .parse::<Decimal>()
                    .map_err(|e| conversion_err(5, format!("Invalid limit '{}': {}", s, e)))?,
                None => Decimal::ZERO,
            };
            let billing_date: Option<u8> = r.get(6)?;
            Ok(PaymentMethod::Credit(CreditAccount {
                id: r.get(0)?,
                name: r.get(1)?,
                transaction_type: kind_at(r, 3)?,
                credit_limit,
                outstanding_balance: decimal_at(r, 4)?,
                billing_date: billing_date.unwrap_or(1),
                owner_id: r.get(7)?,
                sort_order: r.get(8)?,
                created_at: r.get(9)?,
                updated_at: r.get(10)?,
            }))
        }
        other => Err(conversion_err(2, format!("Unknown account type '{}'", other))),
    }
}

pub fn insert_payment_method(conn: &Connection, new: &NewPaymentMethod) -> Result<PaymentMethod> {
    let (name, owner_id) = match new {
        NewPaymentMethod::Savings { name, owner_id, .. }
        | NewPaymentMethod::Credit { name, owner_id, .. } => (name, *owner_id),
    };
    let name = required_name("Payment method", name)?;
    if get_owner(conn, owner_id)?.is_none() {
        return Err(LedgerError::reference("Owner", owner_id));
    }
    if payment_method_by_name(conn, owner_id, &name)?.is_some() {
        return Err(LedgerError::validation(format!(
            "Payment method '{}' already exists for owner {}",
            name, owner_id
        )));
    }
    let now = Utc::now();
    let sort_order = next_sort_order(conn, "payment_methods")?;
    match new {
        NewPaymentMethod::Savings { balance, .. } => {
            conn.execute(
                "INSERT INTO payment_methods(name, account_type, balance, owner_id, sort_order, created_at, updated_at)
                 VALUES (?1, 'savings', ?2, ?3, ?4, ?5, ?5)",
                params![name, canonical(*balance).to_string(), owner_id, sort_order, now],
            )?;
        }
        NewPaymentMethod::Credit {
            credit_limit,
            outstanding_balance,
            billing_date,
            ..
        } => {
            if !(1..=31).contains(billing_date) {
                return Err(LedgerError::validation(format!(
                    "Billing date {} must be a day of month (1-31)",
                    billing_date
                )));
            }
            conn.execute(
                "INSERT INTO payment_methods(name, account_type, balance, credit_limit, billing_date, owner_id, sort_order, created_at, updated_at)
                 VALUES (?1, 'credit', ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    name,
                    canonical(*outstanding_balance).to_string(),
                    canonical(*credit_limit).to_string(),
                    billing_date,
                    owner_id,
                    sort_order,
                    now
                ],
            )?;
        }
    }
    let id = conn.last_insert_rowid();
    get_payment_method(conn, id)?.ok_or_else(|| LedgerError::not_found("Payment method", id))
}

pub fn get_payment_method(conn: &Connection, id: PaymentMethodId) -> Result<Option<PaymentMethod>> {
    let sql = format!("SELECT {} FROM payment_methods WHERE id=?1", METHOD_COLS);
    Ok(conn
        .query_row(&sql, params![id], method_from_row)
        .optional()?)
}

pub fn payment_method_by_name(
    conn: &Connection,
    owner_id: OwnerId,
    name: &str,
) -> Result<Option<PaymentMethod>> {
    let sql = format!(
        "SELECT {} FROM payment_methods WHERE owner_id=?1 AND name=?2",
        METHOD_COLS
    );
    Ok(conn
        .query_row(&sql, params![owner_id, name.trim()], method_from_row)
        .optional()?)
}

pub fn list_payment_methods(
    conn: &Connection,
    owner_id: Option<OwnerId>,
) -> Result<Vec<PaymentMethod>> {
    let mut sql = format!("SELECT {} FROM payment_methods", METHOD_COLS);
    if owner_id.is_some() {
        sql.push_str(" WHERE owner_id=?1");
    }
    sql.push_str(" ORDER BY sort_order, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = match owner_id {
        Some(o) => stmt.query_map(params![o], method_from_row)?,
        None => stmt.query_map([], method_from_row)?,
    };
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Persists the stored balance (or amount owed) of a payment method.
pub fn save_payment_method_value(conn: &Connection, method: &PaymentMethod) -> Result<()> {
    let updated_at = match method {
        PaymentMethod::Savings(s) => s.updated_at,
        PaymentMethod::Credit(c) => c.updated_at,
    };
    let changed = conn.execute(
        "UPDATE payment_methods SET balance=?1, updated_at=?2 WHERE id=?3",
        params![
            canonical(method.ledger_value()).to_string(),
            updated_at,
            method.id()
        ],
    )?;
    if changed == 0 {
        return Err(LedgerError::reference("Payment method", method.id()));
    }
    Ok(())
}

// Bills

const BILL_COLS: &str = "id, amount, transaction_type, payment_method_id, owner_id, note, date, \
     created_at, updated_at";

fn bill_from_row(r: &Row<'_>) -> rusqlite::Result<Bill> {
    Ok(Bill {
        id: r.get(0)?,
        amount: decimal_at(r, 1)?,
        transaction_type: kind_at(r, 2)?,
        payment_method_id: r.get(3)?,
        owner_id: r.get(4)?,
        note: r.get(5)?,
        date: date_time_at(r, 6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
        category_ids: Vec::new(),
    })
}

fn link_categories(conn: &Connection, bill_id: BillId, ids: &[CategoryId]) -> Result<()> {
    let mut stmt = conn
        .prepare_cached("INSERT OR IGNORE INTO bill_categories(bill_id, category_id) VALUES (?1, ?2)")?;
    for id in ids {
        stmt.execute(params![bill_id, id])?;
    }
    Ok(())
}

fn bill_category_ids(conn: &Connection, bill_id: BillId) -> Result<Vec<CategoryId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT category_id FROM bill_categories WHERE bill_id=?1 ORDER BY category_id",
    )?;
    let rows = stmt.query_map(params![bill_id], |r| r.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Inserts a bill row and its category links exactly as given.
pub fn insert_bill(conn: &Connection, draft: &BillDraft, now: DateTime<Utc>) -> Result<BillId> {
    conn.execute(
        "INSERT INTO bills(amount, transaction_type, payment_method_id, owner_id, note, date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            canonical(draft.amount).to_string(),
            draft.transaction_type.as_str(),
            draft.payment_method_id,
            draft.owner_id,
            draft.note,
            fmt_date_time(&draft.date),
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    link_categories(conn, id, &draft.category_ids)?;
    Ok(id)
}

pub fn get_bill(conn: &Connection, id: BillId) -> Result<Option<Bill>> {
    let sql = format!("SELECT {} FROM bills WHERE id=?1", BILL_COLS);
    let bill = conn.query_row(&sql, params![id], bill_from_row).optional()?;
    match bill {
        Some(mut b) => {
            b.category_ids = bill_category_ids(conn, b.id)?;
            Ok(Some(b))
        }
        None => Ok(None),
    }
}

/// Rewrites every column of an existing bill and replaces its category links.
pub fn update_bill(conn: &Connection, bill: &Bill) -> Result<()> {
    let changed = conn.execute(
        "UPDATE bills SET amount=?1, transaction_type=?2, payment_method_id=?3, owner_id=?4,
         note=?5, date=?6, updated_at=?7 WHERE id=?8",
        params![
            canonical(bill.amount).to_string(),
            bill.transaction_type.as_str(),
            bill.payment_method_id,
            bill.owner_id,
            bill.note,
            fmt_date_time(&bill.date),
            bill.updated_at,
            bill.id
        ],
    )?;
    if changed == 0 {
        return Err(LedgerError::not_found("Bill", bill.id));
    }
    conn.execute(
        "DELETE FROM bill_categories WHERE bill_id=?1",
        params![bill.id],
    )?;
    link_categories(conn, bill.id, &bill.category_ids)?;
    Ok(())
}

pub fn delete_bill(conn: &Connection, id: BillId) -> Result<bool> {
    conn.execute("DELETE FROM bill_categories WHERE bill_id=?1", params![id])?;
    let n = conn.execute("DELETE FROM bills WHERE id=?1", params![id])?;
    Ok(n > 0)
}

pub fn list_bills(conn: &Connection, filter: &BillFilter) -> Result<Vec<Bill>> {
    let mut sql = format!("SELECT {} FROM bills WHERE 1=1", BILL_COLS);
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(o) = filter.owner_id {
        sql.push_str(" AND owner_id=?");
        args.push(Box::new(o));
    }
    if let Some(p) = filter.payment_method_id {
        sql.push_str(" AND payment_method_id=?");
        args.push(Box::new(p));
    }
    if let Some(t) = filter.transaction_type {
        sql.push_str(" AND transaction_type=?");
        args.push(Box::new(t.as_str()));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut links: HashMap<BillId, Vec<CategoryId>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT bill_id, category_id FROM bill_categories ORDER BY bill_id, category_id",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(r) = rows.next()? {
            let bill_id: BillId = r.get(0)?;
            let cat_id: CategoryId = r.get(1)?;
            links.entry(bill_id).or_default().push(cat_id);
        }
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
        bill_from_row,
    )?;
    let mut out = Vec::new();
    for row in rows {
        let mut bill = row?;
        bill.category_ids = links.remove(&bill.id).unwrap_or_default();
        if filter.matches(&bill) {
            out.push(bill);
        }
    }
    Ok(out)
}

/// Finds a bill with the same identity tuple used for import de-duplication.
pub fn find_duplicate(
    conn: &Connection,
    date: &NaiveDateTime,
    amount: Decimal,
    kind: TransactionType,
    owner_id: OwnerId,
    payment_method_id: PaymentMethodId,
) -> Result<Option<BillId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM bills WHERE date=?1 AND amount=?2 AND transaction_type=?3
         AND owner_id=?4 AND payment_method_id=?5 ORDER BY id LIMIT 1",
    )?;
    Ok(stmt
        .query_row(
            params![
                fmt_date_time(date),
                canonical(amount).to_string(),
                kind.as_str(),
                owner_id,
                payment_method_id
            ],
            |r| r.get(0),
        )
        .optional()?)
}

pub fn count_bills(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM bills", [], |r| r.get(0))?)
}

// Whole-database helpers

pub fn clear_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM bill_categories;
         DELETE FROM bills;
         DELETE FROM payment_methods;
         DELETE FROM categories;
         DELETE FROM owners;",
    )?;
    Ok(())
}

pub fn restore_owner(conn: &Connection, o: &Owner) -> Result<()> {
    conn.execute(
        "INSERT INTO owners(id, name, sort_order, created_at, updated_at) VALUES (?1,?2,?3,?4,?5)",
        params![o.id, o.name, o.sort_order, o.created_at, o.updated_at],
    )?;
    Ok(())
}

pub fn restore_category(conn: &Connection, c: &Category) -> Result<()> {
    conn.execute(
        "INSERT INTO categories(id, name, transaction_type, sort_order, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            c.id,
            c.name,
            c.transaction_type.as_str(),
            c.sort_order,
            c.created_at,
            c.updated_at
        ],
    )?;
    Ok(())
}

pub fn restore_payment_method(conn: &Connection, m: &PaymentMethod) -> Result<()> {
    match m {
        PaymentMethod::Savings(s) => {
            conn.execute(
                "INSERT INTO payment_methods(id, name, account_type, transaction_type, balance, owner_id, sort_order, created_at, updated_at)
                 VALUES (?1,?2,'savings',?3,?4,?5,?6,?7,?8)",
                params![
                    s.id,
                    s.name,
                    s.transaction_type.as_str(),
                    canonical(s.balance).to_string(),
                    s.owner_id,
                    s.sort_order,
                    s.created_at,
                    s.updated_at
                ],
            )?;
        }
        PaymentMethod::Credit(c) => {
            conn.execute(
                "INSERT INTO payment_methods(id, name, account_type, transaction_type, balance, credit_limit, billing_date, owner_id, sort_order, created_at, updated_at)
                 VALUES (?1,?2,'credit',?3,?4,?5,?6,?7,?8,?9,?10)",
                params![
                    c.id,
                    c.name,
                    c.transaction_type.as_str(),
                    canonical(c.outstanding_balance).to_string(),
                    canonical(c.credit_limit).to_string(),
                    c.billing_date,
                    c.owner_id,
                    c.sort_order,
                    c.created_at,
                    c.updated_at
                ],
            )?;
        }
    }
    Ok(())
}

/// Stores the amount with the same sign convention as recorded bills so
/// duplicate detection and amends see restored rows like any other.
pub fn restore_bill(conn: &Connection, b: &Bill) -> Result<()> {
    conn.execute(
        "INSERT INTO bills(id, amount, transaction_type, payment_method_id, owner_id, note, date, created_at, updated_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
        params![
            b.id,
            orient(b.transaction_type, b.amount).to_string(),
            b.transaction_type.as_str(),
            b.payment_method_id,
            b.owner_id,
            b.note,
            fmt_date_time(&b.date),
            b.created_at,
            b.updated_at
        ],
    )?;
    link_categories(conn, b.id, &b.category_ids)?;
    Ok(())
}

/// First-run data: one owner, a cash account and a starter category set.
/// Does nothing when any owner already exists.
pub fn seed_defaults(conn: &Connection) -> Result<bool> {
    if !list_owners(conn)?.is_empty() {
        return Ok(false);
    }
    let owner = insert_owner(conn, "Me")?;
    insert_payment_method(conn, &NewPaymentMethod::savings("Cash", owner.id, Decimal::ZERO))?;
    let defaults = [
        ("Food", TransactionType::Expense),
        ("Transport", TransactionType::Expense),
        ("Shopping", TransactionType::Expense),
        ("Entertainment", TransactionType::Expense),
        ("Housing", TransactionType::Expense),
        ("Salary", TransactionType::Income),
        ("Bonus", TransactionType::Income),
        ("Repayment", TransactionType::Excluded),
        ("Transfer", TransactionType::Excluded),
    ];
    for (name, kind) in defaults {
        insert_category(conn, name, kind)?;
    }
    Ok(true)
}
