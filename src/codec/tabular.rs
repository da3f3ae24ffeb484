// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::balance::canonical;
use crate::error::{LedgerError, Result};
use crate::models::{Bill, BillDraft, CategoryId, OwnerId, PaymentMethodId, TransactionType};
use crate::store;

pub const HEADER: [&str; 8] = [
    "date",
    "time",
    "amount",
    "type",
    "categories",
    "owner",
    "payment_method",
    "note",
];

/// Columns up to and including the payment method must be present.
const REQUIRED_FIELDS: usize = 7;

/// One undecoded CSV line. Parsing happens per row during import so that a
/// bad line only fails itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    pub date: String,
    pub time: String,
    pub amount: String,
    pub kind: String,
    pub categories: String,
    pub owner: String,
    pub payment_method: String,
    pub note: String,
    pub field_count: usize,
    /// Set when the line could not be decoded as UTF-8.
    pub decode_error: Option<String>,
}

impl CsvRow {
    pub fn from_record(rec: &StringRecord) -> Self {
        let field = |i: usize| rec.get(i).unwrap_or("").to_string();
        // An unquoted note containing commas spills into extra fields.
        let note = if rec.len() > HEADER.len() {
            rec.iter().skip(HEADER.len() - 1).collect::<Vec<_>>().join(",")
        } else {
            field(7)
        };
        Self {
            date: field(0),
            time: field(1),
            amount: field(2),
            kind: field(3),
            categories: field(4),
            owner: field(5),
            payment_method: field(6),
            note,
            field_count: rec.len(),
            decode_error: None,
        }
    }

    /// Decodes a raw line. Invalid UTF-8 yields a row that fails on its own
    /// at import time instead of stopping the read.
    pub fn from_byte_record(rec: &ByteRecord) -> Self {
        match rec.iter().map(std::str::from_utf8).collect::<std::result::Result<Vec<_>, _>>() {
            Ok(fields) => Self::from_record(&StringRecord::from(fields)),
            Err(err) => Self {
                field_count: rec.len(),
                decode_error: Some(err.to_string()),
                ..Self::default()
            },
        }
    }

    /// Resolves names against the store and parses every field. Expense and
    /// income amounts are taken as magnitudes, excluded keeps its sign.
    pub fn to_draft(&self, conn: &Connection) -> Result<BillDraft> {
        if let Some(err) = &self.decode_error {
            return Err(LedgerError::validation(format!("Row is not valid UTF-8: {}", err)));
        }
        if self.field_count < REQUIRED_FIELDS {
            return Err(LedgerError::validation(format!(
                "Expected at least {} columns, got {}",
                REQUIRED_FIELDS, self.field_count
            )));
        }
        let date = parse_date_time(&self.date, &self.time)?;
        let raw_amount = self.amount.trim();
        let amount = raw_amount
            .parse::<Decimal>()
            .map_err(|_| LedgerError::validation(format!("Invalid amount '{}'", raw_amount)))?;
        let kind = TransactionType::from_label(&self.kind).ok_or_else(|| {
            LedgerError::validation(format!("Unknown transaction type '{}'", self.kind.trim()))
        })?;
        let amount = match kind {
            TransactionType::Expense | TransactionType::Income => amount.abs(),
            TransactionType::Excluded => amount,
        };

        let names = split_categories(&self.categories);
        if names.is_empty() {
            return Err(LedgerError::validation("Row has no categories"));
        }
        let owner_name = self.owner.trim();
        if owner_name.is_empty() {
            return Err(LedgerError::validation("Row has no owner"));
        }
        let method_name = self.payment_method.trim();
        if method_name.is_empty() {
            return Err(LedgerError::validation("Row has no payment method"));
        }

        let owner = store::owner_by_name(conn, owner_name)?
            .ok_or_else(|| LedgerError::reference("Owner", owner_name))?;
        let method = store::payment_method_by_name(conn, owner.id, method_name)?
            .ok_or_else(|| LedgerError::reference("Payment method", method_name))?;
        let mut category_ids = Vec::with_capacity(names.len());
        for name in &names {
            let cat = store::category_by_name(conn, name)?
                .ok_or_else(|| LedgerError::reference("Category", name))?;
            category_ids.push(cat.id);
        }

        let note = Some(self.note.trim().to_string()).filter(|n| !n.is_empty());
        Ok(BillDraft {
            amount,
            transaction_type: kind,
            payment_method_id: method.id(),
            category_ids,
            owner_id: owner.id,
            note,
            date,
        })
    }
}

fn parse_date_time(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = date.trim();
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| LedgerError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", date)))?;
    let time = time.trim();
    let t = if time.is_empty() {
        NaiveTime::MIN
    } else {
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map_err(|_| {
                LedgerError::validation(format!("Invalid time '{}', expected HH:MM:SS", time))
            })?
    };
    Ok(d.and_time(t))
}

/// Splits a comma-joined category cell, dropping blanks and repeats.
pub fn split_categories(cell: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in cell.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    let mut rec = ByteRecord::new();
    while rdr.read_byte_record(&mut rec)? {
        rows.push(CsvRow::from_byte_record(&rec));
    }
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<CsvRow>> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

/// Id to name lookups needed to write bills by name.
#[derive(Debug, Default)]
pub struct NameIndex {
    pub owners: HashMap<OwnerId, String>,
    pub categories: HashMap<CategoryId, String>,
    pub methods: HashMap<PaymentMethodId, String>,
}

impl NameIndex {
    pub fn load(conn: &Connection) -> Result<Self> {
        let owners = store::list_owners(conn)?
            .into_iter()
            .map(|o| (o.id, o.name))
            .collect();
        let categories = store::list_categories(conn)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let methods = store::list_payment_methods(conn, None)?
            .into_iter()
            .map(|m| (m.id(), m.name().to_string()))
            .collect();
        Ok(Self {
            owners,
            categories,
            methods,
        })
    }

    fn category_names(&self, ids: &[CategoryId]) -> String {
        ids.iter()
            .filter_map(|id| self.categories.get(id).map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Signed amount as written to CSV: expenses negative, income positive,
/// excluded exactly as stored.
pub fn export_amount(bill: &Bill) -> Decimal {
    match bill.transaction_type {
        TransactionType::Expense => -bill.amount.abs(),
        TransactionType::Income => bill.amount.abs(),
        TransactionType::Excluded => bill.amount,
    }
}

/// Writes a header and one row per bill in date order. Returns rows written.
pub fn write_bills<W: Write>(writer: W, bills: &[Bill], names: &NameIndex) -> Result<usize> {
    let mut ordered: Vec<&Bill> = bills.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for bill in &ordered {
        let lookup = |m: &HashMap<i64, String>, id: i64| m.get(&id).cloned().unwrap_or_default();
        wtr.write_record([
            bill.date.format("%Y-%m-%d").to_string(),
            bill.date.format("%H:%M:%S").to_string(),
            canonical(export_amount(bill)).to_string(),
            bill.transaction_type.label().to_string(),
            names.category_names(&bill.category_ids),
            lookup(&names.owners, bill.owner_id),
            lookup(&names.methods, bill.payment_method_id),
            bill.note.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(ordered.len())
}

pub fn write_bills_to_path(path: &Path, bills: &[Bill], names: &NameIndex) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    write_bills(file, bills, names)
}
