// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billbook::codec::{NameIndex, Snapshot, tabular};
use billbook::db::Store;
use billbook::error::LedgerError;
use billbook::ledger::{ImportSummary, Ledger};
use billbook::models::{BillDraft, BillFilter, BillPatch, NewPaymentMethod, TransactionType};
use billbook::{cli, commands::exporter, store};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::tempdir;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Two owners, a savings and a credit method, and four bills.
fn populated() -> Ledger {
    let store = Store::open_in_memory().unwrap();
    let conn = store.conn();
    let alice = store::insert_owner(conn, "Alice").unwrap().id;
    let bob = store::insert_owner(conn, "Bob").unwrap().id;
    let cash = store::insert_payment_method(conn, &NewPaymentMethod::savings("Cash", alice, d("100")))
        .unwrap()
        .id();
    let visa = store::insert_payment_method(conn, &NewPaymentMethod::credit("Visa", bob, d("2000"), 20))
        .unwrap()
        .id();
    let food = store::insert_category(conn, "Food", TransactionType::Expense).unwrap().id;
    let fun = store::insert_category(conn, "Fun", TransactionType::Expense).unwrap().id;
    let salary = store::insert_category(conn, "Salary", TransactionType::Income).unwrap().id;
    let transfer = store::insert_category(conn, "Transfer", TransactionType::Excluded)
        .unwrap()
        .id;

    let mut ledger = Ledger::new(store);
    let day = |n: u32, h: u32| {
        NaiveDate::from_ymd_opt(2024, 5, n)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    };
    let bills = [
        (alice, cash, TransactionType::Expense, "12.30", vec![food, fun], Some("pizza, \"large\""), day(1, 19)),
        (alice, cash, TransactionType::Income, "2500", vec![salary], None, day(2, 9)),
        (bob, visa, TransactionType::Expense, "80", vec![fun], Some("concert"), day(3, 21)),
        (bob, visa, TransactionType::Excluded, "-25", vec![transfer], None, day(4, 8)),
    ];
    for (owner, pm, kind, amount, cats, note, date) in bills {
        ledger
            .record_bill(BillDraft {
                amount: d(amount),
                transaction_type: kind,
                payment_method_id: pm,
                category_ids: cats,
                owner_id: owner,
                note: note.map(str::to_string),
                date,
            })
            .unwrap();
    }
    ledger
}

fn export_csv(ledger: &Ledger) -> String {
    let bills = ledger.bills(&BillFilter::default()).unwrap();
    let names = NameIndex::load(ledger.conn()).unwrap();
    let mut buf = Vec::new();
    tabular::write_bills(&mut buf, &bills, &names).unwrap();
    String::from_utf8(buf).unwrap()
}

/// (date, amount, type, owner, method, categories) by name.
fn tuples(ledger: &Ledger) -> Vec<(String, Decimal, TransactionType, String, String, Vec<String>)> {
    let names = NameIndex::load(ledger.conn()).unwrap();
    let mut out: Vec<_> = ledger
        .bills(&BillFilter::default())
        .unwrap()
        .into_iter()
        .map(|b| {
            let mut cats: Vec<String> = b
                .category_ids
                .iter()
                .map(|c| names.categories[c].clone())
                .collect();
            cats.sort();
            (
                b.date.to_string(),
                b.amount,
                b.transaction_type,
                names.owners[&b.owner_id].clone(),
                names.methods[&b.payment_method_id].clone(),
                cats,
            )
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

#[test]
fn csv_uses_signed_amounts_and_labels() {
    let ledger = populated();
    let text = export_csv(&ledger);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "date,time,amount,type,categories,owner,payment_method,note"
    );
    assert_eq!(
        lines[1],
        r#"2024-05-01,19:30:00,-12.3,Expense,"Food,Fun",Alice,Cash,"pizza, ""large""""#
    );
    assert_eq!(lines[2], "2024-05-02,09:30:00,2500,Income,Salary,Alice,Cash,");
    assert_eq!(lines[3], "2024-05-03,21:30:00,-80,Expense,Fun,Bob,Visa,concert");
    assert_eq!(lines[4], "2024-05-04,08:30:00,-25,Excluded,Transfer,Bob,Visa,");
}

#[test]
fn csv_reimport_into_same_store_skips_everything() {
    let mut ledger = populated();
    let rows = tabular::read_rows(export_csv(&ledger).as_bytes()).unwrap();
    let summary = ledger.bulk_import(&rows).unwrap();
    assert_eq!(
        summary,
        ImportSummary {
            success: 0,
            failed: 0,
            skipped: 4,
            cancelled: false
        }
    );
}

#[test]
fn csv_round_trip_reproduces_bill_tuples() {
    let source = populated();
    let rows = tabular::read_rows(export_csv(&source).as_bytes()).unwrap();

    let mut fresh = Ledger::new(Store::open_in_memory().unwrap());
    let summary = fresh.bulk_import(&rows).unwrap();
    assert_eq!(summary.success, 4);
    assert_eq!(tuples(&fresh), tuples(&source));

    let notes: Vec<_> = fresh
        .bills(&BillFilter::default())
        .unwrap()
        .into_iter()
        .filter_map(|b| b.note)
        .collect();
    assert!(notes.contains(&"pizza, \"large\"".to_string()));
}

#[test]
fn json_export_restores_ids_and_balances() {
    let ledger = populated();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    let matches = cli::build_cli().get_matches_from([
        "billbook", "export", "bills", "--format", "json", "--out", &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(ledger.conn(), export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let snapshot = Snapshot::read_from_path(&out_path).unwrap();
    assert_eq!(snapshot.version, "1.0");
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert!(raw["data"]["paymentMethods"].is_array());
    assert!(raw["timestamp"].is_string());

    let mut target = Store::open_in_memory().unwrap();
    store::insert_owner(target.conn(), "Someone else").unwrap();
    let summary = snapshot.restore_into(target.conn_mut()).unwrap();
    assert_eq!(summary.bills, 4);
    assert_eq!(summary.owners, 2);

    let restored = Ledger::new(target);
    assert!(store::owner_by_name(restored.conn(), "Someone else").unwrap().is_none());
    assert_eq!(
        store::list_payment_methods(restored.conn(), None).unwrap(),
        store::list_payment_methods(ledger.conn(), None).unwrap()
    );
    assert_eq!(
        restored.bills(&BillFilter::default()).unwrap(),
        ledger.bills(&BillFilter::default()).unwrap()
    );
}

#[test]
fn restored_expense_magnitudes_still_dedup_against_csv() {
    let original = populated();
    let mut snapshot = Snapshot::capture(original.conn()).unwrap();
    for bill in &mut snapshot.data.bills {
        if bill.transaction_type == TransactionType::Expense {
            bill.amount = bill.amount.abs();
        }
    }
    let snapshot = Snapshot::parse(&snapshot.to_json().unwrap()).unwrap();

    let mut target = Store::open_in_memory().unwrap();
    snapshot.restore_into(target.conn_mut()).unwrap();
    let mut restored = Ledger::new(target);
    assert_eq!(
        restored.bills(&BillFilter::default()).unwrap(),
        original.bills(&BillFilter::default()).unwrap()
    );

    let rows = tabular::read_rows(export_csv(&original).as_bytes()).unwrap();
    assert_eq!(
        restored.bulk_import(&rows).unwrap(),
        ImportSummary {
            success: 0,
            failed: 0,
            skipped: 4,
            cancelled: false,
        }
    );
    assert_eq!(
        store::list_payment_methods(restored.conn(), None).unwrap(),
        store::list_payment_methods(original.conn(), None).unwrap()
    );

    let pizza = restored
        .bills(&BillFilter::default())
        .unwrap()
        .into_iter()
        .find(|b| b.amount == d("-12.3"))
        .unwrap();
    restored
        .amend_bill(
            pizza.id,
            BillPatch {
                note: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(restored.bill(pizza.id).unwrap().unwrap().amount, d("-12.3"));
}

#[test]
fn restore_requires_version_and_data() {
    let err = Snapshot::parse(r#"{"timestamp":"2024-01-01T00:00:00Z","data":{}}"#).unwrap_err();
    assert!(matches!(err, LedgerError::Format(_)));
    let err = Snapshot::parse(r#"{"version":"1.0"}"#).unwrap_err();
    assert!(matches!(err, LedgerError::Format(_)));
    let err = Snapshot::parse("not json").unwrap_err();
    assert!(matches!(err, LedgerError::Format(_)));
    let err = Snapshot::parse(r#"{"version":"2.0","data":{}}"#).unwrap_err();
    assert!(matches!(err, LedgerError::Format(_)));
}

#[test]
fn missing_arrays_restore_as_empty() {
    let snapshot = Snapshot::parse(r#"{"version":"1.0","data":{"owners":[]}}"#).unwrap();
    let mut ledger = populated();
    snapshot.restore_into(ledger.store_mut().conn_mut()).unwrap();
    assert_eq!(store::count_bills(ledger.conn()).unwrap(), 0);
    assert!(store::list_owners(ledger.conn()).unwrap().is_empty());
}

#[test]
fn dangling_reference_rejected_before_clearing() {
    let mut ledger = populated();
    let mut snapshot = Snapshot::capture(ledger.conn()).unwrap();
    snapshot.data.categories.retain(|c| c.name != "Fun");
    let json = snapshot.to_json().unwrap();

    let err = Snapshot::parse(&json).unwrap_err();
    assert!(matches!(err, LedgerError::Format(_)));
    let err = snapshot
        .restore_into(ledger.store_mut().conn_mut())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Format(_)));
    assert_eq!(store::count_bills(ledger.conn()).unwrap(), 4);
}

#[test]
fn export_rejects_unknown_format() {
    let ledger = populated();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    assert!(exporter::export_bills(ledger.conn(), "xml", &out_path).is_err());
    assert!(!out_path.exists());
}
