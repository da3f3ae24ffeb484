// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billbook::codec::tabular;
use billbook::db::Store;
use billbook::ledger::{ImportSummary, Ledger, LedgerEvent};
use billbook::models::{BillFilter, PaymentMethod, TransactionType};
use billbook::{cli, commands::importer, store};
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use tempfile::NamedTempFile;

const HEADER: &str = "date,time,amount,type,categories,owner,payment_method,note";

fn ledger() -> Ledger {
    Ledger::new(Store::open_in_memory().unwrap())
}

fn csv(lines: &[&str]) -> Vec<tabular::CsvRow> {
    let text = std::iter::once(HEADER)
        .chain(lines.iter().copied())
        .collect::<Vec<_>>()
        .join("\n");
    tabular::read_rows(text.as_bytes()).unwrap()
}

fn summary(success: usize, failed: usize, skipped: usize) -> ImportSummary {
    ImportSummary {
        success,
        failed,
        skipped,
        cancelled: false,
    }
}

#[test]
fn bad_row_fails_alone_and_reimport_skips_duplicates() {
    let mut ledger = ledger();
    let rows = csv(&[
        "2024-03-01,08:15:00,-15.00,Expense,Food,Alice,Cash,coffee",
        "2024-13-45,09:00:00,-20,Expense,Food,Alice,Cash,bad date",
        "2024-03-02,18:00:00,3000,Income,Salary,Alice,Cash,",
    ]);
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(2, 1, 0));
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(0, 1, 2));
    assert_eq!(store::count_bills(ledger.conn()).unwrap(), 2);
}

#[test]
fn unknown_names_are_created_and_methods_default_to_empty_savings() {
    let mut ledger = ledger();
    let rows = csv(&["2024-03-01,12:00:00,-12.50,Expense,Snacks,Bob,Wallet,"]);
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(1, 0, 0));

    let conn = ledger.conn();
    let bob = store::owner_by_name(conn, "Bob").unwrap().unwrap();
    let wallet = store::payment_method_by_name(conn, bob.id, "Wallet")
        .unwrap()
        .unwrap();
    match &wallet {
        PaymentMethod::Savings(s) => assert_eq!(s.balance, Decimal::from_str("-12.5").unwrap()),
        other => panic!("expected savings, got {:?}", other),
    }
    let snacks = store::category_by_name(conn, "Snacks").unwrap().unwrap();
    assert_eq!(snacks.transaction_type, TransactionType::Expense);
}

#[test]
fn created_category_takes_row_type() {
    let mut ledger = ledger();
    let rows = csv(&["2024-03-01,12:00:00,500,Income,Bonus,Alice,Bank,"]);
    ledger.bulk_import(&rows).unwrap();
    let bonus = store::category_by_name(ledger.conn(), "Bonus")
        .unwrap()
        .unwrap();
    assert_eq!(bonus.transaction_type, TransactionType::Income);
}

#[test]
fn quoted_fields_keep_commas() {
    let mut ledger = ledger();
    let rows = csv(&[
        r#"2024-03-01,12:00:00,-30,Expense,"Food,Fun",Alice,Cash,"dinner, then a movie""#,
    ]);
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(1, 0, 0));
    let bills = ledger.bills(&BillFilter::default()).unwrap();
    assert_eq!(bills[0].category_ids.len(), 2);
    assert_eq!(bills[0].note.as_deref(), Some("dinner, then a movie"));
}

#[test]
fn unquoted_extra_fields_rejoin_into_note() {
    let rows = csv(&["2024-03-01,12:00:00,-30,Expense,Food,Alice,Cash,hello,world"]);
    assert_eq!(rows[0].note, "hello,world");
    assert_eq!(rows[0].payment_method, "Cash");
}

#[test]
fn short_rows_fail_and_note_column_is_optional() {
    let mut ledger = ledger();
    let rows = csv(&[
        "2024-03-01,12:00:00,-30,Expense,Food,Alice",
        "2024-03-01,13:00,-5,支出,Food,Alice,Cash",
    ]);
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(1, 1, 0));
    let bills = ledger.bills(&BillFilter::default()).unwrap();
    assert_eq!(bills[0].transaction_type, TransactionType::Expense);
    assert_eq!(bills[0].date.format("%H:%M:%S").to_string(), "13:00:00");
}

#[test]
fn unparseable_fields_count_as_failed() {
    let mut ledger = ledger();
    let rows = csv(&[
        "2024-03-01,12:00:00,abc,Expense,Food,Alice,Cash,",
        "2024-03-01,12:00:00,-1,Refund,Food,Alice,Cash,",
        "2024-03-01,25:00:00,-1,Expense,Food,Alice,Cash,",
        "2024-03-01,12:00:00,-1,Expense, ,Alice,Cash,",
    ]);
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(0, 4, 0));
}

#[test]
fn excluded_rows_keep_their_sign() {
    let mut ledger = ledger();
    let rows = csv(&[
        "2024-03-01,12:00:00,100,Income,Salary,Alice,Cash,",
        "2024-03-02,12:00:00,-40,Excluded,Transfer,Alice,Cash,",
    ]);
    ledger.bulk_import(&rows).unwrap();
    let alice = store::owner_by_name(ledger.conn(), "Alice").unwrap().unwrap();
    let cash = store::payment_method_by_name(ledger.conn(), alice.id, "Cash")
        .unwrap()
        .unwrap();
    assert_eq!(cash.ledger_value(), Decimal::from(60));
}

#[test]
fn cancelled_import_stops_before_rows() {
    let mut ledger = ledger();
    let rx = ledger.subscribe();
    let rows = csv(&["2024-03-01,12:00:00,-1,Expense,Food,Alice,Cash,"]);
    let cancel = AtomicBool::new(true);
    let s = ledger.bulk_import_with_cancel(&rows, &cancel).unwrap();
    assert!(s.cancelled);
    assert_eq!(s.success + s.failed + s.skipped, 0);
    assert_eq!(store::count_bills(ledger.conn()).unwrap(), 0);
    assert!(store::list_owners(ledger.conn()).unwrap().is_empty());
    assert!(store::list_categories(ledger.conn()).unwrap().is_empty());
    assert_eq!(rx.try_recv().unwrap(), LedgerEvent::ImportFinished(s));
}

#[test]
fn non_utf8_row_fails_alone() {
    let mut ledger = ledger();
    let mut bytes = format!("{}\n", HEADER).into_bytes();
    bytes.extend_from_slice(b"2024-03-01,08:00:00,-4,Expense,Food,Alice,Cash,tea\n");
    bytes.extend_from_slice(b"2024-03-01,09:00:00,-6,Expense,Food,Alice,Cash,caf\xe9\n");
    bytes.extend_from_slice(b"2024-03-01,10:00:00,-8,Expense,Food,Alice,Cash,cake\n");

    let rows = tabular::read_rows(bytes.as_slice()).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].decode_error.is_some());
    assert_eq!(ledger.bulk_import(&rows).unwrap(), summary(2, 1, 0));
    assert_eq!(store::count_bills(ledger.conn()).unwrap(), 2);
}

#[test]
fn importer_trims_cli_path_argument() {
    let mut ledger = ledger();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "{}\n2024-03-01,08:00:00,-4.5,Expense,Transport,Alice,Cash,bus",
        HEADER
    )
    .unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);
    let matches =
        cli::build_cli().get_matches_from(["billbook", "import", "bills", "--path", &padded]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut ledger, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    assert_eq!(store::count_bills(ledger.conn()).unwrap(), 1);
}
