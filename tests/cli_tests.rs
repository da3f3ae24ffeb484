// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billbook::config::{self, Settings};
use billbook::db::Store;
use billbook::ledger::Ledger;
use billbook::{cli, commands, store};
use rust_decimal::Decimal;
use std::path::PathBuf;

fn seeded() -> Ledger {
    let store = Store::open_in_memory().unwrap();
    store::seed_defaults(store.conn()).unwrap();
    Ledger::new(store)
}

fn run(ledger: &mut Ledger, args: &[&str]) {
    let mut argv = vec!["billbook"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("owner", sub)) => commands::owners::handle(ledger.conn(), sub).unwrap(),
        Some(("category", sub)) => commands::categories::handle(ledger.conn(), sub).unwrap(),
        Some(("method", sub)) => commands::methods::handle(ledger.conn(), sub).unwrap(),
        Some(("bill", sub)) => commands::bills::handle(ledger, sub).unwrap(),
        Some(("quick", sub)) => commands::quick::handle(ledger, sub).unwrap(),
        Some(("config", sub)) => commands::config::handle(ledger.conn(), sub).unwrap(),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn list_rows(ledger: &Ledger, args: &[&str]) -> Vec<commands::bills::BillRow> {
    let mut argv = vec!["billbook", "bill", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, bill_m) = matches.subcommand().unwrap();
    let (_, list_m) = bill_m.subcommand().unwrap();
    commands::bills::query_rows(ledger.conn(), list_m).unwrap()
}

fn balance(ledger: &Ledger, owner: &str, method: &str) -> Decimal {
    let o = store::owner_by_name(ledger.conn(), owner).unwrap().unwrap();
    store::payment_method_by_name(ledger.conn(), o.id, method)
        .unwrap()
        .unwrap()
        .ledger_value()
}

#[test]
fn bill_lifecycle_through_commands() {
    let mut ledger = seeded();
    run(&mut ledger, &["method", "add-credit", "--owner", "Me", "--name", "Visa", "--limit", "1000", "--billing-date", "12"]);
    run(&mut ledger, &[
        "bill", "add", "--owner", "Me", "--method", "Cash", "--amount", "12.5",
        "--categories", "Food", "--date", "2024-04-01 12:00", "--note", "lunch",
    ]);
    run(&mut ledger, &[
        "bill", "add", "--owner", "Me", "--method", "Visa", "--amount", "60",
        "--categories", "Shopping,Entertainment", "--date", "2024-04-02",
    ]);
    assert_eq!(balance(&ledger, "Me", "Cash"), Decimal::new(-125, 1));
    assert_eq!(balance(&ledger, "Me", "Visa"), Decimal::from(60));

    let rows = list_rows(&ledger, &[]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2024-04-02 00:00:00");
    assert_eq!(rows[0].categories, "Shopping,Entertainment");
    assert_eq!(rows[1].amount, "-12.5");
    assert_eq!(rows[1].note, "lunch");

    let lunch_id = rows[1].id.to_string();
    run(&mut ledger, &["bill", "edit", &lunch_id, "--method", "Visa", "--amount", "20", "--clear-note"]);
    assert_eq!(balance(&ledger, "Me", "Cash"), Decimal::ZERO);
    assert_eq!(balance(&ledger, "Me", "Visa"), Decimal::from(80));
    assert_eq!(list_rows(&ledger, &["--method", "Visa", "--owner", "Me"]).len(), 2);

    run(&mut ledger, &["bill", "rm", &lunch_id]);
    assert_eq!(balance(&ledger, "Me", "Visa"), Decimal::from(60));
}

#[test]
fn list_filters_and_limit() {
    let mut ledger = seeded();
    for (day, cat, kind) in [
        ("2024-01-05", "Food", "expense"),
        ("2024-02-05", "Salary", "income"),
        ("2024-03-05", "Food", "expense"),
    ] {
        run(&mut ledger, &[
            "bill", "add", "--owner", "Me", "--method", "Cash", "--amount", "10",
            "--categories", cat, "--type", kind, "--date", day,
        ]);
    }
    assert_eq!(list_rows(&ledger, &["--limit", "2"]).len(), 2);
    assert_eq!(list_rows(&ledger, &["--type", "income"]).len(), 1);
    assert_eq!(list_rows(&ledger, &["--category", "Food"]).len(), 2);
    let feb = list_rows(&ledger, &["--from", "2024-02-01", "--to", "2024-03-05"]);
    assert_eq!(feb.len(), 2);
    assert_eq!(feb[0].date, "2024-03-05 00:00:00");
}

#[test]
fn stats_command_applies_filters() {
    let mut ledger = seeded();
    run(&mut ledger, &["owner", "add", "Kim"]);
    run(&mut ledger, &["method", "add-savings", "--owner", "Kim", "--name", "Bank", "--balance", "50"]);
    run(&mut ledger, &[
        "bill", "add", "--owner", "Me", "--method", "Cash", "--amount", "30",
        "--categories", "Food,Transport", "--date", "2024-04-01",
    ]);
    run(&mut ledger, &[
        "bill", "add", "--owner", "Kim", "--method", "Bank", "--amount", "5",
        "--categories", "Food", "--date", "2024-04-01",
    ]);

    let matches = cli::build_cli().get_matches_from(["billbook", "stats", "--owner", "Me"]);
    let (_, stats_m) = matches.subcommand().unwrap();
    let stats = commands::stats::compute(ledger.conn(), stats_m).unwrap();
    assert_eq!(stats.bill_count, 1);
    assert_eq!(stats.total_expense, Decimal::from(30));
    assert_eq!(stats.by_category.len(), 2);
    assert!(stats.by_category.iter().all(|c| c.amount == Decimal::from(30)));

    let matches = cli::build_cli().get_matches_from(["billbook", "stats"]);
    let (_, stats_m) = matches.subcommand().unwrap();
    let stats = commands::stats::compute(ledger.conn(), stats_m).unwrap();
    assert_eq!(stats.total_expense, Decimal::from(35));
}

#[test]
fn quick_uses_default_owner_setting() {
    let mut ledger = seeded();
    run(&mut ledger, &["owner", "add", "Kim"]);
    run(&mut ledger, &["method", "add-savings", "--owner", "Kim", "--name", "Wallet", "--balance", "20"]);
    run(&mut ledger, &["config", "set", "default_owner", "Kim"]);

    let settings = Settings::load(ledger.conn()).unwrap();
    let owner = commands::quick::resolve_owner(ledger.conn(), None, &settings).unwrap();
    assert_eq!(owner.name, "Kim");

    run(&mut ledger, &["quick", "--item", "bus", "--date", "2024-04-01 08:00"]);
    assert_eq!(balance(&ledger, "Kim", "Wallet"), Decimal::from(18));
    assert_eq!(balance(&ledger, "Me", "Cash"), Decimal::ZERO);

    run(&mut ledger, &["quick", "--owner", "Me", "--item", "Coffee"]);
    assert_eq!(balance(&ledger, "Me", "Cash"), Decimal::from(-15));
}

#[test]
fn config_set_rejects_unknown_keys() {
    let ledger = seeded();
    let matches =
        cli::build_cli().get_matches_from(["billbook", "config", "set", "colour", "blue"]);
    let (_, config_m) = matches.subcommand().unwrap();
    assert!(commands::config::handle(ledger.conn(), config_m).is_err());
    assert!(config::get_setting(ledger.conn(), "colour").unwrap().is_none());
}

#[test]
fn global_db_flag_parses_anywhere() {
    let matches = cli::build_cli().get_matches_from(["billbook", "doctor", "--db", "/tmp/x.sqlite"]);
    assert_eq!(
        matches.get_one::<PathBuf>("db"),
        Some(&PathBuf::from("/tmp/x.sqlite"))
    );
}

#[test]
fn backup_dir_defaults_next_to_database() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("books.sqlite")).unwrap();
    assert_eq!(
        commands::backup::backup_dir(&store, None).unwrap(),
        dir.path().join("backups")
    );
    let explicit = PathBuf::from("/somewhere/else");
    assert_eq!(
        commands::backup::backup_dir(&store, Some(&explicit)).unwrap(),
        explicit
    );
}

#[test]
fn doctor_reports_dangling_rows() {
    let ledger = seeded();
    assert!(commands::doctor::find_issues(ledger.conn()).unwrap().is_empty());

    let conn = ledger.conn();
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO bills(amount, transaction_type, payment_method_id, owner_id, note, date, created_at, updated_at)
         VALUES ('-1', 'expense', 77, 1, NULL, '2024-01-01 00:00:00', '2024-01-01 00:00:00+00:00', '2024-01-01 00:00:00+00:00');
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();
    let kinds: Vec<_> = commands::doctor::find_issues(conn)
        .unwrap()
        .into_iter()
        .map(|i| i.kind)
        .collect();
    assert_eq!(kinds, vec!["bill_missing_payment_method", "bill_without_category"]);
}
