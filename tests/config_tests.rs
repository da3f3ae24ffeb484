// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billbook::config::{self, Settings};
use billbook::db::{self, Store};
use billbook::error::LedgerError;
use rust_decimal::Decimal;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn defaults_apply_when_unset() {
    let store = Store::open_in_memory().unwrap();
    let s = Settings::load(store.conn()).unwrap();
    assert_eq!(s, Settings::default());
    assert_eq!(s.quick_threshold, Decimal::from(100));
    assert_eq!(s.backup_retention, 7);
    assert_eq!(s.backup_interval(), Duration::from_secs(86_400));
    assert!(s.default_owner.is_none());
}

#[test]
fn stored_values_override_defaults() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.conn();
    config::set_setting(conn, config::QUICK_THRESHOLD, "49.5").unwrap();
    config::set_setting(conn, config::BACKUP_RETENTION, " 3 ").unwrap();
    config::set_setting(conn, config::DEFAULT_OWNER, "Alice").unwrap();
    config::set_setting(conn, config::BACKUP_RETENTION, "4").unwrap();

    let s = Settings::load(conn).unwrap();
    assert_eq!(s.quick_threshold, Decimal::new(495, 1));
    assert_eq!(s.backup_retention, 4);
    assert_eq!(s.default_owner.as_deref(), Some("Alice"));
    assert_eq!(
        config::get_setting(conn, config::BACKUP_RETENTION).unwrap().as_deref(),
        Some("4")
    );
}

#[test]
fn invalid_values_and_keys_are_rejected() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.conn();
    for (key, value) in [
        (config::QUICK_THRESHOLD, "lots"),
        (config::QUICK_THRESHOLD, "-1"),
        (config::BACKUP_RETENTION, "0"),
        (config::BACKUP_INTERVAL_SECS, "soon"),
        ("base_currency", "USD"),
    ] {
        let err = config::set_setting(conn, key, value).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "{} = {}", key, value);
    }
    assert!(config::get_setting(conn, config::QUICK_THRESHOLD).unwrap().is_none());
}

#[test]
fn unopenable_database_falls_back_to_memory() {
    let dir = tempdir().unwrap();
    // A directory cannot be opened as a database file.
    let store = Store::open_or_fallback(dir.path()).unwrap();
    assert!(store.is_degraded());
    assert!(store.path().is_none());

    let err = Store::open(dir.path()).err().unwrap();
    assert!(matches!(err, LedgerError::StorageUnavailable(_)));
}

#[test]
fn explicit_database_path_is_used() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("books.sqlite");
    let store = db::open_or_init(Some(path.clone())).unwrap();
    assert!(!store.is_degraded());
    assert_eq!(store.path(), Some(path.as_path()));
    assert!(path.exists());
}
