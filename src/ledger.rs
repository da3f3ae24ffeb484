// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Keeps payment-method balances consistent with the recorded bills.
//!
//! Every mutation runs in its own `BEGIN IMMEDIATE` transaction covering the
//! bill row and the payment-method row(s) it touches, so a failure anywhere
//! leaves both untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::balance::{delta, orient, revert};
use crate::codec::tabular::{CsvRow, split_categories};
use crate::db::Store;
use crate::error::{LedgerError, Result};
use crate::models::{
    Bill, BillDraft, BillFilter, BillId, BillPatch, CategoryId, NewPaymentMethod, OwnerId,
    PaymentMethod, PaymentMethodId, TransactionType,
};
use crate::store;

/// Outcome counters of a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// Broadcast to subscribers after a mutation commits.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    BillRecorded {
        bill_id: BillId,
        payment_method_id: PaymentMethodId,
    },
    BillAmended {
        bill_id: BillId,
        balance_changed: bool,
    },
    BillRemoved {
        bill_id: BillId,
        payment_method_id: PaymentMethodId,
    },
    ImportFinished(ImportSummary),
}

pub struct Ledger {
    store: Store,
    observers: Vec<Sender<LedgerEvent>>,
}

impl Ledger {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            observers: Vec::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn conn(&self) -> &Connection {
        self.store.conn()
    }

    /// Returns a receiver of every committed ledger event. Dropping it
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<LedgerEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, event: LedgerEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn bill(&self, id: BillId) -> Result<Option<Bill>> {
        store::get_bill(self.conn(), id)
    }

    pub fn bills(&self, filter: &BillFilter) -> Result<Vec<Bill>> {
        store::list_bills(self.conn(), filter)
    }

    pub fn payment_method(&self, id: PaymentMethodId) -> Result<Option<PaymentMethod>> {
        store::get_payment_method(self.conn(), id)
    }

    pub fn record_bill(&mut self, draft: BillDraft) -> Result<BillId> {
        self.record_bill_with(|_| Ok(draft))
    }

    /// Like `record_bill`, but the draft is built inside the bill's
    /// transaction so anything `build` writes rolls back with it.
    pub fn record_bill_with<F>(&mut self, build: F) -> Result<BillId>
    where
        F: FnOnce(&Connection) -> Result<BillDraft>,
    {
        let tx = self
            .store
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let draft = build(&*tx)?;
        let (bill_id, payment_method_id) = insert_and_apply(&tx, draft, Utc::now())?;
        tx.commit()?;
        debug!(bill_id, payment_method_id, "recorded bill");
        self.notify(LedgerEvent::BillRecorded {
            bill_id,
            payment_method_id,
        });
        Ok(bill_id)
    }

    pub fn amend_bill(&mut self, id: BillId, patch: BillPatch) -> Result<()> {
        let now = Utc::now();
        let tx = self
            .store
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = store::get_bill(&tx, id)?.ok_or_else(|| LedgerError::not_found("Bill", id))?;

        let mut next = current.clone();
        if let Some(kind) = patch.transaction_type {
            next.transaction_type = kind;
        }
        next.amount = orient(
            next.transaction_type,
            patch.amount.unwrap_or(current.amount),
        );
        if let Some(pm) = patch.payment_method_id {
            next.payment_method_id = pm;
        }
        if let Some(ids) = patch.category_ids {
            next.category_ids = ids;
        }
        if let Some(owner) = patch.owner_id {
            next.owner_id = owner;
        }
        if let Some(note) = patch.note {
            next.note = clean_note(note);
        }
        if let Some(date) = patch.date {
            next.date = whole_seconds(date);
        }
        next.category_ids = dedup_categories(next.category_ids);
        validate_references(&tx, next.owner_id, &next.category_ids)?;

        let balance_changed = next.amount != current.amount
            || next.payment_method_id != current.payment_method_id
            || next.transaction_type != current.transaction_type;

        if balance_changed {
            let mut old = load_method(&tx, current.payment_method_id)?;
            old.apply_delta(revert(
                old.account_type(),
                current.transaction_type,
                current.amount,
            ));
            old.touch(now);
            store::save_payment_method_value(&tx, &old)?;

            // Re-read so a same-account amend sees the reverted value.
            let mut new = load_method(&tx, next.payment_method_id)?;
            new.apply_delta(delta(new.account_type(), next.transaction_type, next.amount));
            new.touch(now);
            store::save_payment_method_value(&tx, &new)?;
        }

        next.updated_at = now;
        store::update_bill(&tx, &next)?;
        tx.commit()?;
        debug!(bill_id = id, balance_changed, "amended bill");
        self.notify(LedgerEvent::BillAmended {
            bill_id: id,
            balance_changed,
        });
        Ok(())
    }

    pub fn remove_bill(&mut self, id: BillId) -> Result<()> {
        let tx = self
            .store
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let bill = store::get_bill(&tx, id)?.ok_or_else(|| LedgerError::not_found("Bill", id))?;
        let mut method = load_method(&tx, bill.payment_method_id)?;
        method.apply_delta(revert(
            method.account_type(),
            bill.transaction_type,
            bill.amount,
        ));
        method.touch(Utc::now());
        store::save_payment_method_value(&tx, &method)?;
        store::delete_bill(&tx, id)?;
        tx.commit()?;
        debug!(bill_id = id, "removed bill");
        self.notify(LedgerEvent::BillRemoved {
            bill_id: id,
            payment_method_id: bill.payment_method_id,
        });
        Ok(())
    }

    pub fn bulk_import(&mut self, rows: &[CsvRow]) -> Result<ImportSummary> {
        let never = AtomicBool::new(false);
        self.bulk_import_with_cancel(rows, &never)
    }

    /// Two passes: create every owner, payment method and category the rows
    /// name, then commit each row in its own transaction. Bad rows and
    /// duplicates only bump counters. `cancel` is checked between rows.
    pub fn bulk_import_with_cancel(
        &mut self,
        rows: &[CsvRow],
        cancel: &AtomicBool,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            info!(total = rows.len(), "import cancelled before start");
            self.notify(LedgerEvent::ImportFinished(summary));
            return Ok(summary);
        }
        self.create_missing_references(rows)?;

        for (idx, row) in rows.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                summary.cancelled = true;
                info!(processed = idx, total = rows.len(), "import cancelled");
                break;
            }
            match self.import_row(row) {
                Ok(true) => summary.success += 1,
                Ok(false) => summary.skipped += 1,
                Err(err) => {
                    if err.is_row_local() {
                        warn!(row = idx + 1, error = %err, "import row rejected");
                    } else {
                        error!(row = idx + 1, error = %err, "import row failed in storage");
                    }
                    summary.failed += 1;
                }
            }
        }
        info!(
            success = summary.success,
            failed = summary.failed,
            skipped = summary.skipped,
            "import finished"
        );
        self.notify(LedgerEvent::ImportFinished(summary));
        Ok(summary)
    }

    fn create_missing_references(&mut self, rows: &[CsvRow]) -> Result<()> {
        let tx = self
            .store
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut created = 0usize;
        for row in rows {
            let owner_name = row.owner.trim();
            if owner_name.is_empty() {
                continue;
            }
            let owner = match store::owner_by_name(&tx, owner_name)? {
                Some(o) => o,
                None => {
                    created += 1;
                    store::insert_owner(&tx, owner_name)?
                }
            };

            let method_name = row.payment_method.trim();
            if !method_name.is_empty()
                && store::payment_method_by_name(&tx, owner.id, method_name)?.is_none()
            {
                // Unknown methods always become empty savings accounts.
                store::insert_payment_method(
                    &tx,
                    &NewPaymentMethod::savings(method_name, owner.id, Decimal::ZERO),
                )?;
                created += 1;
            }

            let kind = TransactionType::from_label(&row.kind).unwrap_or_default();
            for name in split_categories(&row.categories) {
                if store::category_by_name(&tx, &name)?.is_none() {
                    store::insert_category(&tx, &name, kind)?;
                    created += 1;
                }
            }
        }
        tx.commit()?;
        if created > 0 {
            info!(created, "created entities referenced by import");
        }
        Ok(())
    }

    /// `Ok(true)` when committed, `Ok(false)` when skipped as a duplicate.
    fn import_row(&mut self, row: &CsvRow) -> Result<bool> {
        let tx = self
            .store
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let draft = row.to_draft(&tx)?;
        let existing = store::find_duplicate(
            &tx,
            &whole_seconds(draft.date),
            orient(draft.transaction_type, draft.amount),
            draft.transaction_type,
            draft.owner_id,
            draft.payment_method_id,
        )?;
        if let Some(bill_id) = existing {
            debug!(bill_id, "duplicate import row skipped");
            return Ok(false);
        }
        insert_and_apply(&tx, draft, Utc::now())?;
        tx.commit()?;
        Ok(true)
    }
}

/// Insert a bill and apply its delta inside the caller's transaction.
fn insert_and_apply(
    conn: &Connection,
    mut draft: BillDraft,
    now: DateTime<Utc>,
) -> Result<(BillId, PaymentMethodId)> {
    draft.category_ids = dedup_categories(draft.category_ids);
    validate_references(conn, draft.owner_id, &draft.category_ids)?;
    let mut method = load_method(conn, draft.payment_method_id)?;

    draft.amount = orient(draft.transaction_type, draft.amount);
    draft.date = whole_seconds(draft.date);
    draft.note = clean_note(draft.note);

    let bill_id = store::insert_bill(conn, &draft, now)?;
    method.apply_delta(delta(
        method.account_type(),
        draft.transaction_type,
        draft.amount,
    ));
    method.touch(now);
    store::save_payment_method_value(conn, &method)?;
    Ok((bill_id, draft.payment_method_id))
}

fn load_method(conn: &Connection, id: PaymentMethodId) -> Result<PaymentMethod> {
    store::get_payment_method(conn, id)?
        .ok_or_else(|| LedgerError::reference("Payment method", id))
}

fn validate_references(
    conn: &Connection,
    owner_id: OwnerId,
    category_ids: &[CategoryId],
) -> Result<()> {
    if category_ids.is_empty() {
        return Err(LedgerError::validation("A bill needs at least one category"));
    }
    if store::get_owner(conn, owner_id)?.is_none() {
        return Err(LedgerError::reference("Owner", owner_id));
    }
    for id in category_ids {
        if store::get_category(conn, *id)?.is_none() {
            return Err(LedgerError::reference("Category", id));
        }
    }
    Ok(())
}

fn dedup_categories(mut ids: Vec<CategoryId>) -> Vec<CategoryId> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn whole_seconds(d: NaiveDateTime) -> NaiveDateTime {
    d.with_nanosecond(0).unwrap_or(d)
}
