// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance arithmetic linking a bill to a payment-method balance change.
//!
//! Savings accounts hold value directly; credit accounts track the amount
//! owed. Excluded bills keep the caller's sign: on savings a positive amount
//! adds value, on credit a positive amount is a repayment.

use rust_decimal::Decimal;

use crate::models::{AccountType, TransactionType};

/// Signed change applied to a payment method's stored value.
pub fn delta(account: AccountType, kind: TransactionType, amount: Decimal) -> Decimal {
    match (account, kind) {
        (AccountType::Savings, TransactionType::Expense) => -amount.abs(),
        (AccountType::Savings, TransactionType::Income) => amount.abs(),
        (AccountType::Savings, TransactionType::Excluded) => amount,
        (AccountType::Credit, TransactionType::Expense) => amount.abs(),
        (AccountType::Credit, TransactionType::Income) => -amount.abs(),
        (AccountType::Credit, TransactionType::Excluded) => -amount,
    }
}

/// Exact inverse of [`delta`].
pub fn revert(account: AccountType, kind: TransactionType, amount: Decimal) -> Decimal {
    -delta(account, kind, amount)
}

/// Orients a bill amount the way it is stored: expenses negative, income
/// positive, excluded untouched.
pub fn orient(kind: TransactionType, amount: Decimal) -> Decimal {
    let oriented = match kind {
        TransactionType::Expense => -amount.abs(),
        TransactionType::Income => amount.abs(),
        TransactionType::Excluded => amount,
    };
    canonical(oriented)
}

/// Strips trailing zeros and the sign of zero so equal amounts compare equal
/// as stored text.
pub fn canonical(d: Decimal) -> Decimal {
    if d.is_zero() {
        Decimal::ZERO
    } else {
        d.normalize()
    }
}

/// Net effect of a set of bills on one account, in any order.
pub fn fold<'a, I>(account: AccountType, bills: I) -> Decimal
where
    I: IntoIterator<Item = (TransactionType, &'a Decimal)>,
{
    bills
        .into_iter()
        .fold(Decimal::ZERO, |acc, (kind, amount)| {
            acc + delta(account, kind, *amount)
        })
}
