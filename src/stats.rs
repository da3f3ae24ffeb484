// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Bill, CategoryId, OwnerId, PaymentMethodId, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: CategoryId,
    pub amount: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerBreakdown {
    pub owner_id: OwnerId,
    pub income: Decimal,
    pub expense: Decimal,
    pub excluded: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodBreakdown {
    pub payment_method_id: PaymentMethodId,
    pub amount: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub total_excluded: Decimal,
    pub net_income: Decimal,
    pub bill_count: usize,
    pub by_category: Vec<CategoryBreakdown>,
    pub by_owner: Vec<OwnerBreakdown>,
    pub by_payment_method: Vec<PaymentMethodBreakdown>,
}

/// Folds a bill set into totals and breakdowns. Input order does not matter.
///
/// A bill tagged with several categories counts in full towards each of them,
/// so category amounts can add up to more than the totals.
pub fn aggregate<'a, I>(bills: I) -> Statistics
where
    I: IntoIterator<Item = &'a Bill>,
{
    let mut stats = Statistics::default();
    let mut categories: HashMap<CategoryId, (Decimal, usize)> = HashMap::new();
    let mut owners: HashMap<OwnerId, OwnerBreakdown> = HashMap::new();
    let mut methods: HashMap<PaymentMethodId, (Decimal, usize)> = HashMap::new();

    for bill in bills {
        let magnitude = bill.amount.abs();
        stats.bill_count += 1;

        let owner = owners
            .entry(bill.owner_id)
            .or_insert_with(|| OwnerBreakdown {
                owner_id: bill.owner_id,
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
                excluded: Decimal::ZERO,
                count: 0,
            });
        owner.count += 1;
        match bill.transaction_type {
            TransactionType::Income => {
                stats.total_income += magnitude;
                owner.income += magnitude;
            }
            TransactionType::Expense => {
                stats.total_expense += magnitude;
                owner.expense += magnitude;
            }
            TransactionType::Excluded => {
                stats.total_excluded += magnitude;
                owner.excluded += magnitude;
            }
        }

        for cat in &bill.category_ids {
            let e = categories.entry(*cat).or_insert((Decimal::ZERO, 0));
            e.0 += magnitude;
            e.1 += 1;
        }

        let m = methods
            .entry(bill.payment_method_id)
            .or_insert((Decimal::ZERO, 0));
        m.0 += magnitude;
        m.1 += 1;
    }

    stats.net_income = stats.total_income - stats.total_expense;

    stats.by_category = categories
        .into_iter()
        .map(|(category_id, (amount, count))| CategoryBreakdown {
            category_id,
            amount,
            count,
        })
        .collect();
    stats
        .by_category
        .sort_by(|a, b| desc_then_id(a.amount, b.amount, a.category_id, b.category_id));

    stats.by_owner = owners.into_values().collect();
    stats
        .by_owner
        .sort_by(|a, b| desc_then_id(a.expense, b.expense, a.owner_id, b.owner_id));

    stats.by_payment_method = methods
        .into_iter()
        .map(|(payment_method_id, (amount, count))| PaymentMethodBreakdown {
            payment_method_id,
            amount,
            count,
        })
        .collect();
    stats.by_payment_method.sort_by(|a, b| {
        desc_then_id(a.amount, b.amount, a.payment_method_id, b.payment_method_id)
    });

    stats
}

fn desc_then_id(a: Decimal, b: Decimal, a_id: i64, b_id: i64) -> Ordering {
    b.cmp(&a).then(a_id.cmp(&b_id))
}
