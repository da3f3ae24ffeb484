// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One-tap expenses: a fixed item table and payment-method auto-selection.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::{BillDraft, BillId, OwnerId, PaymentMethod, TransactionType};
use crate::store;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickItem {
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub amount: Decimal,
    pub category: &'static str,
}

// (label, aliases, amount in cents, category)
const ITEMS: &[(&str, &[&str], i64, &str)] = &[
    ("Coffee", &["咖啡"], 1500, "Food"),
    ("Breakfast", &["早餐"], 1000, "Food"),
    ("Lunch", &["午餐"], 2500, "Food"),
    ("Dinner", &["晚餐"], 4000, "Food"),
    ("Snacks", &["零食"], 1200, "Food"),
    ("Groceries", &["买菜"], 8000, "Food"),
    ("Subway", &["地铁", "metro"], 400, "Transport"),
    ("Bus", &["公交"], 200, "Transport"),
    ("Taxi", &["打车", "cab"], 3000, "Transport"),
    ("Parking", &["停车"], 1000, "Transport"),
    ("Fuel", &["加油", "gas"], 30000, "Transport"),
    ("Movie", &["电影"], 4500, "Entertainment"),
    ("Clothes", &["衣服"], 20000, "Shopping"),
];

pub static QUICK_ITEMS: Lazy<Vec<QuickItem>> = Lazy::new(|| {
    ITEMS
        .iter()
        .map(|&(label, aliases, cents, category)| QuickItem {
            label,
            aliases,
            amount: Decimal::new(cents, 2),
            category,
        })
        .collect()
});

static CASH_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cash|wallet|debit|wechat|alipay|现金|零钱|微信|支付宝")
        .expect("cash pattern compiles")
});

static CREDIT_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)credit|card|visa|master|amex|信用|花呗").expect("credit pattern compiles")
});

pub fn find_item(label: &str) -> Option<&'static QuickItem> {
    let needle = label.trim().to_lowercase();
    QUICK_ITEMS.iter().find(|item| {
        item.label.to_lowercase() == needle
            || item.aliases.iter().any(|a| a.to_lowercase() == needle)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    CashLike,
    CreditLike,
}

/// Credit accounts are always credit-like; savings accounts are classified
/// by name and may be neither.
pub fn classify(method: &PaymentMethod) -> Option<MethodClass> {
    if let PaymentMethod::Credit(_) = method {
        return Some(MethodClass::CreditLike);
    }
    let name = method.name();
    if CASH_LIKE.is_match(name) {
        Some(MethodClass::CashLike)
    } else if CREDIT_LIKE.is_match(name) {
        Some(MethodClass::CreditLike)
    } else {
        None
    }
}

enum Condition {
    Category(&'static str),
    BelowThreshold,
    AtOrAboveThreshold,
}

struct SelectionRule {
    when: Condition,
    prefer: MethodClass,
}

const RULES: &[SelectionRule] = &[
    SelectionRule {
        when: Condition::Category("Transport"),
        prefer: MethodClass::CashLike,
    },
    SelectionRule {
        when: Condition::Category("Food"),
        prefer: MethodClass::CashLike,
    },
    SelectionRule {
        when: Condition::Category("Shopping"),
        prefer: MethodClass::CreditLike,
    },
    SelectionRule {
        when: Condition::Category("Entertainment"),
        prefer: MethodClass::CreditLike,
    },
    SelectionRule {
        when: Condition::BelowThreshold,
        prefer: MethodClass::CashLike,
    },
    SelectionRule {
        when: Condition::AtOrAboveThreshold,
        prefer: MethodClass::CreditLike,
    },
];

/// Picks the payment method for a quick expense. `methods` is expected in
/// display order; the first one is the fallback when no rule finds a match.
pub fn select_payment_method<'a>(
    methods: &'a [PaymentMethod],
    amount: Decimal,
    category: &str,
    threshold: Decimal,
) -> Option<&'a PaymentMethod> {
    if methods.len() == 1 {
        return methods.first();
    }
    let amount = amount.abs();
    for rule in RULES {
        let applies = match rule.when {
            Condition::Category(c) => c.eq_ignore_ascii_case(category.trim()),
            Condition::BelowThreshold => amount < threshold,
            Condition::AtOrAboveThreshold => amount >= threshold,
        };
        if !applies {
            continue;
        }
        if let Some(m) = methods.iter().find(|m| classify(m) == Some(rule.prefer)) {
            return Some(m);
        }
    }
    methods.first()
}

/// Records the quick item for `owner_id` through the ledger.
pub fn quick_expense(
    ledger: &mut Ledger,
    owner_id: OwnerId,
    label: &str,
    at: NaiveDateTime,
    threshold: Decimal,
) -> Result<BillId> {
    let item = find_item(label)
        .ok_or_else(|| LedgerError::validation(format!("Unknown quick item '{}'", label.trim())))?;
    if store::get_owner(ledger.conn(), owner_id)?.is_none() {
        return Err(LedgerError::reference("Owner", owner_id));
    }
    let methods = store::list_payment_methods(ledger.conn(), Some(owner_id))?;
    let method = select_payment_method(&methods, item.amount, item.category, threshold)
        .ok_or_else(|| {
            LedgerError::validation(format!("Owner {} has no payment methods", owner_id))
        })?;
    let method_id = method.id();

    // A missing category is created in the same transaction as the bill.
    ledger.record_bill_with(|conn| {
        let category = store::get_or_create_category(conn, item.category, TransactionType::Expense)?;
        Ok(BillDraft {
            amount: item.amount,
            transaction_type: TransactionType::Expense,
            payment_method_id: method_id,
            category_ids: vec![category.id],
            owner_id,
            note: Some(item.label.to_string()),
            date: at,
        })
    })
}
