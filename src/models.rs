// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

pub type OwnerId = i64;
pub type CategoryId = i64;
pub type PaymentMethodId = i64;
pub type BillId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
    Excluded,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [Self::Expense, Self::Income, Self::Excluded];

    /// Key used in the database and in JSON snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Excluded => "excluded",
        }
    }

    /// Human-facing label written to CSV exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Expense => "Expense",
            Self::Income => "Income",
            Self::Excluded => "Excluded",
        }
    }

    /// Accepts the export labels, the storage keys and the Chinese labels used
    /// by the mobile app, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim();
        match l.to_lowercase().as_str() {
            "expense" | "支出" => Some(Self::Expense),
            "income" | "收入" => Some(Self::Income),
            "excluded" | "不计入收支" | "不计入" => Some(Self::Excluded),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
            .ok_or_else(|| LedgerError::validation(format!("Unknown transaction type '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Credit => "credit",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: OwnerId,
    pub name: String,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAccount {
    pub id: PaymentMethodId,
    pub name: String,
    #[serde(default)]
    pub transaction_type: TransactionType,
    pub balance: Decimal,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditAccount {
    pub id: PaymentMethodId,
    pub name: String,
    #[serde(default)]
    pub transaction_type: TransactionType,
    pub credit_limit: Decimal,
    pub outstanding_balance: Decimal,
    /// Day of month the statement closes.
    pub billing_date: u8,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "accountType", rename_all = "lowercase")]
pub enum PaymentMethod {
    Savings(SavingsAccount),
    Credit(CreditAccount),
}

impl PaymentMethod {
    pub fn id(&self) -> PaymentMethodId {
        match self {
            Self::Savings(s) => s.id,
            Self::Credit(c) => c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Savings(s) => &s.name,
            Self::Credit(c) => &c.name,
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        match self {
            Self::Savings(s) => s.owner_id,
            Self::Credit(c) => c.owner_id,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Savings(s) => s.transaction_type,
            Self::Credit(c) => c.transaction_type,
        }
    }

    pub fn sort_order(&self) -> i64 {
        match self {
            Self::Savings(s) => s.sort_order,
            Self::Credit(c) => c.sort_order,
        }
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Savings(_) => AccountType::Savings,
            Self::Credit(_) => AccountType::Credit,
        }
    }

    /// The stored value a bill delta is added to: balance for savings,
    /// amount owed for credit.
    pub fn ledger_value(&self) -> Decimal {
        match self {
            Self::Savings(s) => s.balance,
            Self::Credit(c) => c.outstanding_balance,
        }
    }

    pub fn apply_delta(&mut self, delta: Decimal) {
        match self {
            Self::Savings(s) => s.balance += delta,
            Self::Credit(c) => c.outstanding_balance += delta,
        }
    }

    pub fn available_credit(&self) -> Option<Decimal> {
        match self {
            Self::Savings(_) => None,
            Self::Credit(c) => Some(c.credit_limit - c.outstanding_balance),
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        match self {
            Self::Savings(s) => s.updated_at = at,
            Self::Credit(c) => c.updated_at = at,
        }
    }
}

/// Input for creating a payment method.
#[derive(Debug, Clone)]
pub enum NewPaymentMethod {
    Savings {
        name: String,
        owner_id: OwnerId,
        balance: Decimal,
    },
    Credit {
        name: String,
        owner_id: OwnerId,
        credit_limit: Decimal,
        outstanding_balance: Decimal,
        billing_date: u8,
    },
}

impl NewPaymentMethod {
    pub fn savings(name: impl Into<String>, owner_id: OwnerId, balance: Decimal) -> Self {
        Self::Savings {
            name: name.into(),
            owner_id,
            balance,
        }
    }

    pub fn credit(
        name: impl Into<String>,
        owner_id: OwnerId,
        credit_limit: Decimal,
        billing_date: u8,
    ) -> Self {
        Self::Credit {
            name: name.into(),
            owner_id,
            credit_limit,
            outstanding_balance: Decimal::ZERO,
            billing_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: BillId,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub payment_method_id: PaymentMethodId,
    pub category_ids: Vec<CategoryId>,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub note: Option<String>,
    pub date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bill about to be recorded.
#[derive(Debug, Clone)]
pub struct BillDraft {
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub payment_method_id: PaymentMethodId,
    pub category_ids: Vec<CategoryId>,
    pub owner_id: OwnerId,
    pub note: Option<String>,
    pub date: NaiveDateTime,
}

/// Partial update of a bill. `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default)]
pub struct BillPatch {
    pub amount: Option<Decimal>,
    pub transaction_type: Option<TransactionType>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub category_ids: Option<Vec<CategoryId>>,
    pub owner_id: Option<OwnerId>,
    pub note: Option<Option<String>>,
    pub date: Option<NaiveDateTime>,
}

impl BillPatch {
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn transaction_type(mut self, t: TransactionType) -> Self {
        self.transaction_type = Some(t);
        self
    }

    pub fn payment_method(mut self, id: PaymentMethodId) -> Self {
        self.payment_method_id = Some(id);
        self
    }

    pub fn categories(mut self, ids: Vec<CategoryId>) -> Self {
        self.category_ids = Some(ids);
        self
    }

    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = Some(note);
        self
    }

    pub fn date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }
}

/// Selection of bills for listing and statistics.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub owner_id: Option<OwnerId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub transaction_type: Option<TransactionType>,
    /// Every listed category must be present on the bill.
    pub category_ids: Vec<CategoryId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl BillFilter {
    pub fn matches(&self, bill: &Bill) -> bool {
        if self.owner_id.is_some_and(|o| o != bill.owner_id) {
            return false;
        }
        if self
            .payment_method_id
            .is_some_and(|p| p != bill.payment_method_id)
        {
            return false;
        }
        if self
            .transaction_type
            .is_some_and(|t| t != bill.transaction_type)
        {
            return false;
        }
        if !self
            .category_ids
            .iter()
            .all(|c| bill.category_ids.contains(c))
        {
            return false;
        }
        let day = bill.date.date();
        if self.from.is_some_and(|f| day < f) || self.to.is_some_and(|t| day > t) {
            return false;
        }
        true
    }
}
