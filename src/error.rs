// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures surfaced by the store, the ledger and the codecs.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A foreign key on a create or amend did not resolve.
    #[error("{entity} {id} referenced but not found")]
    ReferenceNotFound { entity: &'static str, id: String },

    /// The target of an amend or remove does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    /// A backup envelope or snapshot is structurally unusable.
    #[error("Format error: {0}")]
    Format(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn reference(entity: &'static str, id: impl ToString) -> Self {
        Self::ReferenceNotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Row-level problems that bulk import counts instead of propagating.
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ReferenceNotFound { .. }
        )
    }
}
