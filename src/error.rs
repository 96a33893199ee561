// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for ledger, catalog and persistence operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by user-facing operations.
///
/// Validation errors ([`InvalidInput`](LedgerError::InvalidInput),
/// [`InsufficientBalance`](LedgerError::InsufficientBalance),
/// [`NotFound`](LedgerError::NotFound),
/// [`ImportFormat`](LedgerError::ImportFormat)) are raised before any state
/// change. [`Persistence`](LedgerError::Persistence) is raised after the
/// in-memory mutation has already been applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Empty description, or a non-positive / non-numeric amount
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Spend would drive the balance below zero
    #[error("insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: Decimal, requested: Decimal },

    /// Update, delete or quick-add target does not exist
    #[error("item not found: {0}")]
    NotFound(String),

    /// Backend read or write failed
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Backup file failed shape validation or could not be parsed
    #[error("invalid backup file: {0}")]
    ImportFormat(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

/// Failures raised by persistence backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store answered with a non-success status
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Stored rows could not be mapped back to ledger data
    #[error("stored data is inconsistent: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::{LedgerError, StoreError};
    use rust_decimal_macros::dec;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            LedgerError::InvalidInput("description must not be empty".into()).to_string(),
            "invalid input: description must not be empty"
        );
        assert_eq!(
            LedgerError::InsufficientBalance {
                balance: dec!(20),
                requested: dec!(50),
            }
            .to_string(),
            "insufficient balance: 20 available, 50 requested"
        );
        assert_eq!(LedgerError::NotFound("abc".into()).to_string(), "item not found: abc");
        assert_eq!(
            LedgerError::Persistence("disk full".into()).to_string(),
            "persistence failure: disk full"
        );
        assert_eq!(
            LedgerError::ImportFormat("balance must be a number".into()).to_string(),
            "invalid backup file: balance must be a number"
        );
    }

    #[test]
    fn store_errors_become_persistence_failures() {
        let err = StoreError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(
            LedgerError::from(err),
            LedgerError::Persistence("remote store returned 503: unavailable".into())
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::NotFound("x".into());
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
