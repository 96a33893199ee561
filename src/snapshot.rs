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

//! Full-state snapshots and backup files.
//!
//! A [`Snapshot`] is the serializable form of the whole session: balance,
//! history and both catalogs. Its JSON shape is the backup file format:
//!
//! ```json
//! {
//!   "balance": 5,
//!   "transactions": [
//!     { "id": "...", "date": 1740823200000, "description": "Game time", "amount": -15, "type": "spend" }
//!   ],
//!   "earnItems": [ { "id": "...", "description": "Read 1h", "amount": 20 } ],
//!   "spendItems": []
//! }
//! ```
//!
//! The same shape is used by the local file store.

use crate::catalog::RewardItem;
use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::transaction::Transaction;
use crate::LedgerError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub balance: Decimal,
    /// Most recent first.
    pub transactions: Vec<Transaction>,
    pub earn_items: Vec<RewardItem>,
    pub spend_items: Vec<RewardItem>,
}

/// Ways a snapshot can disagree with the ledger invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    NegativeBalance(Decimal),
    BalanceMismatch { balance: Decimal, history: Decimal },
    /// The transaction amounts add up to more than [`Decimal::MAX`].
    HistoryOverflow,
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeBalance(balance) => write!(f, "balance {balance} is negative"),
            Self::BalanceMismatch { balance, history } => write!(
                f,
                "balance {balance} does not match the transaction total {history}"
            ),
            Self::HistoryOverflow => write!(f, "transaction total is out of range"),
        }
    }
}

impl Snapshot {
    /// Checks the ledger invariants against the stored balance.
    pub fn check(&self) -> Result<(), Inconsistency> {
        if self.balance < Decimal::ZERO {
            return Err(Inconsistency::NegativeBalance(self.balance));
        }
        let history =
            Ledger::sum_of(&self.transactions).ok_or(Inconsistency::HistoryOverflow)?;
        if history != self.balance {
            return Err(Inconsistency::BalanceMismatch {
                balance: self.balance,
                history,
            });
        }
        Ok(())
    }

    /// Serializes as a backup file: pretty JSON with 2-space indentation.
    pub fn to_backup_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a backup file.
    ///
    /// The document must be an object whose `balance` is a number and whose
    /// `transactions`, `earnItems` and `spendItems` are arrays. Every entry
    /// must then decode, and the balance must satisfy [`Snapshot::check`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::ImportFormat`] describing the first problem found.
    pub fn from_backup_json(text: &str) -> Result<Self, LedgerError> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| LedgerError::ImportFormat(format!("not valid JSON: {e}")))?;

        let Some(fields) = document.as_object() else {
            return Err(LedgerError::ImportFormat(
                "top level must be an object".to_string(),
            ));
        };
        if !fields.get("balance").is_some_and(Value::is_number) {
            return Err(LedgerError::ImportFormat(
                "'balance' must be a number".to_string(),
            ));
        }
        for key in ["transactions", "earnItems", "spendItems"] {
            if !fields.get(key).is_some_and(Value::is_array) {
                return Err(LedgerError::ImportFormat(format!("'{key}' must be an array")));
            }
        }

        let snapshot: Snapshot = serde_json::from_value(document)
            .map_err(|e| LedgerError::ImportFormat(e.to_string()))?;
        snapshot
            .check()
            .map_err(|e| LedgerError::ImportFormat(e.to_string()))?;
        Ok(snapshot)
    }
}

/// Backup file name for a given day: `hopeless-coin-backup-YYYY-MM-DD.json`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("hopeless-coin-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Writes `snapshot` as a backup file into `dir`, returning its path.
pub fn write_backup(snapshot: &Snapshot, dir: &Path, date: NaiveDate) -> Result<PathBuf, StoreError> {
    let path = dir.join(backup_file_name(date));
    std::fs::write(&path, snapshot.to_backup_json()?)?;
    Ok(path)
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    id: &'a str,
    date: String,
    #[serde(rename = "type")]
    kind: &'static str,
    description: &'a str,
    amount: String,
}

/// Writes transactions as CSV.
///
/// # CSV Format
///
/// Columns: `id, date, type, description, amount`
///
/// ```csv
/// id,date,type,description,amount
/// 0195...,2025-03-01T10:00:00.000Z,spend,Game time,-15
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_history_csv<'a, W: Write>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    for tx in transactions {
        wtr.serialize(HistoryRow {
            id: tx.id().as_str(),
            date: tx
                .date()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            kind: tx.kind().as_str(),
            description: tx.description(),
            amount: tx.amount().to_string(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}
