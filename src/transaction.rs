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

//! Ledger transactions.
//!
//! A [`Transaction`] is immutable once created. Its signed amount and its
//! [`TransactionKind`] are both stored and always agree: earn entries are
//! positive, spend entries negative, and neither is ever zero.

use crate::base::TransactionId;
use crate::{LedgerError, input};
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earn,
    Spend,
}

impl TransactionKind {
    /// Applies this kind's sign to a positive magnitude.
    pub fn signed(self, magnitude: Decimal) -> Decimal {
        match self {
            Self::Earn => magnitude,
            Self::Spend => -magnitude,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
    id: TransactionId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    date: DateTime<Utc>,
    description: String,
    amount: Decimal,
    #[serde(rename = "type")]
    kind: TransactionKind,
}

impl Transaction {
    /// Builds a new transaction stamped with a fresh id and the current time.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] if the description is empty or the
    /// magnitude is not strictly positive.
    pub fn new(
        description: &str,
        magnitude: Decimal,
        kind: TransactionKind,
    ) -> Result<Self, LedgerError> {
        let description = input::description(description)?;
        let magnitude = input::positive_amount(magnitude)?;
        Ok(Self {
            id: TransactionId::generate(),
            // Stored with millisecond precision, matching the wire format.
            date: Utc::now().trunc_subsecs(3),
            description,
            amount: kind.signed(magnitude),
            kind,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Signed amount: positive for earn, negative for spend.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }
}

/// Unchecked wire shape, validated on the way into [`Transaction`].
#[derive(Deserialize)]
struct TransactionRecord {
    id: TransactionId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    date: DateTime<Utc>,
    description: String,
    amount: Decimal,
    #[serde(rename = "type")]
    kind: TransactionKind,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = String;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let consistent = match record.kind {
            TransactionKind::Earn => record.amount > Decimal::ZERO,
            TransactionKind::Spend => record.amount < Decimal::ZERO,
        };
        if !consistent {
            return Err(format!(
                "transaction {} has amount {} which does not match type '{}'",
                record.id, record.amount, record.kind
            ));
        }
        Ok(Self {
            id: record.id,
            date: record.date,
            description: record.description,
            amount: record.amount,
            kind: record.kind,
        })
    }
}
