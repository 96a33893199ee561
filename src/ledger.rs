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

//! Balance and transaction history.
//!
//! The [`Ledger`] holds a running balance and the history of every applied
//! transaction, most recent first. [`Ledger::apply`] is the only mutating
//! entry point and keeps two invariants:
//!
//! - `balance == sum(amount for every transaction in history)`
//! - `balance >= 0`
//!
//! # Example
//!
//! ```
//! use hopeless_coin::{Ledger, LedgerError, TransactionKind};
//! use rust_decimal_macros::dec;
//!
//! let mut ledger = Ledger::new();
//! ledger.apply("Read 1h", dec!(20), TransactionKind::Earn).unwrap();
//!
//! let result = ledger.apply("Game time", dec!(50), TransactionKind::Spend);
//! assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
//! assert_eq!(ledger.balance(), dec!(20));
//! ```

use crate::LedgerError;
use crate::catalog::RewardItem;
use crate::transaction::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balance: Decimal,
    /// Most recent first.
    history: VecDeque<Transaction>,
}

/// Earned and spent sums over the whole history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub earned: Decimal,
    /// Magnitude of all spends, always non-negative.
    pub spent: Decimal,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored parts.
    ///
    /// The caller is responsible for having checked that `balance` matches
    /// the history; see [`Ledger::sum_of`].
    pub(crate) fn from_parts(balance: Decimal, history: Vec<Transaction>) -> Self {
        let ledger = Self {
            balance,
            history: history.into(),
        };
        ledger.assert_invariants();
        ledger
    }

    /// Sum of the signed amounts of `transactions`, or `None` when it does
    /// not fit in a [`Decimal`].
    pub fn sum_of<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Option<Decimal> {
        transactions
            .into_iter()
            .try_fold(Decimal::ZERO, |sum, tx| sum.checked_add(tx.amount()))
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
        debug_assert_eq!(
            Some(self.balance),
            Self::sum_of(&self.history),
            "Invariant violated: balance diverged from history"
        );
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Transactions, most recent first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Transaction> + Clone {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Sums saturate at [`Decimal::MAX`].
    pub fn totals(&self) -> Totals {
        self.history
            .iter()
            .fold(Totals::default(), |mut totals, tx| {
                match tx.kind() {
                    TransactionKind::Earn => {
                        totals.earned = totals.earned.saturating_add(tx.magnitude())
                    }
                    TransactionKind::Spend => {
                        totals.spent = totals.spent.saturating_add(tx.magnitude())
                    }
                }
                totals
            })
    }

    /// Records a new transaction and updates the balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Empty description, non-positive
    ///   magnitude, or an earn that would overflow the balance.
    /// - [`LedgerError::InsufficientBalance`] - Spend exceeds the current balance.
    ///
    /// On error the ledger is left untouched.
    pub fn apply(
        &mut self,
        description: &str,
        magnitude: Decimal,
        kind: TransactionKind,
    ) -> Result<Transaction, LedgerError> {
        let transaction = Transaction::new(description, magnitude, kind)?;

        let next_balance = self
            .balance
            .checked_add(transaction.amount())
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!(
                    "earning {} would overflow the balance {}",
                    transaction.magnitude(),
                    self.balance
                ))
            })?;
        if kind == TransactionKind::Spend && next_balance < Decimal::ZERO {
            return Err(LedgerError::InsufficientBalance {
                balance: self.balance,
                requested: transaction.magnitude(),
            });
        }

        self.history.push_front(transaction.clone());
        self.balance = next_balance;
        self.assert_invariants();
        Ok(transaction)
    }

    /// Turns a catalog entry into a transaction of the given kind.
    pub fn quick_add(
        &mut self,
        item: &RewardItem,
        kind: TransactionKind,
    ) -> Result<Transaction, LedgerError> {
        self.apply(item.description(), item.amount(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn earn_then_spend_updates_balance() {
        let mut ledger = Ledger::new();
        ledger.apply("Read 1h", dec!(20), TransactionKind::Earn).unwrap();
        ledger.apply("Game time", dec!(15), TransactionKind::Spend).unwrap();
        assert_eq!(ledger.balance(), dec!(5));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn newest_transaction_comes_first() {
        let mut ledger = Ledger::new();
        ledger.apply("first", dec!(1), TransactionKind::Earn).unwrap();
        ledger.apply("second", dec!(2), TransactionKind::Earn).unwrap();

        let descriptions: Vec<_> = ledger.history().map(Transaction::description).collect();
        assert_eq!(descriptions, ["second", "first"]);
    }

    #[test]
    fn spend_to_exactly_zero_is_allowed() {
        let mut ledger = Ledger::new();
        ledger.apply("earn", dec!(10), TransactionKind::Earn).unwrap();
        ledger.apply("spend", dec!(10), TransactionKind::Spend).unwrap();
        assert_eq!(ledger.balance(), Decimal::ZERO);
    }

    #[test]
    fn insufficient_balance_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        ledger.apply("earn", dec!(10), TransactionKind::Earn).unwrap();
        let before = ledger.clone();

        let result = ledger.apply("spend", dec!(11), TransactionKind::Spend);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                balance: dec!(10),
                requested: dec!(11),
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn invalid_input_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        assert!(ledger.apply("", dec!(5), TransactionKind::Earn).is_err());
        assert!(ledger.apply("x", dec!(0), TransactionKind::Earn).is_err());
        assert!(ledger.apply("x", dec!(-5), TransactionKind::Spend).is_err());
        assert!(ledger.is_empty());
        assert_eq!(ledger.balance(), Decimal::ZERO);
    }

    #[test]
    fn totals_split_earned_and_spent() {
        let mut ledger = Ledger::new();
        ledger.apply("a", dec!(30), TransactionKind::Earn).unwrap();
        ledger.apply("b", dec!(12.5), TransactionKind::Spend).unwrap();
        ledger.apply("c", dec!(5), TransactionKind::Earn).unwrap();

        let totals = ledger.totals();
        assert_eq!(totals.earned, dec!(35));
        assert_eq!(totals.spent, dec!(12.5));
        assert_eq!(totals.earned - totals.spent, ledger.balance());
    }

    #[test]
    fn earn_past_decimal_max_is_invalid_input() {
        let mut ledger = Ledger::new();
        ledger.apply("a", Decimal::MAX, TransactionKind::Earn).unwrap();
        let before = ledger.clone();

        let result = ledger.apply("b", Decimal::MAX, TransactionKind::Earn);
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
        assert_eq!(ledger, before);
        assert_eq!(ledger.balance(), Decimal::MAX);
    }

    #[test]
    fn sum_of_reports_overflow() {
        let a = Transaction::new("a", Decimal::MAX, TransactionKind::Earn).unwrap();
        let b = Transaction::new("b", dec!(1), TransactionKind::Earn).unwrap();
        assert_eq!(Ledger::sum_of([&a]), Some(Decimal::MAX));
        assert_eq!(Ledger::sum_of([&a, &b]), None);
    }

    #[test]
    fn totals_saturate() {
        let mut ledger = Ledger::new();
        ledger.apply("a", Decimal::MAX, TransactionKind::Earn).unwrap();
        ledger.apply("b", Decimal::MAX, TransactionKind::Spend).unwrap();
        ledger.apply("c", Decimal::MAX, TransactionKind::Earn).unwrap();

        let totals = ledger.totals();
        assert_eq!(totals.earned, Decimal::MAX);
        assert_eq!(totals.spent, Decimal::MAX);
    }

    #[test]
    fn quick_add_uses_item_description_and_amount() {
        let mut catalog = crate::Catalog::new(crate::CatalogKind::Earn);
        let item = catalog.add("Read 1h", dec!(20)).unwrap();

        let mut ledger = Ledger::new();
        let tx = ledger.quick_add(&item, TransactionKind::Earn).unwrap();
        assert_eq!(tx.description(), "Read 1h");
        assert_eq!(tx.amount(), dec!(20));
        assert_eq!(ledger.balance(), dec!(20));
    }
}
