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

//! Session: the owner of all ledger state.
//!
//! A [`Session`] loads [`LedgerState`] once from a [`Persistence`] backend and
//! then serves every user-facing operation. Each mutation is a two-phase
//! write:
//!
//! 1. validate and apply the change in memory;
//! 2. write it through to the backend.
//!
//! A failure in step 1 leaves everything untouched. A failure in step 2 is
//! returned as [`LedgerError::Persistence`], but the in-memory change is
//! kept: the backend may lag behind until the next successful write.
//!
//! # Example
//!
//! ```
//! use hopeless_coin::{CatalogKind, MemoryStore, Session, TransactionKind};
//! use rust_decimal_macros::dec;
//!
//! let mut session = Session::open(MemoryStore::new()).unwrap();
//! let item = session.add_item(CatalogKind::Earn, "Read 1h", dec!(20)).unwrap();
//! session.quick_add_by_id(CatalogKind::Earn, item.id()).unwrap();
//! session.apply_transaction("Game time", dec!(15), TransactionKind::Spend).unwrap();
//!
//! assert_eq!(session.balance(), dec!(5));
//! assert_eq!(session.store().snapshot().unwrap().balance, dec!(5));
//! ```

use crate::base::ItemId;
use crate::catalog::{Catalog, CatalogKind, Matches, RewardItem, SortDirection, SortKey, sorted};
use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::snapshot::{self, Inconsistency, Snapshot};
use crate::state::LedgerState;
use crate::store::{Change, Persistence};
use crate::transaction::{Transaction, TransactionKind};
use crate::LedgerError;
use chrono::Utc;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct Session<S = Box<dyn Persistence>> {
    state: LedgerState,
    store: S,
}

impl<S: Persistence> Session<S> {
    /// Loads state from `store`; an empty store starts an empty session.
    ///
    /// A stored balance that disagrees with the stored history is rebuilt
    /// from the history, which is the record of what actually happened.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Persistence`] when the backend cannot be read or its
    /// history sums to a negative balance.
    pub fn open(store: S) -> Result<Self, LedgerError> {
        let state = match store.load()? {
            None => {
                info!(backend = store.name(), "no stored data; starting empty");
                LedgerState::default()
            }
            Some(mut snapshot) => {
                match snapshot.check() {
                    Ok(()) => {}
                    Err(Inconsistency::BalanceMismatch { balance, history })
                        if history >= Decimal::ZERO =>
                    {
                        warn!(
                            backend = store.name(),
                            %balance,
                            %history,
                            "stored balance disagrees with history; using history total"
                        );
                        snapshot.balance = history;
                    }
                    Err(inconsistency) => {
                        return Err(StoreError::Corrupt(inconsistency.to_string()).into());
                    }
                }
                info!(
                    backend = store.name(),
                    balance = %snapshot.balance,
                    transactions = snapshot.transactions.len(),
                    earn_items = snapshot.earn_items.len(),
                    spend_items = snapshot.spend_items.len(),
                    "session loaded"
                );
                LedgerState::from_snapshot(snapshot)
            }
        };
        Ok(Self { state, store })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn balance(&self) -> Decimal {
        self.state.ledger.balance()
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &Transaction> + Clone {
        self.state.ledger.history()
    }

    pub fn catalog(&self, kind: CatalogKind) -> &Catalog {
        self.state.catalog(kind)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.to_snapshot()
    }

    /// Second phase of every mutation.
    fn commit(&self, change: Change<'_>) -> Result<(), LedgerError> {
        let snapshot = self.state.to_snapshot();
        self.store.record(&change, &snapshot).map_err(|e| {
            error!(
                backend = self.store.name(),
                error = %e,
                "write-through failed; keeping in-memory change"
            );
            LedgerError::from(e)
        })
    }

    /// Records an earn or spend and writes it through.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Empty description or non-positive magnitude.
    /// - [`LedgerError::InsufficientBalance`] - Spend exceeds the balance.
    /// - [`LedgerError::Persistence`] - Applied in memory, but not stored.
    pub fn apply_transaction(
        &mut self,
        description: &str,
        magnitude: Decimal,
        kind: TransactionKind,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self
            .state
            .ledger
            .apply(description, magnitude, kind)
            .inspect_err(|e| debug!(error = %e, "transaction rejected"))?;
        info!(
            id = %transaction.id(),
            %kind,
            amount = %transaction.amount(),
            balance = %self.balance(),
            "transaction applied"
        );
        self.commit(Change::TransactionApplied {
            transaction: &transaction,
            balance: self.balance(),
            position: self.state.ledger.len(),
        })?;
        Ok(transaction)
    }

    /// Applies a catalog entry as a transaction of `kind`.
    pub fn quick_add(
        &mut self,
        item: &RewardItem,
        kind: TransactionKind,
    ) -> Result<Transaction, LedgerError> {
        self.apply_transaction(item.description(), item.amount(), kind)
    }

    /// Looks up `id` in `catalog` and applies it with the catalog's own kind.
    pub fn quick_add_by_id(
        &mut self,
        catalog: CatalogKind,
        id: &ItemId,
    ) -> Result<Transaction, LedgerError> {
        let item = self
            .state
            .catalog(catalog)
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        self.quick_add(&item, catalog.transaction_kind())
    }

    pub fn add_item(
        &mut self,
        catalog: CatalogKind,
        description: &str,
        amount: Decimal,
    ) -> Result<RewardItem, LedgerError> {
        let item = self.state.catalog_mut(catalog).add(description, amount)?;
        info!(%catalog, id = %item.id(), "item added");
        self.commit(Change::ItemAdded {
            catalog,
            item: &item,
        })?;
        Ok(item)
    }

    pub fn update_item(
        &mut self,
        catalog: CatalogKind,
        id: &ItemId,
        description: &str,
        amount: Decimal,
    ) -> Result<RewardItem, LedgerError> {
        let item = self
            .state
            .catalog_mut(catalog)
            .update(id, description, amount)?;
        info!(%catalog, %id, "item updated");
        self.commit(Change::ItemUpdated {
            catalog,
            item: &item,
        })?;
        Ok(item)
    }

    pub fn delete_item(
        &mut self,
        catalog: CatalogKind,
        id: &ItemId,
    ) -> Result<RewardItem, LedgerError> {
        let item = self.state.catalog_mut(catalog).delete(id)?;
        info!(%catalog, %id, "item deleted");
        self.commit(Change::ItemDeleted { catalog, id })?;
        Ok(item)
    }

    pub fn search(&self, catalog: CatalogKind, query: &str) -> Matches<'_> {
        self.state.catalog(catalog).search(query)
    }

    /// Search result of `query` (all items when empty), ordered by `key`.
    pub fn list_items(
        &self,
        catalog: CatalogKind,
        query: &str,
        key: SortKey,
        direction: SortDirection,
    ) -> Vec<&RewardItem> {
        sorted(self.search(catalog, query), key, direction)
    }

    /// Serializes the whole state in the backup format.
    pub fn backup_json(&self) -> Result<String, LedgerError> {
        Ok(self.snapshot().to_backup_json()?)
    }

    /// Writes today's backup file into `dir`.
    pub fn export_backup(&self, dir: &Path) -> Result<PathBuf, LedgerError> {
        let path = snapshot::write_backup(&self.snapshot(), dir, Utc::now().date_naive())?;
        info!(path = %path.display(), "backup exported");
        Ok(path)
    }

    /// Replaces the whole state with a backup and overwrites the backend.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ImportFormat`] - The text is not a valid backup; nothing changes.
    /// - [`LedgerError::Persistence`] - Imported in memory, but not stored.
    pub fn import_backup(&mut self, text: &str) -> Result<(), LedgerError> {
        let snapshot = Snapshot::from_backup_json(text)
            .inspect_err(|e| warn!(error = %e, "backup rejected"))?;
        info!(
            balance = %snapshot.balance,
            transactions = snapshot.transactions.len(),
            "importing backup"
        );
        self.state = LedgerState::from_snapshot(snapshot.clone());
        self.store.replace(&snapshot).map_err(|e| {
            error!(backend = self.store.name(), error = %e, "import not persisted");
            LedgerError::from(e)
        })
    }

    /// Reads a backup file and imports it.
    pub fn import_backup_file(&mut self, path: &Path) -> Result<(), LedgerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::ImportFormat(format!("cannot read {}: {e}", path.display()))
        })?;
        self.import_backup(&text)
    }
}
