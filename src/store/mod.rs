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

//! Persistence backends.
//!
//! The session talks to storage only through [`Persistence`]. Snapshot
//! backends ([`FileStore`], [`MemoryStore`]) rewrite the whole state on every
//! change; the table-based [`RowStoreBackend`] turns each [`Change`] into
//! row operations against a [`RowStore`] (remote [`RestRowStore`] or
//! in-process [`MemoryRowStore`]).

mod file;
mod memory;
mod memory_rows;
mod rest;
mod rows;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use memory_rows::MemoryRowStore;
pub use rest::RestRowStore;
pub use rows::{
    BALANCE_ROW_ID, BALANCE_TABLE, EARN_ITEMS_TABLE, OrderBy, RowStore, RowStoreBackend,
    SEQ_COLUMN, SPEND_ITEMS_TABLE, TRANSACTIONS_TABLE,
};

use crate::base::ItemId;
use crate::catalog::{CatalogKind, RewardItem};
use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::transaction::Transaction;
use rust_decimal::Decimal;

/// A single committed mutation, handed to the backend for write-through.
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    TransactionApplied {
        transaction: &'a Transaction,
        /// Balance after the transaction.
        balance: Decimal,
        /// History length after the transaction, so 1 for the first one.
        position: usize,
    },
    ItemAdded {
        catalog: CatalogKind,
        item: &'a RewardItem,
    },
    ItemUpdated {
        catalog: CatalogKind,
        item: &'a RewardItem,
    },
    ItemDeleted {
        catalog: CatalogKind,
        id: &'a ItemId,
    },
}

/// Storage contract used by [`Session`](crate::Session).
pub trait Persistence {
    /// Short backend name for log output.
    fn name(&self) -> &'static str;

    /// Loads the stored state, or `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Overwrites everything stored with `snapshot`.
    fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Persists one change. `snapshot` is the full state after the change.
    ///
    /// The default rewrites the whole snapshot.
    fn record(&self, _change: &Change<'_>, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.replace(snapshot)
    }
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        (**self).load()
    }

    fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).replace(snapshot)
    }

    fn record(&self, change: &Change<'_>, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).record(change, snapshot)
    }
}
