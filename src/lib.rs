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

//! # Hopeless Coin
//!
//! This library keeps a personal "virtual coin" ledger: coins are earned and
//! spent against a single running balance, two reward catalogs hold reusable
//! earn and spend prices, and the whole state can be backed up to JSON or
//! kept in a local file or a remote table store.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Balance and transaction history, never negative
//! - [`Catalog`]: Earn or spend price list with search and sorting
//! - [`Session`]: Owns the state and writes every change through to storage
//! - [`Persistence`]: Storage contract, implemented by [`FileStore`],
//!   [`MemoryStore`] and [`RowStoreBackend`]
//! - [`Snapshot`]: Full state in backup file form
//! - [`LedgerError`]: Error types for every user-facing operation
//!
//! ## Example
//!
//! ```
//! use hopeless_coin::{LedgerError, MemoryStore, Session, TransactionKind};
//! use rust_decimal_macros::dec;
//!
//! let mut session = Session::open(MemoryStore::new()).unwrap();
//!
//! session.apply_transaction("Read 1h", dec!(20), TransactionKind::Earn).unwrap();
//! let denied = session.apply_transaction("Game time", dec!(50), TransactionKind::Spend);
//! assert!(matches!(denied, Err(LedgerError::InsufficientBalance { .. })));
//!
//! session.apply_transaction("Game time", dec!(15), TransactionKind::Spend).unwrap();
//! assert_eq!(session.balance(), dec!(5));
//! assert_eq!(session.history().next().unwrap().description(), "Game time");
//! ```

mod base;
pub mod catalog;
pub mod config;
pub mod error;
mod input;
pub mod ledger;
pub mod logging;
pub mod session;
pub mod snapshot;
mod state;
pub mod store;
mod transaction;

pub use base::{ItemId, TransactionId};
pub use catalog::{Catalog, CatalogKind, Matches, RewardItem, SortDirection, SortKey, sorted};
pub use config::{BackendConfig, Config};
pub use error::{LedgerError, StoreError};
pub use input::parse_amount;
pub use ledger::{Ledger, Totals};
pub use session::Session;
pub use snapshot::Snapshot;
pub use state::LedgerState;
pub use store::{
    FileStore, MemoryRowStore, MemoryStore, Persistence, RestRowStore, RowStore, RowStoreBackend,
};
pub use transaction::{Transaction, TransactionKind};
