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

//! In-memory session state.

use crate::catalog::{Catalog, CatalogKind};
use crate::ledger::Ledger;
use crate::snapshot::Snapshot;

/// Ledger plus both reward catalogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    pub ledger: Ledger,
    pub earn: Catalog,
    pub spend: Catalog,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            ledger: Ledger::new(),
            earn: Catalog::new(CatalogKind::Earn),
            spend: Catalog::new(CatalogKind::Spend),
        }
    }
}

impl LedgerState {
    /// Builds state from a snapshot that already passed [`Snapshot::check`].
    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            ledger: Ledger::from_parts(snapshot.balance, snapshot.transactions),
            earn: Catalog::from_items(CatalogKind::Earn, snapshot.earn_items),
            spend: Catalog::from_items(CatalogKind::Spend, snapshot.spend_items),
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            balance: self.ledger.balance(),
            transactions: self.ledger.history().cloned().collect(),
            earn_items: self.earn.items().to_vec(),
            spend_items: self.spend.items().to_vec(),
        }
    }

    pub fn catalog(&self, kind: CatalogKind) -> &Catalog {
        match kind {
            CatalogKind::Earn => &self.earn,
            CatalogKind::Spend => &self.spend,
        }
    }

    pub fn catalog_mut(&mut self, kind: CatalogKind) -> &mut Catalog {
        match kind {
            CatalogKind::Earn => &mut self.earn,
            CatalogKind::Spend => &mut self.spend,
        }
    }
}
