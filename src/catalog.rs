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

//! Reward catalogs.
//!
//! A [`Catalog`] is a reusable price list of [`RewardItem`]s. The session
//! keeps two of them, one per [`CatalogKind`]; they never share items.
//! Listing helpers ([`Catalog::search`], [`sorted`]) are read-only
//! projections and never change the stored order.

use crate::base::ItemId;
use crate::transaction::TransactionKind;
use crate::{LedgerError, input};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Earn,
    Spend,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Earn, CatalogKind::Spend];

    /// Kind of transaction produced when quick-adding from this catalog.
    pub fn transaction_kind(self) -> TransactionKind {
        match self {
            Self::Earn => TransactionKind::Earn,
            Self::Spend => TransactionKind::Spend,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, reusable coin amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RewardItemRecord")]
pub struct RewardItem {
    id: ItemId,
    description: String,
    /// Always positive.
    amount: Decimal,
}

impl RewardItem {
    fn new(id: ItemId, description: &str, amount: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            id,
            description: input::description(description)?,
            amount: input::positive_amount(amount)?,
        })
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

#[derive(Deserialize)]
struct RewardItemRecord {
    id: ItemId,
    description: String,
    amount: Decimal,
}

impl TryFrom<RewardItemRecord> for RewardItem {
    type Error = String;

    fn try_from(record: RewardItemRecord) -> Result<Self, Self::Error> {
        if record.amount <= Decimal::ZERO {
            return Err(format!(
                "reward item {} has non-positive amount {}",
                record.id, record.amount
            ));
        }
        Ok(Self {
            id: record.id,
            description: record.description,
            amount: record.amount,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Case-insensitive
    Description,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Orders `items` by `key` without touching their source.
///
/// The sort is stable in both directions: items that compare equal keep
/// their relative input order, so sorting an already sorted sequence is a
/// no-op.
///
/// # Example
///
/// ```
/// use hopeless_coin::{Catalog, CatalogKind, SortDirection, SortKey, sorted};
/// use rust_decimal_macros::dec;
///
/// let mut catalog = Catalog::new(CatalogKind::Spend);
/// catalog.add("Movie", dec!(30)).unwrap();
/// catalog.add("Snack", dec!(10)).unwrap();
/// catalog.add("Game", dec!(20)).unwrap();
///
/// let amounts: Vec<_> = sorted(catalog.items(), SortKey::Amount, SortDirection::Ascending)
///     .into_iter()
///     .map(|item| item.amount())
///     .collect();
/// assert_eq!(amounts, [dec!(10), dec!(20), dec!(30)]);
/// ```
pub fn sorted<'a>(
    items: impl IntoIterator<Item = &'a RewardItem>,
    key: SortKey,
    direction: SortDirection,
) -> Vec<&'a RewardItem> {
    let mut items: Vec<&RewardItem> = items.into_iter().collect();
    let compare = |a: &&RewardItem, b: &&RewardItem| -> Ordering {
        match key {
            SortKey::Description => a
                .description
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.description.chars().flat_map(char::to_lowercase)),
            SortKey::Amount => a.amount.cmp(&b.amount),
        }
    };
    match direction {
        SortDirection::Ascending => items.sort_by(compare),
        SortDirection::Descending => items.sort_by(|a, b| compare(b, a)),
    }
    items
}

/// Lazy, restartable search over a catalog.
///
/// Cloning the iterator restarts the search from the same position.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    items: std::slice::Iter<'a, RewardItem>,
    needle: String,
}

impl<'a> Iterator for Matches<'a> {
    type Item = &'a RewardItem;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = &self.needle;
        self.items
            .by_ref()
            .find(|item| needle.is_empty() || item.description.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    kind: CatalogKind,
    /// Insertion order.
    items: Vec<RewardItem>,
}

impl Catalog {
    pub fn new(kind: CatalogKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub(crate) fn from_items(kind: CatalogKind, items: Vec<RewardItem>) -> Self {
        Self { kind, items }
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn items(&self) -> &[RewardItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&RewardItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Appends a new item with a fresh id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] for an empty description or a
    /// non-positive amount.
    pub fn add(&mut self, description: &str, amount: Decimal) -> Result<RewardItem, LedgerError> {
        let item = RewardItem::new(ItemId::generate(), description, amount)?;
        self.items.push(item.clone());
        Ok(item)
    }

    /// Overwrites the description and amount of the item with `id`.
    ///
    /// Input is validated before the lookup, so invalid input on a missing id
    /// reports [`LedgerError::InvalidInput`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] - Empty description or non-positive amount.
    /// - [`LedgerError::NotFound`] - No item with `id` in this catalog.
    pub fn update(
        &mut self,
        id: &ItemId,
        description: &str,
        amount: Decimal,
    ) -> Result<RewardItem, LedgerError> {
        let updated = RewardItem::new(id.clone(), description, amount)?;
        let slot = self
            .items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        *slot = updated.clone();
        Ok(updated)
    }

    /// Removes and returns the item with `id`.
    pub fn delete(&mut self, id: &ItemId) -> Result<RewardItem, LedgerError> {
        let position = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        Ok(self.items.remove(position))
    }

    /// Items whose description contains `query`, ignoring case.
    ///
    /// An empty query matches every item.
    pub fn search(&self, query: &str) -> Matches<'_> {
        Matches {
            items: self.items.iter(),
            needle: query.to_lowercase(),
        }
    }

    pub fn sort_by(&self, key: SortKey, direction: SortDirection) -> Vec<&RewardItem> {
        sorted(&self.items, key, direction)
    }
}
