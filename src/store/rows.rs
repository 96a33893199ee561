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

//! Table-based persistence.
//!
//! State is spread over four tables:
//!
//! | Table | Rows |
//! |-------|------|
//! | `balance` | `{ id, amount }`, the row with id [`BALANCE_ROW_ID`] is canonical |
//! | `transactions` | one per [`Transaction`], backup file fields plus [`SEQ_COLUMN`] |
//! | `earn_items` / `spend_items` | one per [`RewardItem`] |
//!
//! Nothing enforces a single balance row. By convention the row with id 1
//! is read and written; any other balance rows are ignored with a warning.
//!
//! Transaction rows are loaded by descending `seq`, the 1-based insertion
//! position, then by descending `date` for rows written without one.

use super::{Change, Persistence};
use crate::catalog::{CatalogKind, RewardItem};
use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const BALANCE_TABLE: &str = "balance";
pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const EARN_ITEMS_TABLE: &str = "earn_items";
pub const SPEND_ITEMS_TABLE: &str = "spend_items";

pub const BALANCE_ROW_ID: i64 = 1;

/// Insertion position of a transaction row, oldest is 1.
pub const SEQ_COLUMN: &str = "seq";

const HISTORY_ORDER: [OrderBy; 2] = [
    OrderBy {
        column: SEQ_COLUMN,
        descending: true,
    },
    OrderBy {
        column: "date",
        descending: true,
    },
];

/// One sort key for [`RowStore::select_all`].
///
/// Missing or null values sort lowest, so they come last when descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

/// Row-level access to a table store.
///
/// Rows are JSON objects carrying an `id` column; ids are compared by their
/// textual form, so the balance row's numeric id `1` matches `"1"`.
pub trait RowStore {
    fn insert(&self, table: &str, row: Value) -> Result<(), StoreError>;

    fn insert_many(&self, table: &str, rows: Vec<Value>) -> Result<(), StoreError> {
        rows.into_iter().try_for_each(|row| self.insert(table, row))
    }

    /// Merges `fields` into the row with `id`, returning the number of rows
    /// affected.
    fn update(&self, table: &str, id: &str, fields: Value) -> Result<usize, StoreError>;

    /// Deletes the row with `id`, returning the number of rows affected.
    fn delete(&self, table: &str, id: &str) -> Result<usize, StoreError>;

    fn delete_all(&self, table: &str) -> Result<(), StoreError>;

    /// All rows of `table`, sorted by the keys of `order_by` in turn.
    fn select_all(&self, table: &str, order_by: &[OrderBy]) -> Result<Vec<Value>, StoreError>;
}

/// Textual form of a row's `id` column.
pub(crate) fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BalanceRow {
    id: i64,
    amount: Decimal,
}

fn items_table(catalog: CatalogKind) -> &'static str {
    match catalog {
        CatalogKind::Earn => EARN_ITEMS_TABLE,
        CatalogKind::Spend => SPEND_ITEMS_TABLE,
    }
}

fn to_row<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(value)?)
}

fn transaction_row(transaction: &Transaction, position: usize) -> Result<Value, StoreError> {
    let mut row = to_row(transaction)?;
    if let Value::Object(columns) = &mut row {
        columns.insert(SEQ_COLUMN.to_string(), json!(position));
    }
    Ok(row)
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| StoreError::Corrupt(format!("bad row in '{table}': {e}")))
        })
        .collect()
}

/// [`Persistence`] over any [`RowStore`].
#[derive(Debug)]
pub struct RowStoreBackend<R> {
    rows: R,
}

impl<R: RowStore> RowStoreBackend<R> {
    pub fn new(rows: R) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &R {
        &self.rows
    }

    fn load_balance(&self) -> Result<Option<Decimal>, StoreError> {
        let rows = self.rows.select_all(BALANCE_TABLE, &[])?;
        if rows.len() > 1 {
            warn!(
                rows = rows.len(),
                "several balance rows found; using id {BALANCE_ROW_ID} by convention"
            );
        }
        let canonical = BALANCE_ROW_ID.to_string();
        let Some(row) = rows
            .into_iter()
            .find(|row| row_id(row).as_deref() == Some(canonical.as_str()))
        else {
            return Ok(None);
        };
        let row: BalanceRow = serde_json::from_value(row)
            .map_err(|e| StoreError::Corrupt(format!("bad balance row: {e}")))?;
        Ok(Some(row.amount))
    }

    fn write_balance(&self, balance: Decimal) -> Result<(), StoreError> {
        let canonical = BALANCE_ROW_ID.to_string();
        let affected = self
            .rows
            .update(BALANCE_TABLE, &canonical, json!({ "amount": to_row(&balance)? }))?;
        if affected == 0 {
            debug!("balance row missing; inserting it");
            self.rows.insert(
                BALANCE_TABLE,
                to_row(&BalanceRow {
                    id: BALANCE_ROW_ID,
                    amount: balance,
                })?,
            )?;
        }
        Ok(())
    }

    fn upsert_item(&self, catalog: CatalogKind, item: &RewardItem) -> Result<(), StoreError> {
        let table = items_table(catalog);
        let fields = json!({
            "description": item.description(),
            "amount": to_row(&item.amount())?,
        });
        if self.rows.update(table, item.id().as_str(), fields)? == 0 {
            warn!(table, id = %item.id(), "edited item missing remotely; inserting it");
            self.rows.insert(table, to_row(item)?)?;
        }
        Ok(())
    }
}

impl<R: RowStore> Persistence for RowStoreBackend<R> {
    fn name(&self) -> &'static str {
        "rows"
    }

    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let balance = self.load_balance()?;
        let transactions: Vec<Transaction> = decode_rows(
            TRANSACTIONS_TABLE,
            self.rows.select_all(TRANSACTIONS_TABLE, &HISTORY_ORDER)?,
        )?;
        let earn_items: Vec<RewardItem> =
            decode_rows(EARN_ITEMS_TABLE, self.rows.select_all(EARN_ITEMS_TABLE, &[])?)?;
        let spend_items: Vec<RewardItem> =
            decode_rows(SPEND_ITEMS_TABLE, self.rows.select_all(SPEND_ITEMS_TABLE, &[])?)?;

        if balance.is_none()
            && transactions.is_empty()
            && earn_items.is_empty()
            && spend_items.is_empty()
        {
            return Ok(None);
        }

        Ok(Some(Snapshot {
            balance: balance.unwrap_or(Decimal::ZERO),
            transactions,
            earn_items,
            spend_items,
        }))
    }

    fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        for table in [
            BALANCE_TABLE,
            TRANSACTIONS_TABLE,
            EARN_ITEMS_TABLE,
            SPEND_ITEMS_TABLE,
        ] {
            self.rows.delete_all(table)?;
        }

        self.rows.insert(
            BALANCE_TABLE,
            to_row(&BalanceRow {
                id: BALANCE_ROW_ID,
                amount: snapshot.balance,
            })?,
        )?;
        let batches = [
            (TRANSACTIONS_TABLE, history_rows(&snapshot.transactions)?),
            (EARN_ITEMS_TABLE, to_rows(&snapshot.earn_items)?),
            (SPEND_ITEMS_TABLE, to_rows(&snapshot.spend_items)?),
        ];
        for (table, rows) in batches {
            if !rows.is_empty() {
                self.rows.insert_many(table, rows)?;
            }
        }
        Ok(())
    }

    fn record(&self, change: &Change<'_>, _snapshot: &Snapshot) -> Result<(), StoreError> {
        match *change {
            Change::TransactionApplied {
                transaction,
                balance,
                position,
            } => {
                self.rows
                    .insert(TRANSACTIONS_TABLE, transaction_row(transaction, position)?)?;
                self.write_balance(balance)
            }
            Change::ItemAdded { catalog, item } => {
                self.rows.insert(items_table(catalog), to_row(item)?)
            }
            Change::ItemUpdated { catalog, item } => self.upsert_item(catalog, item),
            Change::ItemDeleted { catalog, id } => {
                let table = items_table(catalog);
                if self.rows.delete(table, id.as_str())? == 0 {
                    warn!(table, %id, "deleted item was already missing remotely");
                }
                Ok(())
            }
        }
    }
}

fn to_rows<T: Serialize>(values: &[T]) -> Result<Vec<Value>, StoreError> {
    values.iter().map(to_row).collect()
}

/// Rows for a most-recent-first history, numbered from the oldest.
fn history_rows(transactions: &[Transaction]) -> Result<Vec<Value>, StoreError> {
    let count = transactions.len();
    transactions
        .iter()
        .enumerate()
        .map(|(index, tx)| transaction_row(tx, count - index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRowStore;
    use crate::{Catalog, Ledger, TransactionKind};
    use rust_decimal_macros::dec;

    fn backend() -> RowStoreBackend<MemoryRowStore> {
        RowStoreBackend::new(MemoryRowStore::new())
    }

    fn sample() -> Snapshot {
        let mut ledger = Ledger::new();
        ledger.apply("Read 1h", dec!(20), TransactionKind::Earn).unwrap();
        ledger.apply("Game time", dec!(15), TransactionKind::Spend).unwrap();
        let mut earn = Catalog::new(CatalogKind::Earn);
        earn.add("Read 1h", dec!(20)).unwrap();
        earn.add("Gym", dec!(10)).unwrap();

        Snapshot {
            balance: ledger.balance(),
            transactions: ledger.history().cloned().collect(),
            earn_items: earn.items().to_vec(),
            spend_items: Vec::new(),
        }
    }

    #[test]
    fn empty_tables_load_as_none() {
        assert!(backend().load().unwrap().is_none());
    }

    #[test]
    fn replace_then_load_round_trips() {
        let backend = backend();
        let snapshot = sample();
        backend.replace(&snapshot).unwrap();
        assert_eq!(backend.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn replace_clears_previous_rows() {
        let backend = backend();
        backend.replace(&sample()).unwrap();
        backend.replace(&Snapshot::default()).unwrap();

        let loaded = backend.load().unwrap().unwrap();
        assert!(loaded.transactions.is_empty());
        assert!(loaded.earn_items.is_empty());
        assert_eq!(
            backend.rows().select_all(BALANCE_TABLE, &[]).unwrap().len(),
            1
        );
    }

    #[test]
    fn balance_row_is_created_then_updated_in_place() {
        let backend = backend();
        let tx = Transaction::new("Read 1h", dec!(20), TransactionKind::Earn).unwrap();
        let change = Change::TransactionApplied {
            transaction: &tx,
            balance: dec!(20),
            position: 1,
        };
        backend.record(&change, &Snapshot::default()).unwrap();

        let tx2 = Transaction::new("Gym", dec!(5), TransactionKind::Earn).unwrap();
        let change = Change::TransactionApplied {
            transaction: &tx2,
            balance: dec!(25),
            position: 2,
        };
        backend.record(&change, &Snapshot::default()).unwrap();

        let balance_rows = backend.rows().select_all(BALANCE_TABLE, &[]).unwrap();
        assert_eq!(balance_rows.len(), 1);
        assert_eq!(row_id(&balance_rows[0]).as_deref(), Some("1"));

        let loaded = backend.load().unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(25));
        assert_eq!(loaded.transactions.len(), 2);
    }

    #[test]
    fn extra_balance_rows_are_ignored() {
        let backend = backend();
        backend
            .rows()
            .insert(BALANCE_TABLE, json!({ "id": 7, "amount": 999 }))
            .unwrap();
        backend
            .rows()
            .insert(BALANCE_TABLE, json!({ "id": 1, "amount": 0 }))
            .unwrap();

        let loaded = backend.load().unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(0));
    }

    #[test]
    fn item_changes_map_to_row_operations() {
        let backend = backend();
        let mut catalog = Catalog::new(CatalogKind::Spend);
        let item = catalog.add("Movie", dec!(30)).unwrap();
        backend
            .record(
                &Change::ItemAdded {
                    catalog: CatalogKind::Spend,
                    item: &item,
                },
                &Snapshot::default(),
            )
            .unwrap();

        let edited = catalog.update(item.id(), "Cinema", dec!(35)).unwrap();
        backend
            .record(
                &Change::ItemUpdated {
                    catalog: CatalogKind::Spend,
                    item: &edited,
                },
                &Snapshot::default(),
            )
            .unwrap();

        let loaded = backend.load().unwrap().unwrap();
        assert_eq!(loaded.spend_items, vec![edited.clone()]);

        backend
            .record(
                &Change::ItemDeleted {
                    catalog: CatalogKind::Spend,
                    id: edited.id(),
                },
                &Snapshot::default(),
            )
            .unwrap();
        assert!(
            backend
                .rows()
                .select_all(SPEND_ITEMS_TABLE, &[])
                .unwrap()
                .is_empty()
        );
    }

    fn descriptions(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(Transaction::description).collect()
    }

    #[test]
    fn history_order_survives_same_millisecond_writes() {
        let mut session = crate::Session::open(backend()).unwrap();
        for i in 0..20 {
            session
                .apply_transaction(&format!("t{i}"), dec!(1), TransactionKind::Earn)
                .unwrap();
        }

        let expected: Vec<_> = session.history().map(Transaction::description).collect();
        let loaded = session.store().load().unwrap().unwrap();
        assert_eq!(descriptions(&loaded.transactions), expected);
        assert_eq!(loaded, session.snapshot());
    }

    #[test]
    fn writes_after_replace_continue_the_sequence() {
        let backend = backend();
        let snapshot = sample();
        backend.replace(&snapshot).unwrap();

        let seqs: Vec<_> = backend
            .rows()
            .select_all(TRANSACTIONS_TABLE, &HISTORY_ORDER)
            .unwrap()
            .iter()
            .map(|row| row[SEQ_COLUMN].as_u64())
            .collect();
        assert_eq!(seqs, [Some(2), Some(1)]);

        let mut session = crate::Session::open(backend).unwrap();
        session
            .apply_transaction("Gym", dec!(10), TransactionKind::Earn)
            .unwrap();
        let loaded = session.store().load().unwrap().unwrap();
        assert_eq!(descriptions(&loaded.transactions), ["Gym", "Game time", "Read 1h"]);
    }

    #[test]
    fn rows_without_seq_fall_back_to_date_order() {
        let backend = backend();
        let rows = [
            json!({"id":"a","date":1000,"description":"old","amount":20,"type":"earn"}),
            json!({"id":"b","date":3000,"description":"new","amount":-5,"type":"spend"}),
            json!({"id":"c","date":2000,"description":"mid","amount":1,"type":"earn"}),
        ];
        for row in rows {
            backend.rows().insert(TRANSACTIONS_TABLE, row).unwrap();
        }
        backend
            .rows()
            .insert(BALANCE_TABLE, json!({ "id": 1, "amount": 16 }))
            .unwrap();

        let loaded = backend.load().unwrap().unwrap();
        assert_eq!(descriptions(&loaded.transactions), ["new", "mid", "old"]);
    }

    #[test]
    fn undecodable_rows_are_reported() {
        let backend = backend();
        backend
            .rows()
            .insert(EARN_ITEMS_TABLE, json!({ "id": "x", "amount": "lots" }))
            .unwrap();
        assert!(matches!(backend.load(), Err(StoreError::Corrupt(_))));
    }
}
