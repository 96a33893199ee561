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

//! In-process table store.

use super::rows::{OrderBy, RowStore, row_id};
use crate::error::StoreError;
use dashmap::DashMap;
use serde_json::Value;
use std::cmp::Ordering;

/// [`RowStore`] keeping every table as a vector of JSON rows.
///
/// Tables are created on first insert. Rows keep insertion order unless an
/// ordering is requested.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    tables: DashMap<String, Vec<Value>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order on JSON values: null first, then by type; numbers compare
/// numerically and strings lexically.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_rows(a: &Value, b: &Value, order_by: &[OrderBy]) -> Ordering {
    order_by
        .iter()
        .map(|order| {
            let column = |row: &Value| row.get(order.column).cloned().unwrap_or(Value::Null);
            let ordering = compare_values(&column(a), &column(b));
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl RowStore for MemoryRowStore {
    fn insert(&self, table: &str, row: Value) -> Result<(), StoreError> {
        if !row.is_object() {
            return Err(StoreError::Corrupt(format!(
                "rows inserted into '{table}' must be objects"
            )));
        }
        self.tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    fn update(&self, table: &str, id: &str, fields: Value) -> Result<usize, StoreError> {
        let Value::Object(fields) = fields else {
            return Err(StoreError::Corrupt("update fields must be an object".into()));
        };
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(0);
        };

        let mut affected = 0;
        for row in rows
            .iter_mut()
            .filter(|row| row_id(row).as_deref() == Some(id))
        {
            if let Value::Object(columns) = row {
                columns.extend(fields.clone());
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn delete(&self, table: &str, id: &str) -> Result<usize, StoreError> {
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(id));
        Ok(before - rows.len())
    }

    fn delete_all(&self, table: &str) -> Result<(), StoreError> {
        if let Some(mut rows) = self.tables.get_mut(table) {
            rows.clear();
        }
        Ok(())
    }

    fn select_all(&self, table: &str, order_by: &[OrderBy]) -> Result<Vec<Value>, StoreError> {
        let mut rows = self
            .tables
            .get(table)
            .map(|rows| rows.value().clone())
            .unwrap_or_default();

        if !order_by.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, order_by));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_merges_columns_and_counts_rows() {
        let store = MemoryRowStore::new();
        store
            .insert("items", json!({ "id": "a", "description": "x", "amount": 1 }))
            .unwrap();

        let affected = store.update("items", "a", json!({ "amount": 2 })).unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            store.select_all("items", &[]).unwrap(),
            vec![json!({ "id": "a", "description": "x", "amount": 2 })]
        );
        assert_eq!(store.update("items", "b", json!({ "amount": 2 })).unwrap(), 0);
        assert_eq!(store.update("missing", "a", json!({})).unwrap(), 0);
    }

    #[test]
    fn numeric_ids_match_their_text_form() {
        let store = MemoryRowStore::new();
        store.insert("balance", json!({ "id": 1, "amount": 0 })).unwrap();
        assert_eq!(store.update("balance", "1", json!({ "amount": 5 })).unwrap(), 1);
        assert_eq!(store.delete("balance", "1").unwrap(), 1);
        assert!(store.select_all("balance", &[]).unwrap().is_empty());
    }

    #[test]
    fn select_all_orders_stably() {
        let store = MemoryRowStore::new();
        for (id, date) in [("a", 2), ("b", 3), ("c", 2), ("d", 1)] {
            store.insert("t", json!({ "id": id, "date": date })).unwrap();
        }

        let ids = |rows: Vec<Value>| -> Vec<String> { rows.iter().filter_map(row_id).collect() };
        let descending = store
            .select_all(
                "t",
                &[OrderBy {
                    column: "date",
                    descending: true,
                }],
            )
            .unwrap();
        assert_eq!(ids(descending), ["b", "a", "c", "d"]);
    }

    #[test]
    fn later_keys_break_ties_and_nulls_sort_lowest() {
        let store = MemoryRowStore::new();
        let rows = [
            json!({ "id": "a", "date": 5, "seq": 1 }),
            json!({ "id": "b", "date": 5, "seq": 2 }),
            json!({ "id": "c", "date": 9 }),
            json!({ "id": "d", "date": 5, "seq": null }),
        ];
        for row in rows {
            store.insert("t", row).unwrap();
        }

        let ids = |rows: Vec<Value>| -> Vec<String> { rows.iter().filter_map(row_id).collect() };
        let by_seq = store
            .select_all(
                "t",
                &[
                    OrderBy {
                        column: "seq",
                        descending: true,
                    },
                    OrderBy {
                        column: "date",
                        descending: true,
                    },
                ],
            )
            .unwrap();
        assert_eq!(ids(by_seq), ["b", "a", "c", "d"]);

        let ascending = store
            .select_all(
                "t",
                &[OrderBy {
                    column: "seq",
                    descending: false,
                }],
            )
            .unwrap();
        assert_eq!(ids(ascending), ["c", "d", "a", "b"]);
    }

    #[test]
    fn rejects_non_object_rows() {
        let store = MemoryRowStore::new();
        assert!(store.insert("t", json!([1, 2])).is_err());
    }
}
