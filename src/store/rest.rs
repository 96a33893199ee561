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

//! Remote table store speaking the PostgREST dialect (as served by hosted
//! Supabase projects).

use super::rows::{OrderBy, RowStore};
use crate::error::StoreError;
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Blocking HTTP client for `{base_url}/rest/v1/{table}` endpoints.
#[derive(Debug, Clone)]
pub struct RestRowStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRowStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!(%method, %url, "row store request");
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        })
    }

    /// Sends a request that asks for the affected rows back and counts them.
    fn affected(request: RequestBuilder) -> Result<usize, StoreError> {
        let response = Self::check(request.header("Prefer", "return=representation").send()?)?;
        let rows: Vec<Value> = response.json()?;
        Ok(rows.len())
    }
}

/// PostgREST `order` value, e.g. `seq.desc.nullslast,date.desc.nullslast`.
///
/// Nulls are placed as the lowest values, matching [`OrderBy`].
fn order_param(order_by: &[OrderBy]) -> String {
    order_by
        .iter()
        .map(|order| {
            if order.descending {
                format!("{}.desc.nullslast", order.column)
            } else {
                format!("{}.asc.nullsfirst", order.column)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl RowStore for RestRowStore {
    fn insert(&self, table: &str, row: Value) -> Result<(), StoreError> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(&row);
        Self::check(request.send()?)?;
        Ok(())
    }

    fn insert_many(&self, table: &str, rows: Vec<Value>) -> Result<(), StoreError> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(&rows);
        Self::check(request.send()?)?;
        Ok(())
    }

    fn update(&self, table: &str, id: &str, fields: Value) -> Result<usize, StoreError> {
        Self::affected(
            self.request(Method::PATCH, table)
                .query(&[("id", format!("eq.{id}"))])
                .json(&fields),
        )
    }

    fn delete(&self, table: &str, id: &str) -> Result<usize, StoreError> {
        Self::affected(
            self.request(Method::DELETE, table)
                .query(&[("id", format!("eq.{id}"))]),
        )
    }

    fn delete_all(&self, table: &str) -> Result<(), StoreError> {
        // PostgREST refuses an unfiltered DELETE.
        let request = self
            .request(Method::DELETE, table)
            .query(&[("id", "not.is.null")]);
        Self::check(request.send()?)?;
        Ok(())
    }

    fn select_all(&self, table: &str, order_by: &[OrderBy]) -> Result<Vec<Value>, StoreError> {
        let mut request = self.request(Method::GET, table).query(&[("select", "*")]);
        if !order_by.is_empty() {
            request = request.query(&[("order", order_param(order_by))]);
        }
        let response = Self::check(request.send()?)?;
        Ok(response.json()?)
    }
}
