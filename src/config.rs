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

//! Backend selection.
//!
//! The persistence backend is picked once at startup from a [`Config`];
//! nothing else in the crate branches on which backend is in use.

use crate::error::StoreError;
use crate::store::{FileStore, MemoryStore, Persistence, RestRowStore, RowStoreBackend};
use std::path::PathBuf;
use tracing::info;

/// File name used when no data file is configured.
pub const DEFAULT_DATA_FILE: &str = "hopelessCoin_data_v2.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Whole state in one local JSON file.
    File { path: PathBuf },
    /// Hosted table store reached over HTTP.
    Remote { url: String, api_key: String },
    /// Nothing persisted beyond the process.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::File {
                path: PathBuf::from(DEFAULT_DATA_FILE),
            },
        }
    }
}

impl Config {
    /// Builds the configured backend.
    pub fn open_store(&self) -> Result<Box<dyn Persistence>, StoreError> {
        let store: Box<dyn Persistence> = match &self.backend {
            BackendConfig::File { path } => {
                info!(path = %path.display(), "using local file store");
                Box::new(FileStore::new(path))
            }
            BackendConfig::Remote { url, api_key } => {
                info!(%url, "using remote row store");
                Box::new(RowStoreBackend::new(RestRowStore::new(url, api_key)?))
            }
            BackendConfig::Memory => {
                info!("using in-memory store; nothing will be saved");
                Box::new(MemoryStore::new())
            }
        };
        Ok(store)
    }
}
