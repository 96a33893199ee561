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

//! In-process snapshot store.

use super::Persistence;
use crate::error::StoreError;
use crate::snapshot::Snapshot;
use parking_lot::Mutex;

/// Holds the last written snapshot in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// Copy of what is currently stored.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.lock().clone()
    }
}

impl Persistence for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshot())
    }

    fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }
}
