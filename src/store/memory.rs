// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use parking_lot::Mutex;

use super::ConfigStore;
use crate::error::StoreError;
use crate::types::ConfigRecord;

/// In-memory store, for hosts that persist entries themselves and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entry: Mutex<Option<ConfigRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `record`.
    #[must_use]
    pub fn with_entry(record: ConfigRecord) -> Self {
        Self {
            entry: Mutex::new(Some(record)),
        }
    }

    /// Returns a copy of the stored entry.
    #[must_use]
    pub fn entry(&self) -> Option<ConfigRecord> {
        self.entry.lock().clone()
    }
}

impl ConfigStore for MemoryStore {
    async fn has_entry(&self) -> Result<bool, StoreError> {
        Ok(self.entry.lock().is_some())
    }

    async fn create_entry(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        let mut entry = self.entry.lock();
        if entry.is_some() {
            return Err(StoreError::AlreadyConfigured);
        }
        *entry = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<ConfigRecord>, StoreError> {
        Ok(self.entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_record;

    #[tokio::test]
    async fn second_entry_is_refused() {
        let store = MemoryStore::new();
        assert!(!store.has_entry().await.unwrap());

        store.create_entry(&sample_record()).await.unwrap();
        assert!(store.has_entry().await.unwrap());

        let err = store.create_entry(&sample_record()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyConfigured));
    }

    #[tokio::test]
    async fn load_returns_stored_entry() {
        let record = sample_record();
        let store = MemoryStore::with_entry(record.clone());
        assert_eq!(store.load().await.unwrap(), Some(record));
    }
}
