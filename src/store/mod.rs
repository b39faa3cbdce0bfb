// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence of the configuration entry.
//!
//! A single entry may exist per installation. [`ConfigStore::create_entry`]
//! refuses to overwrite one with [`StoreError::AlreadyConfigured`].

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::types::ConfigRecord;

/// Storage for the configuration entry.
#[allow(async_fn_in_trait)]
pub trait ConfigStore {
    /// Returns true if an entry already exists.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read.
    async fn has_entry(&self) -> Result<bool, StoreError>;

    /// Persists `record` as the entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyConfigured`] if an entry exists, or an
    /// I/O or serialization error.
    async fn create_entry(&self, record: &ConfigRecord) -> Result<(), StoreError>;

    /// Loads the entry, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be read or decoded.
    async fn load(&self) -> Result<Option<ConfigRecord>, StoreError>;
}
