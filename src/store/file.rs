// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::ConfigStore;
use crate::error::StoreError;
use crate::types::ConfigRecord;

const APP_DIR: &str = "bticino_x8000";
const FILE_NAME: &str = "config.json";

/// Store keeping the entry as a pretty-printed JSON document.
///
/// The document is written to a staging file next to it and then hard-linked
/// into place, so the entry path never holds a partial record. The directory
/// must be on a filesystem supporting hard links.
///
/// The file holds secrets in clear text; restrict access to its directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at `<config dir>/bticino_x8000/config.json`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoConfigDir`] if the platform has no
    /// configuration directory.
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dir.join(APP_DIR).join(FILE_NAME)))
    }

    /// Returns the path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the document is written to before being published.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| FILE_NAME.into(), |n| n.to_string_lossy());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
    }
}

async fn write_new(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "Could not remove staging file");
    }
}

impl ConfigStore for JsonFileStore {
    async fn has_entry(&self) -> Result<bool, StoreError> {
        Ok(fs::try_exists(&self.path).await?)
    }

    async fn create_entry(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(&self.path).await? {
            return Err(StoreError::AlreadyConfigured);
        }

        let staging = self.staging_path();
        if let Err(e) = write_new(&staging, &json).await {
            discard(&staging).await;
            return Err(e.into());
        }

        // The link fails if the entry appeared meanwhile; it is never replaced.
        let published = fs::hard_link(&staging, &self.path).await;
        discard(&staging).await;

        match published {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Configuration entry written");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::AlreadyConfigured),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self) -> Result<Option<ConfigRecord>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_record;

    #[tokio::test]
    async fn creates_parent_directories_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join(FILE_NAME));
        let record = sample_record();

        assert!(!store.has_entry().await.unwrap());
        store.create_entry(&record).await.unwrap();
        assert!(store.has_entry().await.unwrap());
        assert_eq!(store.load().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join(FILE_NAME));
        store.create_entry(&sample_record()).await.unwrap();

        let err = store.create_entry(&sample_record()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyConfigured));
    }

    #[tokio::test]
    async fn failed_write_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        // Valid on its own, too long once the staging suffix is added
        let name = format!("{}.json", "c".repeat(225));
        let store = JsonFileStore::new(dir.path().join(&name));

        let err = store.create_entry(&sample_record()).await.unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert!(!store.has_entry().await.unwrap());
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn refused_entry_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join(FILE_NAME));
        store.create_entry(&sample_record()).await.unwrap();
        store.create_entry(&sample_record()).await.unwrap_err();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(FILE_NAME)]);
    }

    #[tokio::test]
    async fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join(FILE_NAME));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn document_uses_flat_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join(FILE_NAME));
        store.create_entry(&sample_record()).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["client_id"], "client-id");
        assert!(json["selected_thermostats"].is_array());
    }
}
