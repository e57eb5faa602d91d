//! Browser LocalStorage backend (wasm32 only)

use super::{Storage, StorageError};

/// Thin wrapper over `window.localStorage`
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    /// Acquire the window's LocalStorage, if the browser exposes one
    pub fn open() -> Result<Self, StorageError> {
        let inner = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { inner })
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}
