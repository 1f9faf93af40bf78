use stack_engine::{KeyValueStore, StorageError};

/// `window.localStorage` behind the engine's store trait.
///
/// Private browsing modes and native builds have no storage; every call then
/// reports [`StorageError::Unavailable`] and callers fall back to defaults.
pub struct LocalStore {
    #[cfg(target_arch = "wasm32")]
    storage: Option<web_sys::Storage>,
}

impl LocalStore {
    #[cfg(target_arch = "wasm32")]
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("localStorage unavailable, progress will not persist");
        }
        Self { storage }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open() -> Self {
        Self {}
    }

    pub fn is_available(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            self.storage.is_some()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.get_item(key).map_err(|_| StorageError::Unavailable)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.set_item(key, value).map_err(|err| StorageError::Write {
            key: key.to_string(),
            reason: err.as_string().unwrap_or_else(|| "quota exceeded".to_string()),
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for LocalStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_store_is_unavailable() {
        let mut store = LocalStore::open();
        assert!(!store.is_available());
        assert_eq!(store.get("k"), Err(StorageError::Unavailable));
        assert_eq!(store.set("k", "v"), Err(StorageError::Unavailable));
    }
}
