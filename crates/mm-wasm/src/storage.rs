//! `localStorage` as the diagram store.

use mm_core::error::{Error, Result};
use mm_core::store::KeyValueStore;
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// The window's `localStorage`, wrapped as a `KeyValueStore`.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// Open the window's local storage.
    ///
    /// # Errors
    /// Fails outside a browser window or when storage is disabled.
    pub fn open() -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| Error::Storage("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| Error::Storage("localStorage is unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_error)
    }

    // Quota errors surface here as a DOMException.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

fn js_error(value: JsValue) -> Error {
    Error::Storage(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}
