//! Web-specific hunt bindings
//!
//! This module provides browser implementations of the ohq-core traits
//! and re-exports the core hunt types.

use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(target_arch = "wasm32")]
use crate::dom;

// Re-export all types from ohq-core
pub use ohq_core::*;

/// Hunt progress store backed by `localStorage`.
///
/// Off-wasm (server-side rendering, component tests) the store is inert:
/// reads find nothing and writes succeed without effect.
pub struct LocalStorageStore;

#[derive(Debug, thiserror::Error)]
pub enum WebStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(target_arch = "wasm32")]
fn storage() -> Result<web_sys::Storage, WebStoreError> {
    dom::local_storage().map_err(|e| WebStoreError::Storage(dom::js_error_message(&e)))
}

impl ProgressStore for LocalStorageStore {
    type Error = WebStoreError;

    #[cfg(target_arch = "wasm32")]
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        storage()?
            .get_item(key)
            .map_err(|e| WebStoreError::Storage(dom::js_error_message(&e)))
    }

    #[cfg(target_arch = "wasm32")]
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        storage()?
            .set_item(key, value)
            .map_err(|e| WebStoreError::Storage(dom::js_error_message(&e)))
    }

    #[cfg(target_arch = "wasm32")]
    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        storage()?
            .remove_item(key)
            .map_err(|e| WebStoreError::Storage(dom::js_error_message(&e)))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn get(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Ok(None)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn set(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn remove(&self, _key: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Wall clock over the browser's `Date.now()`.
pub struct BrowserClock;

impl Clock for BrowserClock {
    #[cfg(target_arch = "wasm32")]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// The session type the widget runs on.
pub type WebSession = HuntSession<LocalStorageStore, BrowserClock>;

/// Create a browser-backed hunt session over the shipped station registry.
#[must_use]
pub fn create_web_session() -> WebSession {
    HuntSession::load(
        StationRegistry::load_from_static(),
        LocalStorageStore,
        BrowserClock,
    )
}

static HUNT_PAYLOAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*openhouse\\?:").expect("payload probe pattern is valid")
});

/// Whether a raw payload carries the hunt prefix. Only used to word the
/// diagnostic for unmatched scans; matching itself lives in the validator.
#[must_use]
pub fn looks_like_hunt_payload(raw: &str) -> bool {
    HUNT_PAYLOAD_RE.is_match(raw)
}
