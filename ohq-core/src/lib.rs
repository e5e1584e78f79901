//! Open House Quest core
//!
//! Platform-agnostic logic for the scavenger-hunt widget: the station
//! registry, payload validation, the progress state machine, and the
//! completion token. Browser concerns (camera, barcode decoding,
//! `localStorage`) live in `ohq-web` behind the traits defined here.

pub mod payload;
pub mod progress;
pub mod scan;
pub mod session;
pub mod station;
pub mod token;

// Re-export commonly used types
pub use progress::{HuntProgress, ProgressSnapshot, ScanOutcome};
pub use scan::{BoundingBox, Detection};
pub use session::{COMPLETED_KEY, HuntSession, PROGRESS_KEY, ScanReport, SessionError};
pub use station::{RegistryError, Station, StationRegistry};
pub use token::completion_token;

/// Trait for abstracting the durable key/value store progress is written
/// to. Platform-specific implementations should provide this.
pub trait ProgressStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a value by key, `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove a key; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Trait for abstracting the wall clock so the completion instant is
/// injectable in tests.
pub trait Clock {
    /// Current instant as milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}
