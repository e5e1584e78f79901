//! Dual-strategy QR detection.
//!
//! The strategy is picked once at startup: the platform's native
//! `BarcodeDetector` when the capability probe finds one, otherwise the
//! software decoder. Exactly one strategy runs; per-tick failures never
//! escape this module.

mod native;
mod software;

pub use native::NativeDetector;
pub use software::SoftwareDecoder;

use web_sys::HtmlVideoElement;

use ohq_core::Detection;

/// Delay between software-decoder passes, applied whether or not the
/// pass produced a result.
pub const FALLBACK_RETRY_MS: i32 = 150;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecoderError {
    #[error("decoder initialization failed: {0}")]
    Init(String),
    #[error("no QR decoding strategy available: {0}")]
    Unavailable(String),
}

/// How the detection loop should schedule the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Once per display refresh tick.
    AnimationFrame,
    /// After a fixed delay in milliseconds.
    Delay(i32),
}

pub enum Decoder {
    Native(NativeDetector),
    Software(SoftwareDecoder),
}

impl Decoder {
    /// Probe platform capabilities and pick a strategy. The native
    /// detector wins when present; a native detector that rejects
    /// initialization falls through to the software decoder.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError::Unavailable` when neither strategy can be
    /// initialized. That is terminal for scanning: the caller surfaces it
    /// and does not retry.
    pub fn probe() -> Result<Self, DecoderError> {
        if NativeDetector::available() {
            match NativeDetector::new() {
                Ok(native) => return Ok(Self::Native(native)),
                Err(err) => {
                    log::warn!("native barcode detector rejected init, trying fallback: {err}");
                }
            }
        }
        match SoftwareDecoder::new() {
            Ok(software) => Ok(Self::Software(software)),
            Err(DecoderError::Init(msg) | DecoderError::Unavailable(msg)) => {
                Err(DecoderError::Unavailable(msg))
            }
        }
    }

    /// Short label for the status line.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::Software(_) => "software",
        }
    }

    #[must_use]
    pub const fn cadence(&self) -> Cadence {
        match self {
            Self::Native(_) => Cadence::AnimationFrame,
            Self::Software(_) => Cadence::Delay(FALLBACK_RETRY_MS),
        }
    }

    /// Run one decode pass against the current frame. `None` covers both
    /// "no code in frame" and per-tick decoder failures.
    #[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
    pub async fn decode_pass(&self, video: &HtmlVideoElement) -> Option<Detection> {
        match self {
            Self::Native(native) => native.decode(video).await,
            Self::Software(software) => software.decode(video),
        }
    }
}
