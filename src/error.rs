//! Error taxonomy returned to callers of the scanner.
//!
//! Per-attempt OCR failures and per-strategy lookup failures never surface
//! here; they are logged and only steer which branch runs next.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The uploaded bytes could not be decoded as an image.
    #[error("unreadable image: {0}")]
    DecodeFailure(String),

    /// Every region scored at or below the confidence gate.
    #[error("no card name detected (best confidence {best_confidence:.1})")]
    NoTextDetected { best_confidence: f32 },

    /// The cascade was exhausted without a single record.
    #[error("no card found for '{query}'")]
    NoMatch { query: String },

    /// Every strategy failed at the transport or HTTP level.
    #[error("card database unavailable for '{query}' ({failures} failed requests)")]
    UpstreamUnavailable { query: String, failures: usize },

    /// The OCR engine or HTTP client could not be set up.
    #[error("scanner setup failed: {0}")]
    SetupFailure(String),
}

impl ScanError {
    /// True for outcomes the caller should present as "nothing found"
    /// rather than as a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScanError::NoMatch { .. } | ScanError::UpstreamUnavailable { .. }
        )
    }
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
