//! Card name extraction from photos.
//!
//! Candidate name bands are cropped, binarized several ways and recognized
//! in every page segmentation mode; the single most confident reading wins.

pub mod aggregate;
pub mod engine;
pub mod matrix;
pub mod preprocess;
pub mod region;
pub mod setup;

pub use aggregate::{best_candidate, fold_best, prefer_stronger, BestCandidate, OcrAttempt};
pub use engine::{OcrEngine, OcrToken, RecognitionConfig, TesseractEngine};
pub use preprocess::{preprocess_variants, PreprocessMethod, PreprocessedVariant};
pub use region::{crop_region, CardRegion, RelativeRect};
pub use setup::{locate_tesseract, TesseractPaths};

use image::GrayImage;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ScanError, ScanResult};
use crate::normalize::NormalizedName;
use matrix::run_matrix;

/// Per-region outcome for the diagnostic report.
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub region: CardRegion,
    pub label: &'static str,
    pub text: String,
    pub confidence: f32,
}

/// Result of reading a card photo.
#[derive(Debug, Clone, Serialize)]
pub struct Identification {
    pub candidate: BestCandidate,
    pub name: NormalizedName,
}

/// Reads the printed name off card photos.
pub struct CardNameReader<E> {
    engine: E,
    min_confidence: f32,
    parallel: bool,
}

impl<E: OcrEngine> CardNameReader<E> {
    pub fn new(engine: E, min_confidence: f32, parallel: bool) -> Self {
        Self {
            engine,
            min_confidence,
            parallel,
        }
    }

    /// Best reading of one region across all variants and modes.
    pub fn read_region(&self, gray: &GrayImage, region: CardRegion) -> Option<BestCandidate> {
        let cropped = crop_region(gray, &region.rect());
        let variants = preprocess_variants(&cropped);
        let attempts = run_matrix(
            &self.engine,
            region,
            &variants,
            &RecognitionConfig::ALL,
            self.parallel,
        );
        best_candidate(&attempts)
    }

    /// Best reading across all name bands, before the confidence gate.
    pub fn read_best(&self, gray: &GrayImage) -> Option<BestCandidate> {
        CardRegion::NAME_BANDS
            .iter()
            .fold(None, |best, &region| {
                let candidate = self.read_region(gray, region);
                if let Some(c) = &candidate {
                    debug!("{}: '{}' (conf: {:.1})", region.label(), c.text, c.confidence);
                }
                prefer_stronger(best, candidate)
            })
    }

    /// Decodes an uploaded image and extracts a search-ready card name.
    pub fn identify_from_image(&self, bytes: &[u8]) -> ScanResult<Identification> {
        let gray = decode_gray(bytes)?;
        let best = self.read_best(&gray);

        let best_confidence = best.as_ref().map(|b| b.confidence).unwrap_or(0.0);
        info!(
            "Best OCR result: '{}' with confidence {:.1}",
            best.as_ref().map(|b| b.text.as_str()).unwrap_or(""),
            best_confidence
        );

        let candidate = match best {
            Some(c) if c.confidence > self.min_confidence => c,
            _ => return Err(ScanError::NoTextDetected { best_confidence }),
        };

        let name = NormalizedName::from_ocr_text(&candidate.text)
            .ok_or(ScanError::NoTextDetected { best_confidence })?;
        info!("Extracted name: '{}' (from '{}')", name.value, name.source_line);

        Ok(Identification { candidate, name })
    }

    /// Reads every diagnostic region and reports its best text.
    pub fn diagnose_regions(&self, bytes: &[u8]) -> ScanResult<Vec<RegionReport>> {
        let gray = decode_gray(bytes)?;

        Ok(CardRegion::DIAGNOSTIC
            .iter()
            .map(|&region| {
                let best = self.read_region(&gray, region);
                RegionReport {
                    region,
                    label: region.label(),
                    text: best.as_ref().map(|b| b.text.clone()).unwrap_or_default(),
                    confidence: best.map(|b| b.confidence).unwrap_or(0.0),
                }
            })
            .collect())
    }
}

fn decode_gray(bytes: &[u8]) -> ScanResult<GrayImage> {
    let img = image::load_from_memory(bytes).map_err(|e| ScanError::DecodeFailure(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ScanError::DecodeFailure("image has no pixels".to_string()));
    }
    Ok(img.to_luma8())
}
