//! Runs every preprocessing variant through every recognition mode.

use rayon::prelude::*;
use tracing::debug;

use super::aggregate::OcrAttempt;
use super::engine::{OcrEngine, RecognitionConfig};
use super::preprocess::PreprocessedVariant;
use super::region::CardRegion;

/// Recognizes one (variant, mode) cell. Engine failures and empty images
/// become an attempt with no tokens so the rest of the matrix still runs.
fn run_cell<E: OcrEngine + ?Sized>(
    engine: &E,
    region: CardRegion,
    variant: &PreprocessedVariant,
    config: RecognitionConfig,
) -> OcrAttempt {
    let tokens = if variant.image.width() == 0 || variant.image.height() == 0 {
        Vec::new()
    } else {
        match engine.recognize(&variant.image, config) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!(
                    "OCR failed for {:?}/{:?}/{:?}: {:#}",
                    region, variant.method, config, e
                );
                Vec::new()
            }
        }
    };

    OcrAttempt {
        region,
        method: variant.method,
        config,
        tokens,
    }
}

/// Returns one attempt per (variant, mode) pair, variants outermost.
///
/// With `parallel` set the cells run on the rayon pool; the returned order
/// is the same either way.
pub fn run_matrix<E: OcrEngine + ?Sized>(
    engine: &E,
    region: CardRegion,
    variants: &[PreprocessedVariant],
    configs: &[RecognitionConfig],
    parallel: bool,
) -> Vec<OcrAttempt> {
    let cells: Vec<(&PreprocessedVariant, RecognitionConfig)> = variants
        .iter()
        .flat_map(|v| configs.iter().map(move |&c| (v, c)))
        .collect();

    let attempts: Vec<OcrAttempt> = if parallel {
        cells
            .par_iter()
            .map(|&(variant, config)| run_cell(engine, region, variant, config))
            .collect()
    } else {
        cells
            .iter()
            .map(|&(variant, config)| run_cell(engine, region, variant, config))
            .collect()
    };

    for attempt in &attempts {
        if let Some(scored) = attempt.score() {
            debug!(
                "{} {:?} {:?}: '{}' (conf: {:.1})",
                region.label(),
                attempt.method,
                attempt.config,
                scored.text,
                scored.confidence
            );
        }
    }

    attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::OcrToken;
    use crate::ocr::preprocess::{preprocess_variants, PreprocessMethod};
    use anyhow::{anyhow, Result};
    use image::GrayImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on single-word mode, otherwise reports the psm as confidence.
    struct FlakyEngine {
        calls: AtomicUsize,
    }

    impl OcrEngine for FlakyEngine {
        fn recognize(&self, _img: &GrayImage, config: RecognitionConfig) -> Result<Vec<OcrToken>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if config == RecognitionConfig::SingleWord {
                return Err(anyhow!("engine crashed"));
            }
            Ok(vec![OcrToken::new(
                "Island",
                config.page_segmentation_mode() as f32,
            )])
        }
    }

    #[test]
    fn test_full_matrix_survives_failures() {
        let engine = FlakyEngine { calls: AtomicUsize::new(0) };
        let variants = preprocess_variants(&GrayImage::new(16, 8));

        let attempts = run_matrix(
            &engine,
            CardRegion::Top20,
            &variants,
            &RecognitionConfig::ALL,
            false,
        );

        assert_eq!(attempts.len(), 16);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 16);
        let failed = attempts.iter().filter(|a| a.tokens.is_empty()).count();
        assert_eq!(failed, 4);
        assert!(attempts
            .iter()
            .filter(|a| a.config == RecognitionConfig::SingleWord)
            .all(|a| a.tokens.is_empty()));
    }

    #[test]
    fn test_order_is_variant_major() {
        let engine = FlakyEngine { calls: AtomicUsize::new(0) };
        let variants = preprocess_variants(&GrayImage::new(16, 8));

        let attempts = run_matrix(
            &engine,
            CardRegion::Top20,
            &variants,
            &RecognitionConfig::ALL,
            false,
        );

        assert_eq!(attempts[0].method, PreprocessMethod::Otsu);
        assert_eq!(attempts[0].config, RecognitionConfig::SingleLine);
        assert_eq!(attempts[3].config, RecognitionConfig::RawLine);
        assert_eq!(attempts[4].method, PreprocessMethod::Adaptive);
        assert_eq!(attempts[15].method, PreprocessMethod::EqualizeOtsu);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let engine = FlakyEngine { calls: AtomicUsize::new(0) };
        let variants = preprocess_variants(&GrayImage::new(16, 8));

        let seq = run_matrix(&engine, CardRegion::Top30, &variants, &RecognitionConfig::ALL, false);
        let par = run_matrix(&engine, CardRegion::Top30, &variants, &RecognitionConfig::ALL, true);

        let key = |a: &OcrAttempt| (a.method, a.config, a.tokens.clone());
        assert_eq!(
            seq.iter().map(key).collect::<Vec<_>>(),
            par.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_empty_variant_skips_engine() {
        let engine = FlakyEngine { calls: AtomicUsize::new(0) };
        let variants = preprocess_variants(&GrayImage::new(16, 0));

        let attempts = run_matrix(
            &engine,
            CardRegion::Top20,
            &variants,
            &RecognitionConfig::ALL,
            false,
        );

        assert_eq!(attempts.len(), 16);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
        assert!(attempts.iter().all(|a| a.tokens.is_empty()));
    }
}
