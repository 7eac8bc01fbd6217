//! Scoring of OCR attempts and selection of the best candidate.
//!
//! Selection is a pure fold with a strict `>` comparison, so the earliest
//! attempt wins ties and the outcome depends only on iteration order.

use serde::Serialize;

use super::engine::{OcrToken, RecognitionConfig};
use super::preprocess::PreprocessMethod;
use super::region::CardRegion;

/// One cell of the region × variant × mode matrix and what the engine read.
#[derive(Debug, Clone)]
pub struct OcrAttempt {
    pub region: CardRegion,
    pub method: PreprocessMethod,
    pub config: RecognitionConfig,
    /// Empty when recognition failed.
    pub tokens: Vec<OcrToken>,
}

/// Text assembled from an attempt's retained tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredText {
    pub text: String,
    pub confidence: f32,
}

/// The most confident reading found so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestCandidate {
    pub text: String,
    pub confidence: f32,
    pub region: CardRegion,
    pub method: PreprocessMethod,
    pub config: RecognitionConfig,
}

/// Scores a token list: tokens with confidence > 0 and non-blank text are
/// kept, joined by single spaces, and scored by their mean confidence.
pub fn score_tokens(tokens: &[OcrToken]) -> Option<ScoredText> {
    let retained: Vec<&OcrToken> = tokens
        .iter()
        .filter(|t| t.confidence > 0.0 && !t.text.trim().is_empty())
        .collect();
    if retained.is_empty() {
        return None;
    }

    let confidence =
        retained.iter().map(|t| t.confidence).sum::<f32>() / retained.len() as f32;
    let text = retained
        .iter()
        .map(|t| t.text.trim())
        .collect::<Vec<_>>()
        .join(" ");

    Some(ScoredText { text, confidence })
}

impl OcrAttempt {
    pub fn score(&self) -> Option<BestCandidate> {
        let scored = score_tokens(&self.tokens)?;
        Some(BestCandidate {
            text: scored.text,
            confidence: scored.confidence,
            region: self.region,
            method: self.method,
            config: self.config,
        })
    }
}

/// Keeps `current` unless `challenger` is strictly more confident and has
/// non-blank text.
pub fn prefer_stronger(
    current: Option<BestCandidate>,
    challenger: Option<BestCandidate>,
) -> Option<BestCandidate> {
    match (current, challenger) {
        (None, Some(c)) if !c.text.trim().is_empty() => Some(c),
        (Some(best), Some(c)) if c.confidence > best.confidence && !c.text.trim().is_empty() => {
            Some(c)
        }
        (current, _) => current,
    }
}

/// Folds one attempt into the running best.
pub fn fold_best(best: Option<BestCandidate>, attempt: &OcrAttempt) -> Option<BestCandidate> {
    prefer_stronger(best, attempt.score())
}

/// Best candidate over attempts in the given order.
pub fn best_candidate<'a, I>(attempts: I) -> Option<BestCandidate>
where
    I: IntoIterator<Item = &'a OcrAttempt>,
{
    attempts.into_iter().fold(None, fold_best)
}
