use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Tesseract page segmentation modes tried on every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RecognitionConfig {
    /// Treat the image as a single text line (psm 7)
    SingleLine,
    /// Treat the image as a single word (psm 8)
    SingleWord,
    /// Assume a single uniform block of text (psm 6)
    UniformBlock,
    /// Raw line, bypassing Tesseract-specific hacks (psm 13)
    RawLine,
}

impl RecognitionConfig {
    pub const ALL: [RecognitionConfig; 4] = [
        RecognitionConfig::SingleLine,
        RecognitionConfig::SingleWord,
        RecognitionConfig::UniformBlock,
        RecognitionConfig::RawLine,
    ];

    pub fn page_segmentation_mode(self) -> u8 {
        match self {
            RecognitionConfig::SingleLine => 7,
            RecognitionConfig::SingleWord => 8,
            RecognitionConfig::UniformBlock => 6,
            RecognitionConfig::RawLine => 13,
        }
    }
}

/// A single recognized word with its confidence in whole percent (0-100,
/// negative when the engine reports none).
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub text: String,
    pub confidence: f32,
}

impl OcrToken {
    /// Fractional confidences are truncated toward zero.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.trunc(),
        }
    }
}

/// Anything that can turn a binarized image into words.
pub trait OcrEngine: Send + Sync {
    /// Returns the recognized words in detection order.
    fn recognize(&self, img: &GrayImage, config: RecognitionConfig) -> Result<Vec<OcrToken>>;
}

/// Runs the tesseract command line tool with TSV output.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
    oem: u8,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, language: impl Into<String>, oem: u8) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            language: language.into(),
            oem,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, img: &GrayImage, config: RecognitionConfig) -> Result<Vec<OcrToken>> {
        if img.width() == 0 || img.height() == 0 {
            return Err(anyhow!("empty image ({}x{})", img.width(), img.height()));
        }

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("failed to write temp image for OCR")?;

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg(self.oem.to_string())
            .arg("--psm")
            .arg(config.page_segmentation_mode().to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(parse_tsv_tokens(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses Tesseract TSV output into word tokens, in detection order.
///
/// Only word rows (level 5) with non-blank text are kept; confidences are
/// passed through untouched so the aggregator can apply its own filter.
pub fn parse_tsv_tokens(tsv: &str) -> Vec<OcrToken> {
    let mut tokens = Vec::new();

    for line in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            continue;
        }

        let level: i32 = fields[0].trim().parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields.get(11).map(|t| t.trim()).unwrap_or("");
        if text.is_empty() {
            continue;
        }

        let confidence: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        tokens.push(OcrToken::new(text, confidence));
    }

    tokens
}
