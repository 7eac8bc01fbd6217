//! Card Scan
//!
//! Reads the printed name off a photo of a Magic: The Gathering card and
//! resolves it to a Scryfall record.
//!
//! The pipeline crops several candidate name bands, binarizes each one four
//! ways, runs every variant through four Tesseract page segmentation modes,
//! keeps the most confident reading, cleans it, and then walks a cascade of
//! Scryfall queries from strict to permissive.

pub mod config;
pub mod error;
pub mod normalize;
pub mod ocr;
pub mod paths;
pub mod scryfall;

pub use config::ScanConfig;
pub use error::{ScanError, ScanResult};
pub use normalize::{clean_card_name, NormalizedName};
pub use ocr::{CardNameReader, Identification, OcrEngine, RegionReport, TesseractEngine};
pub use scryfall::{CardRecord, CardResolver, CardSource, PrintingInfo, ScryfallClient};

/// Builds a Tesseract-backed name reader. Fails when Tesseract cannot be
/// located.
pub fn reader_from_config(config: &ScanConfig) -> ScanResult<CardNameReader<TesseractEngine>> {
    let paths = ocr::locate_tesseract(&config.tesseract)
        .map_err(|e| ScanError::SetupFailure(format!("{:#}", e)))?;
    let engine = TesseractEngine::new(
        paths,
        config.tesseract.language.clone(),
        config.tesseract.oem,
    );
    Ok(CardNameReader::new(
        engine,
        config.min_confidence,
        config.parallel_recognition,
    ))
}

/// Builds a Scryfall-backed resolver. Needs no OCR engine, so typed lookups
/// work on machines without Tesseract.
pub fn resolver_from_config(config: &ScanConfig) -> ScanResult<CardResolver<ScryfallClient>> {
    let client = ScryfallClient::new(&config.scryfall)
        .map_err(|e| ScanError::SetupFailure(format!("{:#}", e)))?;
    Ok(CardResolver::new(client))
}

/// A name reader and a card resolver configured together.
pub struct CardScanner<E = TesseractEngine, S = ScryfallClient> {
    pub reader: CardNameReader<E>,
    pub resolver: CardResolver<S>,
}

impl CardScanner {
    /// Builds a Tesseract- and Scryfall-backed scanner from configuration.
    pub fn from_config(config: &ScanConfig) -> ScanResult<Self> {
        Ok(Self::new(
            reader_from_config(config)?,
            resolver_from_config(config)?,
        ))
    }
}

impl<E: OcrEngine, S: CardSource> CardScanner<E, S> {
    pub fn new(reader: CardNameReader<E>, resolver: CardResolver<S>) -> Self {
        Self { reader, resolver }
    }

    /// Extracts a search-ready card name from image bytes.
    pub fn identify_from_image(&self, bytes: &[u8]) -> ScanResult<Identification> {
        self.reader.identify_from_image(bytes)
    }

    /// Identifies the name and resolves it to a single card.
    pub fn scan(&self, bytes: &[u8]) -> ScanResult<(Identification, CardRecord)> {
        let ident = self.identify_from_image(bytes)?;
        let record = self.resolver.resolve_one(&ident.name.source_line)?;
        Ok((ident, record))
    }

    pub fn resolve_one(&self, name: &str) -> ScanResult<CardRecord> {
        self.resolver.resolve_one(name)
    }

    pub fn resolve_many(&self, text: &str, limit: usize) -> ScanResult<Vec<CardRecord>> {
        self.resolver.resolve_many(text, limit)
    }

    pub fn resolve_at_printing(&self, name: &str, set_code: &str) -> ScanResult<PrintingInfo> {
        self.resolver.resolve_at_printing(name, set_code)
    }

    pub fn diagnose_regions(&self, bytes: &[u8]) -> ScanResult<Vec<RegionReport>> {
        self.reader.diagnose_regions(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::{png_bytes, ScriptedEngine};
    use crate::ocr::OcrToken;
    use crate::scryfall::testing::{card, FakeSource};
    use crate::scryfall::NamedMatch;

    #[test]
    fn test_scan_photo_to_record() {
        let engine = ScriptedEngine::uniform(vec![
            OcrToken::new("Lightning", 75.0),
            OcrToken::new("Bolt", 70.0),
            OcrToken::new("Instant", 71.0),
        ]);
        let source = FakeSource::default().with_named(
            NamedMatch::Exact,
            "Lightning Bolt",
            card("Lightning Bolt", "lea", Some("1993-08-05")),
        );
        let scanner = CardScanner::new(
            CardNameReader::new(engine, 30.0, false),
            CardResolver::new(source),
        );

        let (ident, record) = scanner.scan(&png_bytes(120, 200)).unwrap();
        assert_eq!(ident.name.value, "Lightning Bolt");
        assert_eq!(record.name, "Lightning Bolt");
        assert_eq!(record.set_code, "LEA");
    }

    #[test]
    fn test_resolver_does_not_need_tesseract() {
        let mut config = ScanConfig::default();
        config.tesseract.executable = Some("/nonexistent/tesseract".into());

        assert!(resolver_from_config(&config).is_ok());
        assert!(matches!(
            reader_from_config(&config),
            Err(ScanError::SetupFailure(_))
        ));
        assert!(matches!(
            CardScanner::from_config(&config),
            Err(ScanError::SetupFailure(_))
        ));
    }

    #[test]
    fn test_scan_unknown_card_is_no_match() {
        let engine = ScriptedEngine::uniform(vec![OcrToken::new("Qwzxv", 80.0)]);
        let scanner = CardScanner::new(
            CardNameReader::new(engine, 30.0, false),
            CardResolver::new(FakeSource::default()),
        );

        let err = scanner.scan(&png_bytes(120, 200)).unwrap_err();
        assert!(matches!(err, ScanError::NoMatch { .. }));
    }
}
