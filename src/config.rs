//! Scanner configuration.
//!
//! Loaded once at startup from a JSON file and handed to the scanner
//! explicitly. Missing fields fall back to their defaults, and a missing or
//! broken file falls back to the default config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Location and mode of the Tesseract installation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TesseractConfig {
    /// Explicit path to the tesseract binary. Discovered when absent.
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Explicit tessdata directory. The engine default is used when absent.
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
    /// Recognition language passed as `-l`
    #[serde(default = "default_language")]
    pub language: String,
    /// OCR engine mode passed as `--oem`
    #[serde(default = "default_oem")]
    pub oem: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: None,
            tessdata_dir: None,
            language: default_language(),
            oem: default_oem(),
        }
    }
}

/// Scryfall endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScryfallConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Result cap used when a search does not specify one
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for ScryfallConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            search_limit: default_search_limit(),
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub tesseract: TesseractConfig,
    /// Best-candidate confidence (0-100) must exceed this to count as a name
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Run the variant × mode matrix on the rayon pool
    #[serde(default)]
    pub parallel_recognition: bool,
    #[serde(default)]
    pub scryfall: ScryfallConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tesseract: TesseractConfig::default(),
            min_confidence: default_min_confidence(),
            parallel_recognition: false,
            scryfall: ScryfallConfig::default(),
        }
    }
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_oem() -> u8 {
    3
}

fn default_min_confidence() -> f32 {
    30.0
}

fn default_base_url() -> String {
    "https://api.scryfall.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("cardscan/{}", env!("CARGO_PKG_VERSION"))
}

fn default_search_limit() -> usize {
    20
}

impl ScanConfig {
    /// Loads configuration from an explicit file, or from the first
    /// existing standard location. Falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let candidates = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => crate::paths::config_candidates(),
        };

        for path in &candidates {
            if !path.exists() {
                continue;
            }
            info!("Loading config from {}", path.display());
            match Self::from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to load {}: {:#}. Using defaults.", path.display(), e);
                    return Self::default();
                }
            }
        }

        info!("No config file found. Using default config.");
        Self::default()
    }

    /// Reads and parses one config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.min_confidence, 30.0);
        assert_eq!(config.tesseract.language, "eng");
        assert_eq!(config.tesseract.oem, 3);
        assert_eq!(config.scryfall.timeout_secs, 10);
        assert_eq!(config.scryfall.base_url, "https://api.scryfall.com");
        assert!(!config.parallel_recognition);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "min_confidence": 45.5, "tesseract": { "executable": "/opt/tess/bin/tesseract" } }"#,
        )
        .unwrap();

        let config = ScanConfig::load(Some(&path));
        assert_eq!(config.min_confidence, 45.5);
        assert_eq!(
            config.tesseract.executable,
            Some(PathBuf::from("/opt/tess/bin/tesseract"))
        );
        assert_eq!(config.tesseract.language, "eng");
        assert_eq!(config.scryfall.search_limit, 20);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(ScanConfig::from_file(&path).is_err());
        let config = ScanConfig::load(Some(&path));
        assert_eq!(config.min_confidence, 30.0);
    }

    #[test]
    fn test_missing_explicit_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = ScanConfig::load(Some(&dir.path().join("absent.json")));
        assert_eq!(config.scryfall.timeout_secs, 10);
    }
}
