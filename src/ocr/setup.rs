use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::TesseractConfig;
use crate::paths::get_tesseract_dir;

/// Well-known install locations checked after PATH.
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets tesseract use its compiled-in tessdata location.
    pub tessdata: Option<PathBuf>,
}

/// Resolves the tesseract executable and tessdata directory.
///
/// Explicit config wins, then the bundled `<exe_dir>/tesseract/`, then
/// PATH, then common install locations.
pub fn locate_tesseract(config: &TesseractConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config.executable.as_deref())?;
    let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.language);

    info!(
        "Tesseract at {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "engine default".to_string())
    );

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

fn bundled_executable() -> PathBuf {
    let name = if cfg!(windows) { "tesseract.exe" } else { "tesseract" };
    get_tesseract_dir().join(name)
}

/// Finds the Tesseract executable, checking explicit and local paths first, then system
pub fn find_tesseract_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tesseract executable does not exist: {}",
            path.display()
        ));
    }

    let local_exe = bundled_executable();
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Bundled dir, then `TESSDATA_PREFIX` (and its `tessdata/`), then common
/// install locations.
fn tessdata_candidates(prefix: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];
    if let Some(prefix) = prefix {
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix.to_path_buf());
    }
    candidates.extend(COMMON_TESSDATA.iter().map(PathBuf::from));
    candidates
}

/// Finds a tessdata directory holding `<language>.traineddata`.
pub fn find_tessdata_dir(explicit: Option<&Path>, language: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let traineddata = format!("{}.traineddata", language);
    let prefix = std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from);
    let found = tessdata_candidates(prefix.as_deref())
        .into_iter()
        .find(|dir| dir.join(&traineddata).exists());
    if found.is_none() {
        debug!("No tessdata with {} found, using engine default", traineddata);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_executable_is_used() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tesseract");
        std::fs::write(&exe, "").unwrap();

        assert_eq!(find_tesseract_executable(Some(&exe)).unwrap(), exe);
    }

    #[test]
    fn test_missing_explicit_executable_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(find_tesseract_executable(Some(&missing)).is_err());
    }

    #[test]
    fn test_tessdata_prefix_precedes_install_guesses() {
        let prefix = Path::new("/srv/tess");
        let candidates = tessdata_candidates(Some(prefix));

        assert_eq!(candidates[0], get_tesseract_dir().join("tessdata"));
        assert_eq!(candidates[1], prefix.join("tessdata"));
        assert_eq!(candidates[2], prefix.to_path_buf());
        assert_eq!(candidates.len(), 3 + COMMON_TESSDATA.len());
    }

    #[test]
    fn test_explicit_tessdata_wins() {
        let dir = tempdir().unwrap();
        assert_eq!(
            find_tessdata_dir(Some(dir.path()), "eng"),
            Some(dir.path().to_path_buf())
        );
    }
}
