//! Model and training data cache shared by the engines

use crate::error::DigitizeError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cache directory for downloaded models, created on demand
pub fn cache_dir(subdir: Option<&str>) -> Result<PathBuf, DigitizeError> {
    let mut dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("notes-digitizer");
    if let Some(sub) = subdir {
        dir = dir.join(sub);
    }

    std::fs::create_dir_all(&dir).map_err(|e| {
        DigitizeError::InitializationError(format!(
            "Failed to create cache directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    Ok(dir)
}

/// Return the cached file at `dir/filename`, downloading it first if absent
pub fn ensure_cached(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, DigitizeError> {
    let path = dir.join(filename);

    if path.exists() {
        tracing::info!("Using cached {} from {:?}", filename, path);
    } else {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    }

    Ok(path)
}

/// Download via a sibling `.part` file so a failed transfer never looks cached
fn download_file(url: &str, path: &Path) -> Result<(), DigitizeError> {
    let response = ureq::get(url).call().map_err(|e| {
        DigitizeError::InitializationError(format!("Failed to download {}: {}", url, e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        DigitizeError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        DigitizeError::InitializationError(format!("Failed to create {}: {}", partial.display(), e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        DigitizeError::InitializationError(format!("Failed to write {}: {}", partial.display(), e))
    })?;

    std::fs::rename(&partial, path).map_err(|e| {
        DigitizeError::InitializationError(format!("Failed to move {} into place: {}", path.display(), e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_file_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.rten"), b"weights").unwrap();

        // An unroutable URL proves no request is made
        let path = ensure_cached("http://127.0.0.1:9/model.rten", dir.path(), "model.rten").unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"weights");
    }

    #[test]
    fn test_failed_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = ensure_cached("http://127.0.0.1:9/missing.rten", dir.path(), "missing.rten");

        assert!(matches!(result, Err(DigitizeError::InitializationError(_))));
        assert!(!dir.path().join("missing.rten").exists());
    }
}
