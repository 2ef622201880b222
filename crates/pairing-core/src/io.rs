use crate::error::{PairingError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// A reader never observes a half-written results file, and a re-run replaces
/// the previous file in one step.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Format-by-extension helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(DataFormat::Json),
            "yaml" | "yml" => Ok(DataFormat::Yaml),
            _ => Err(PairingError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Deserialize a JSON or YAML document, picking the parser from the extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DataFormat::from_path(path)?;
    let data = std::fs::read_to_string(path)?;
    let value = match format {
        DataFormat::Json => serde_json::from_str(&data)?,
        DataFormat::Yaml => serde_yaml::from_str(&data)?,
    };
    Ok(value)
}

/// Serialize `value` as JSON or YAML (by extension) and write it atomically.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = match DataFormat::from_path(path)? {
        DataFormat::Json => {
            let mut s = serde_json::to_string_pretty(value)?;
            s.push('\n');
            s
        }
        DataFormat::Yaml => serde_yaml::to_string(value)?,
    };
    atomic_write(path, data.as_bytes())
}
