use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PAIRING_DIR: &str = ".pairing";
pub const CONFIG_FILE: &str = ".pairing/config.yaml";

pub const DEFAULT_INPUT_FILE: &str = "participants.json";
pub const DEFAULT_OUTPUT_FILE: &str = "matches.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pairing_dir(root: &Path) -> PathBuf {
    root.join(PAIRING_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the project root. Absolute paths are
/// returned unchanged.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}
