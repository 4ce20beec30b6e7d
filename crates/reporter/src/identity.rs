//! Machine identity.
//!
//! Every payload is tagged with an anonymous machine identifier: a truncated
//! SHA256 over host-specific data. It is stable across restarts and cannot be
//! reversed to identify the machine.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

/// Length of a machine identifier in hex characters
pub const MACHINE_ID_LEN: usize = 32;

/// Generate a deterministic machine identifier from machine-specific data.
pub fn generate_machine_identifier() -> String {
    let mut hasher = Sha256::new();

    if let Ok(hostname) = hostname::get() {
        hasher.update(hostname.to_string_lossy().as_bytes());
    }

    hasher.update(std::env::consts::OS.as_bytes());
    hasher.update(std::env::consts::ARCH.as_bytes());

    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }

    let result = hasher.finalize();
    hex::encode(&result[..MACHINE_ID_LEN / 2])
}

/// Check that `id` looks like something we generated.
pub fn is_valid_machine_identifier(id: &str) -> bool {
    id.len() == MACHINE_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Read a saved machine identifier without creating or repairing the file.
pub fn read_machine_identifier(path: &Path) -> Option<String> {
    let id = std::fs::read_to_string(path).ok()?;
    let id = id.trim();
    is_valid_machine_identifier(id).then(|| id.to_string())
}

/// Load the machine identifier from file, or generate and save a new one.
///
/// A file with anything other than a valid identifier is overwritten.
pub fn load_or_create_machine_identifier(path: &Path) -> std::io::Result<String> {
    if let Some(id) = read_machine_identifier(path) {
        return Ok(id);
    }
    if path.exists() {
        debug!(path = %path.display(), "invalid machine identifier on disk, regenerating");
    }

    let id = generate_machine_identifier();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, &id)?;
    Ok(id)
}

/// Directory holding beacon state (`~/.beacon`).
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".beacon")
}

/// Default path for the machine identifier file.
pub fn default_machine_id_path() -> PathBuf {
    default_data_dir().join("machine_id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_machine_identifier() {
        let id1 = generate_machine_identifier();
        let id2 = generate_machine_identifier();

        // Should be deterministic
        assert_eq!(id1, id2);
        assert!(is_valid_machine_identifier(&id1));
    }

    #[test]
    fn test_load_or_create_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("machine_id");

        let id = load_or_create_machine_identifier(&path).unwrap();
        assert!(is_valid_machine_identifier(&id));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), id);
    }

    #[test]
    fn test_load_existing_identifier() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machine_id");
        std::fs::write(&path, "0123456789abcdef0123456789abcdef\n").unwrap();

        let id = load_or_create_machine_identifier(&path).unwrap();
        assert_eq!(id, "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_invalid_identifier_regenerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machine_id");
        std::fs::write(&path, "not-an-id").unwrap();

        let id = load_or_create_machine_identifier(&path).unwrap();
        assert_eq!(id, generate_machine_identifier());
    }

    #[test]
    fn test_read_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machine_id");

        assert_eq!(read_machine_identifier(&path), None);
        assert!(!path.exists());

        std::fs::write(&path, "not-an-id").unwrap();
        assert_eq!(read_machine_identifier(&path), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not-an-id");

        std::fs::write(&path, "0123456789abcdef0123456789abcdef\n").unwrap();
        assert_eq!(
            read_machine_identifier(&path).as_deref(),
            Some("0123456789abcdef0123456789abcdef")
        );
    }

    #[test]
    fn test_default_paths() {
        let path = default_machine_id_path();
        assert!(path.to_string_lossy().contains(".beacon"));
        assert!(path.ends_with("machine_id"));
    }
}
