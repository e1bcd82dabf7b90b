//! Build caching - hash-based rebuild detection.
//!
//! Uses SHA256 hashes to detect actual content changes, not just mtimes.
//! This prevents unnecessary rebuilds when files are touched but unchanged.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Compute the SHA256 of a command line plus the contents of its inputs.
///
/// Each input contributes its path and its bytes, so renaming an input
/// changes the fingerprint as well. Fails if any input can't be read.
pub fn fingerprint(command: &str, inputs: &[&Path]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(command.as_bytes());
    hasher.update([0u8]);
    for path in inputs {
        let content =
            fs::read(path).with_context(|| format!("Failed to read input {}", path.display()))?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update((content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA256 of a string, hex encoded.
pub fn hash_str(s: &str) -> String {
    format!("{:x}", Sha256::digest(s.as_bytes()))
}

/// Read cached hash from a .hash file.
/// Returns None if file doesn't exist.
/// Logs a warning if file exists but can't be read.
pub fn read_cached_hash(hash_file: &Path) -> Option<String> {
    if !hash_file.exists() {
        return None;
    }
    match fs::read_to_string(hash_file) {
        Ok(s) => Some(s.trim().to_string()),
        Err(e) => {
            tracing::warn!(
                file = %hash_file.display(),
                error = %e,
                "failed to read cache hash file (will rebuild)"
            );
            None
        }
    }
}

/// Write hash to a .hash file.
pub fn write_cached_hash(hash_file: &Path, hash: &str) -> Result<()> {
    if let Some(parent) = hash_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(hash_file, hash)?;
    Ok(())
}

/// Check if target needs rebuild based on source hash.
///
/// Returns true if:
/// - Target doesn't exist
/// - No hash was recorded for it
/// - Source hash differs from cached hash
pub fn needs_rebuild(source_hash: &str, hash_file: &Path, target: &Path) -> bool {
    if !target.exists() {
        return true;
    }

    match read_cached_hash(hash_file) {
        Some(cached) => cached != source_hash,
        None => true,
    }
}
