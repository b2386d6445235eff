//! File system probes
//!
//! Point-in-time checks used before touching the file system. Results are
//! never cached.

use std::path::Path;
use tokio::fs;

/// What currently occupies a path, without following a final symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Nothing,
    Directory,
    File,
}

/// Check if a directory exists at `path`
pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Inspect what is at `path`.
///
/// Symlinks count as files: unlinking one removes the link, not its target.
pub async fn occupant(path: &Path) -> std::io::Result<Occupant> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(Occupant::Directory),
        Ok(_) => Ok(Occupant::File),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Occupant::Nothing),
        Err(e) => Err(e),
    }
}
