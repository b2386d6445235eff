//! Path validation
//!
//! Resolves requested paths against the base directory and refuses anything
//! that would land outside of it.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ConfinementError;
use crate::storage::filesystem::directory_exists;

/// Resolve `requested` against `base` and verify it stays inside `base`.
///
/// `requested` may be relative or absolute. An absolute path replaces the base
/// in the join, so it is only accepted when it resolves to somewhere inside
/// the base directory. Containment is checked component-wise on canonical
/// forms: `/srv/out-old` is not inside `/srv/out`.
pub fn confine(base: &Path, requested: &Path) -> Result<PathBuf, ConfinementError> {
    if !directory_exists(base) {
        return Err(ConfinementError::BaseMissing(base.to_path_buf()));
    }

    let canonical_base = base
        .canonicalize()
        .map_err(|e| ConfinementError::Unresolvable(base.to_path_buf(), e))?;

    let joined = base.join(requested);
    let resolved = resolve(&joined).map_err(|e| ConfinementError::Unresolvable(joined, e))?;

    if !resolved.starts_with(&canonical_base) {
        return Err(ConfinementError::Escapes {
            resolved,
            base: base.to_path_buf(),
        });
    }

    Ok(resolved)
}

/// Canonicalize a path that may not exist yet.
///
/// Relative paths are taken from the current directory. Existing components
/// are resolved through the filesystem (following symlinks), the remainder is
/// appended lexically with `.` and `..` collapsed.
pub fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                // `..` can climb back out of a missing component, so every
                // component is probed rather than stopping at the first miss.
                match resolved.canonicalize() {
                    Ok(canonical) => resolved = canonical,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        // Dangling symlink: follow where it would point.
                        if let Ok(target) = std::fs::read_link(&resolved) {
                            resolved.pop();
                            resolved = resolve(&resolved.join(target))?;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotADirectory => {}
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(resolved)
}
