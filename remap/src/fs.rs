//! File system-related utilities.

use std::path::{Path, PathBuf};

/// Canonicalize the given path if possible. Paths that do not (yet) exist
/// are returned as given, so they can still serve as stable cache keys.
pub fn resolve_path<P>(path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
