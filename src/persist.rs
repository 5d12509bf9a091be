//! Whole-file write-back.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Replace the content of `path` atomically.
///
/// The new content goes to a temporary file in the same directory, is
/// synced, takes over the permissions of the file it replaces and is then
/// renamed over it. Readers see either the old or the new content.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path has no parent directory",
            ))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    match fs::metadata(path) {
        Ok(metadata) => temp.as_file().set_permissions(metadata.permissions())?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
