use std::path::{Path, PathBuf};

use knivete_common::{Error, Result};
use tracing::debug;

/// A migration script read from disk. The filename is its identity in the
/// record table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub filename: String,
    pub content: String,
}

/// List the migration scripts in `dir`, sorted lexically by filename.
///
/// Subdirectories and dotfiles are ignored. A missing path or a path that is
/// not a directory is an error.
pub fn list_migrations(dir: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(dir).map_err(|e| Error::filesystem(dir, e))?;
    if !metadata.is_dir() {
        return Err(Error::filesystem(
            dir,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| Error::filesystem(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::filesystem(dir, e))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !path.is_file() {
            debug!("ignoring {}", path.display());
            continue;
        }
        files.push(path);
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn read_migration(path: &Path) -> Result<MigrationFile> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(MigrationFile { filename, content })
}
