use std::{io::ErrorKind, path::Path};

use miette::{Context, IntoDiagnostic};

use crate::result::Result;

/// Size of the file if it exists and is not empty
pub fn non_empty_size(path: &Path) -> Option<u64> {
    path.metadata()
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .filter(|&len| len > 0)
}

/// Delete a file, doing nothing if it is already absent
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not delete {}", path.display()))
            .map_err(Into::into),
    }
}
