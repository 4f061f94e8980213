//! Flat-file persistence for the keystore.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use crate::error::{Result, WgError};

/// Permission bits for key files and config documents, which hold secrets.
#[cfg(unix)]
const SECRET_FILE_MODE: u32 = 0o600;

/// Writes `contents` to `path`, replacing any previous file, and syncs it.
pub(crate) async fn write_secret_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(SECRET_FILE_MODE);

    let mut file = options.open(path).await.map_err(|e| WgError::file_io(path, e))?;
    file.write_all(contents).await.map_err(|e| WgError::file_io(path, e))?;
    file.sync_all().await.map_err(|e| WgError::file_io(path, e))
}

/// Reads the whole file at `path`.
pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| WgError::file_io(path, e))
}
