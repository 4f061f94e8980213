//! Keystore file name checks.
//!
//! Key names and interface names become flat file names directly under the
//! keystore directory, so anything that could escape it is rejected.

use crate::error::{Result, WgError};

/// Validates a name used as a file directly inside the keystore.
///
/// # Errors
///
/// Returns [`WgError::InvalidName`] if the name is empty, is `.` or `..`, or
/// contains a path separator or NUL byte.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(WgError::invalid_name(name, "must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(WgError::invalid_name(name, "must not be a relative directory"));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(WgError::invalid_name(name, format!("must not contain {c:?}")));
    }
    Ok(())
}
