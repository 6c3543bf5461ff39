//! Derives an install directory name from a repository locator.

use crate::error::NameError;
use crate::layout::validate_directory_name;

/// Derives the directory a clone of `locator` lands in.
///
/// The final path segment is used, minus any trailing `/` and `.git`
/// suffix. SSH-style locators without a path (`host:repo.git`) keep the text
/// after the last `:`.
///
/// # Errors
///
/// Returns [`NameError`] when nothing usable remains or the result is not a
/// plain directory name.
pub(crate) fn derive_directory_name(locator: &str) -> Result<String, NameError> {
    let trimmed = locator.trim().trim_end_matches('/');
    let mut name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    for _ in 0..2 {
        name = name.strip_suffix(".git").unwrap_or(name);
    }
    let name = name.rsplit(':').next().unwrap_or(name);
    validate_directory_name(name)?;
    Ok(name.to_owned())
}
