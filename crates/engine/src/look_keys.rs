use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookKeyError {
    #[error("look file name must not be empty")]
    Empty,
    #[error("look file name must not contain path separators")]
    PathSeparator,
    #[error("look file name must not contain '..'")]
    ParentTraversal,
    #[error("look file name must not start with '.'")]
    Hidden,
    #[error("look file name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Look file names are joined onto the project image directory, so they must
/// name a single file inside it.
pub(crate) fn validate_look_file_name(file_name: &str) -> Result<(), LookKeyError> {
    if file_name.is_empty() {
        return Err(LookKeyError::Empty);
    }
    if file_name.contains('/') || file_name.contains('\\') {
        return Err(LookKeyError::PathSeparator);
    }
    if file_name.contains("..") {
        return Err(LookKeyError::ParentTraversal);
    }
    if file_name.starts_with('.') {
        return Err(LookKeyError::Hidden);
    }
    for ch in file_name.chars() {
        if ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ' ') {
            continue;
        }
        return Err(LookKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}
