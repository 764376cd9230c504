/// Longest accepted upload filename, in characters.
pub const MAX_FILENAME_LEN: usize = 255;

/// Result of validating an upload filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename is longer than [`MAX_FILENAME_LEN`].
    TooLong,
    /// Filename contains path traversal patterns (`..`).
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Filename must be at most 255 characters",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validate the filename a client sent with an upload and return the name to
/// record.
///
/// Some clients send a full local path; only the last component is kept.
pub fn validate_upload_filename(filename: &str) -> Result<&str, FilenameError> {
    if filename.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    if base.is_empty() {
        return Err(FilenameError::Empty);
    }

    // Reject ASCII control characters to prevent
    // HTTP header injection (e.g. CRLF in Content-Disposition).
    if base.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if base == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if base.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    if base.chars().count() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }

    Ok(base)
}
