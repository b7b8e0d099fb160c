use std::fmt;
use std::path::PathBuf;

/// Result type for archive-level operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Fatal bundle-level failures. Any of these aborts the run before
/// evaluation starts.
#[derive(Debug)]
pub enum ArchiveError {
    /// IO operation failed
    Io(std::io::Error),

    /// ZIP container is corrupt or an entry is unreadable
    Zip(zip::result::ZipError),

    /// Bundle path does not exist or is neither a file nor a directory
    NotFound(PathBuf),

    /// Decompressed content exceeded the configured extraction cap
    SizeLimit { limit_bytes: u64 },

    /// Directory traversal failed
    WalkDir(walkdir::Error),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Io(err) => write!(f, "IO error: {}", err),
            ArchiveError::Zip(err) => write!(f, "ZIP error: {}", err),
            ArchiveError::NotFound(path) => {
                write!(f, "bundle not found: {}", path.display())
            }
            ArchiveError::SizeLimit { limit_bytes } => write!(
                f,
                "extraction aborted: decompressed size exceeds {} bytes",
                limit_bytes
            ),
            ArchiveError::WalkDir(err) => write!(f, "directory traversal error: {}", err),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(err) => Some(err),
            ArchiveError::Zip(err) => Some(err),
            ArchiveError::WalkDir(err) => Some(err),
            ArchiveError::NotFound(_) | ArchiveError::SizeLimit { .. } => None,
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io(err)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Zip(err)
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(err: walkdir::Error) -> Self {
        ArchiveError::WalkDir(err)
    }
}

/// Soft failure while parsing one source file.
///
/// Recoverable: the caller treats the source as absent for its category,
/// records a warning, and continues with whatever else succeeded.
#[derive(Debug)]
pub struct ParseError {
    pub source: String,
    pub message: String,
}

impl ParseError {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.source, self.message)
    }
}

impl std::error::Error for ParseError {}
