//! Error types for the VFS layer.

use serde::{Deserialize, Serialize};

/// Errors from VFS operations.
///
/// `Display` uses the phrasing a Unix shell prints after the command and
/// path, so callers only have to prepend their own context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VfsError {
    /// A path segment does not exist
    PathNotFound,

    /// The leaf already exists
    AlreadyExists,

    /// A file was found where a directory was required
    NotADirectory,

    /// A directory was found where a file was required
    IsADirectory,

    /// Non-recursive removal of a populated directory
    NotEmpty,

    /// The operation is never allowed on this node (e.g. removing root)
    PermissionDenied,

    /// Malformed path or node name
    InvalidPath(String),

    /// Export or import of a snapshot failed
    Snapshot(String),
}

impl VfsError {
    /// Create an invalid path error with message.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a snapshot error with message.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }
}

impl std::fmt::Display for VfsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathNotFound => write!(f, "No such file or directory"),
            Self::AlreadyExists => write!(f, "File exists"),
            Self::NotADirectory => write!(f, "Not a directory"),
            Self::IsADirectory => write!(f, "Is a directory"),
            Self::NotEmpty => write!(f, "Directory not empty"),
            Self::PermissionDenied => write!(f, "Permission denied"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
            Self::Snapshot(msg) => write!(f, "snapshot error: {}", msg),
        }
    }
}

impl std::error::Error for VfsError {}

/// Result type alias for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            VfsError::PathNotFound.to_string(),
            "No such file or directory"
        );
        assert_eq!(VfsError::NotEmpty.to_string(), "Directory not empty");
        assert_eq!(
            VfsError::invalid_path("empty name").to_string(),
            "Invalid path: empty name"
        );
    }

    #[test]
    fn test_error_construction() {
        match VfsError::snapshot("bad json") {
            VfsError::Snapshot(msg) => assert_eq!(msg, "bad json"),
            other => panic!("Expected Snapshot, got {:?}", other),
        }
    }
}
