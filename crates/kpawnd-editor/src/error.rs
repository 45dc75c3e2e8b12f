//! Error types for the editor.

use kpawnd_vfs::VfsError;

/// Errors that can occur while editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Writing the buffer back through the VFS failed. The buffer is kept.
    Save {
        /// Path the save was aimed at
        path: String,
        /// Underlying filesystem error
        source: VfsError,
    },
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Save { path, source } => {
                write!(f, "[ Error writing {}: {} ]", path, source)
            }
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Save { source, .. } => Some(source),
        }
    }
}

/// Result type alias for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
