//! Error types for the shell.
//!
//! Every variant renders as the exact line a shell would print, so the
//! engine can hand `to_string()` straight to the terminal.

use kpawnd_vfs::VfsError;

/// Errors produced while running a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// A filesystem call failed
    Fs {
        /// Command and operand, e.g. `cat: notes`
        context: String,
        source: VfsError,
    },

    /// The effective user may not do this without escalation
    PermissionDenied { context: String },

    /// Wrong password at the sudo prompt
    AuthenticationFailed,

    /// No builtin by this name; the caller may try it elsewhere
    UnrecognizedCommand(String),

    /// Bad arguments. `usage` is printed as-is.
    MalformedInput { usage: String },

    /// The command refuses to act on this operand
    Refused { message: String },
}

impl ShellError {
    pub fn fs(context: impl Into<String>, source: VfsError) -> Self {
        Self::Fs {
            context: context.into(),
            source,
        }
    }

    pub fn permission_denied(context: impl Into<String>) -> Self {
        Self::PermissionDenied {
            context: context.into(),
        }
    }

    pub fn usage(usage: impl Into<String>) -> Self {
        Self::MalformedInput {
            usage: usage.into(),
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self::Refused {
            message: message.into(),
        }
    }

    /// Whether the presentation layer should try the line elsewhere.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::UnrecognizedCommand(_))
    }
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fs { context, source } => write!(f, "{}: {}", context, source),
            Self::PermissionDenied { context } => write!(f, "{}: Permission denied", context),
            Self::AuthenticationFailed => write!(f, "sudo: Authentication failure"),
            Self::UnrecognizedCommand(cmd) => write!(f, "sh: {}: command not found", cmd),
            Self::MalformedInput { usage } => write!(f, "{}", usage),
            Self::Refused { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fs { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for shell operations
pub type ShellResult<T> = Result<T, ShellError>;
