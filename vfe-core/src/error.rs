//! VFS Error Types

use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations.
///
/// Engines never return these across the engine boundary; they keep the
/// last one around (see [`FileEngine::error`](crate::FileEngine::error)) and
/// signal failure through `false` / `-1`. The facade types turn them into
/// `VfsResult`s.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VfsError {
    /// File or directory not found
    #[error("path not found: {path}")]
    NotFound { path: String },

    /// Permission denied
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    /// Path already exists
    #[error("path already exists: {path}")]
    AlreadyExists { path: String },

    /// Operation requires an open file
    #[error("file is not open: {path}")]
    NotOpen { path: String },

    /// Engine already holds an open handle
    #[error("file is already open: {path}")]
    AlreadyOpen { path: String },

    /// Negative size/position or otherwise unusable argument
    #[error("invalid argument for '{path}': {reason}")]
    InvalidArgument { path: String, reason: String },

    /// Cursor lies beyond the end of the content
    #[error("position {position} is beyond the end of '{path}'")]
    OutOfRange { path: String, position: i64 },

    /// Backend does not accept modifications
    #[error("read-only file system: {path}")]
    ReadOnly { path: String },

    /// Engine does not implement the operation
    #[error("operation '{operation}' is not supported for '{path}'")]
    Unsupported { path: String, operation: String },

    /// Invalid path
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// IO error
    #[error("IO error: {message}")]
    Io { message: String },
}

impl VfsError {
    pub(crate) fn not_found(path: &str) -> Self {
        VfsError::NotFound { path: path.to_string() }
    }

    pub(crate) fn not_open(path: &str) -> Self {
        VfsError::NotOpen { path: path.to_string() }
    }

    pub(crate) fn already_exists(path: &str) -> Self {
        VfsError::AlreadyExists { path: path.to_string() }
    }

    pub(crate) fn read_only(path: &str) -> Self {
        VfsError::ReadOnly { path: path.to_string() }
    }

    pub(crate) fn invalid_argument(path: &str, reason: impl Into<String>) -> Self {
        VfsError::InvalidArgument {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(path: &str, operation: &str) -> Self {
        VfsError::Unsupported {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Map an OS error for `path` onto the taxonomy
    pub fn from_io(err: &std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            std::io::ErrorKind::AlreadyExists => Self::already_exists(path),
            std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied {
                path: path.to_string(),
            },
            _ => VfsError::Io {
                message: format!("{}: {}", path, err),
            },
        }
    }
}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        VfsError::Io {
            message: err.to_string(),
        }
    }
}

impl From<VfsError> for std::io::Error {
    fn from(err: VfsError) -> Self {
        let kind = match &err {
            VfsError::NotFound { .. } => std::io::ErrorKind::NotFound,
            VfsError::PermissionDenied { .. } | VfsError::ReadOnly { .. } => {
                std::io::ErrorKind::PermissionDenied
            }
            VfsError::AlreadyExists { .. } => std::io::ErrorKind::AlreadyExists,
            VfsError::InvalidArgument { .. } | VfsError::InvalidPath { .. } => {
                std::io::ErrorKind::InvalidInput
            }
            VfsError::Unsupported { .. } => std::io::ErrorKind::Unsupported,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            VfsError::not_found("/a").to_string(),
            "path not found: /a"
        );
        assert_eq!(
            VfsError::OutOfRange { path: "/f".into(), position: 10 }.to_string(),
            "position 10 is beyond the end of '/f'"
        );
    }

    #[test]
    fn test_from_io_kinds() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(VfsError::from_io(&err, "/x"), VfsError::not_found("/x"));

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(VfsError::from_io(&err, "/x"), VfsError::Io { .. }));
    }

    #[test]
    fn test_into_io_error() {
        let io: std::io::Error = VfsError::read_only("/r").into();
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
        assert!(io.to_string().contains("/r"));
    }
}
