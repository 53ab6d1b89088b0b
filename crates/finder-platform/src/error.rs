use std::io;
use std::path::Path;

use thiserror::Error;

use crate::mode::ModeError;

/// Failure of a single provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    #[error("permission denied: {path}")]
    AccessDenied { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Any other OS failure, with the native error kept intact.
    #[error("{path}: {source}")]
    Unknown {
        path: String,
        #[source]
        source: io::Error,
    },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Classify an I/O error raised while operating on `path`.
    pub fn from_io(err: io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            io::ErrorKind::IsADirectory => Self::IsADirectory { path },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Unknown { path, source: err },
        }
    }

    /// Adapter for `map_err`: `fs::read(p).await.map_err(ProviderError::at(p))`.
    pub fn at(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> Self {
        move |err| Self::from_io(err, path)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Native error code, only kept for `Unknown`.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Unknown { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Short error code in the style of `errno` names.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ENOENT",
            Self::AccessDenied { .. } => "EACCES",
            Self::NotADirectory { .. } => "ENOTDIR",
            Self::IsADirectory { .. } => "EISDIR",
            Self::AlreadyExists { .. } => "EEXIST",
            Self::InvalidInput(_) => "EINVAL",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ModeError> for ProviderError {
    fn from(e: ModeError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kind_mapping() {
        let cases = [
            (io::ErrorKind::NotFound, "ENOENT"),
            (io::ErrorKind::PermissionDenied, "EACCES"),
            (io::ErrorKind::NotADirectory, "ENOTDIR"),
            (io::ErrorKind::IsADirectory, "EISDIR"),
            (io::ErrorKind::AlreadyExists, "EEXIST"),
        ];
        for (kind, code) in cases {
            let err = ProviderError::from_io(io::Error::from(kind), "/tmp/a");
            assert_eq!(err.code(), code);
            assert!(err.to_string().ends_with("/tmp/a"));
        }
    }

    #[test]
    fn test_unknown_keeps_native_error() {
        let err = ProviderError::from_io(io::Error::from_raw_os_error(28), "/mnt/full");
        assert_eq!(err.code(), "UNKNOWN");
        assert_eq!(err.raw_os_error(), Some(28));
        assert!(err.to_string().starts_with("/mnt/full: "));
    }

    #[test]
    fn test_at_adapter() {
        let res: Result<(), io::Error> = Err(io::Error::from(io::ErrorKind::NotFound));
        let err = res.map_err(ProviderError::at("missing.txt")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mode_error_is_invalid_input() {
        let err: ProviderError = ModeError::InvalidOctal("9".into()).into();
        assert_eq!(err.code(), "EINVAL");
    }
}
