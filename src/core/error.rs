use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("World '{0}' was not found on the server")]
    MissingEnvironment(String),

    #[error("Unknown circuit class '{0}'")]
    UnknownCircuitClass(String),

    #[error("Malformed circuit record: {0}")]
    MalformedRecord(String),

    #[error("Circuit id {0} is already in use")]
    DuplicateId(u32),

    #[error("Circuit activation rejected: {0}")]
    ActivationRejected(String),

    #[error("Circuit {0} panicked in its save hook")]
    HookPanicked(u32),

    #[error("I/O error on '{}': {message}", path.display())]
    FileIo { path: PathBuf, message: String },

    #[error("Corrupt circuits file '{}': {message}", path.display())]
    CorruptFile { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CircuitError>;

impl CircuitError {
    pub fn file_io(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::FileIo {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn corrupt_file(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::CorruptFile {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// True when the data file that produced this error should be backed up
    /// before anything else touches it. Plain I/O failures and save-time
    /// errors say nothing about the file contents.
    pub fn warrants_backup(&self) -> bool {
        !matches!(self, Self::FileIo { .. } | Self::HookPanicked(_))
    }
}

impl From<serde_json::Error> for CircuitError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedRecord(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        let err = CircuitError::MissingEnvironment("nether".to_string());
        assert!(err.to_string().contains("nether"));

        let err = CircuitError::DuplicateId(7);
        assert!(err.to_string().contains('7'));

        let err = CircuitError::file_io("/data/world.circuits", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("/data/world.circuits"), "got: {msg}");
        assert!(msg.contains("permission denied"), "got: {msg}");
    }

    #[test]
    fn backup_classification() {
        assert!(CircuitError::UnknownCircuitClass("x".into()).warrants_backup());
        assert!(CircuitError::MalformedRecord("x".into()).warrants_backup());
        assert!(CircuitError::MissingEnvironment("x".into()).warrants_backup());
        assert!(CircuitError::corrupt_file("a", "b").warrants_backup());
        assert!(!CircuitError::file_io("a", "b").warrants_backup());
        assert!(!CircuitError::HookPanicked(3).warrants_backup());
    }

    #[test]
    fn json_errors_become_malformed_records() {
        let json_err = serde_json::from_str::<Vec<i32>>("[1, \"two\"]").unwrap_err();
        let err: CircuitError = json_err.into();
        assert!(matches!(err, CircuitError::MalformedRecord(_)));
    }
}
