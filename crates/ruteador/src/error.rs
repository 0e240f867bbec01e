use std::{io, num::ParseFloatError, num::ParseIntError, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Route id must not be empty")]
    EmptyRouteId,

    #[error("No stops selected")]
    EmptySelection,

    #[error("Invalid position {position}: must be between 1 and {len}")]
    InvalidPosition { position: usize, len: usize },

    #[error("Not in the current route: {label}")]
    NotSelected { label: String },

    #[error("No saved route {0}")]
    RouteNotFound(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid CSV Header: {0}")]
    CsvHeader(String),

    #[error("Invalid coordinate at row {row}: {value}")]
    CoordinateParse {
        row: usize,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("Invalid order at row {row}: {value}")]
    OrderParse {
        row: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl RouteError {
    /// Operator input that was rejected before any state changed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RouteError::EmptyRouteId
                | RouteError::EmptySelection
                | RouteError::InvalidPosition { .. }
                | RouteError::InvalidCommand(_)
        )
    }
}

impl From<toml::de::Error> for RouteError {
    fn from(err: toml::de::Error) -> Self {
        RouteError::Config(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_grouping() {
        assert!(RouteError::EmptyRouteId.is_validation());
        assert!(RouteError::EmptySelection.is_validation());
        assert!(RouteError::InvalidPosition { position: 4, len: 3 }.is_validation());
        assert!(
            !RouteError::NotSelected {
                label: "T1".to_string()
            }
            .is_validation()
        );
        assert!(!RouteError::Io(io::Error::other("disk")).is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = RouteError::InvalidPosition { position: 0, len: 2 };
        assert_eq!(err.to_string(), "Invalid position 0: must be between 1 and 2");

        let err = RouteError::NotSelected {
            label: "T1, T2".to_string(),
        };
        assert!(err.to_string().contains("T1, T2"));
    }
}
