//! Error types for the surfaces around the engine.
//!
//! Engine errors live in [`crate::molecule::error`]. The types here cover
//! configuration, JSON input files and tabular export.

use std::path::PathBuf;

use thiserror::Error;

use crate::molecule::LayoutError;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while locating or loading JSON input files.
#[derive(Error, Debug)]
pub enum SpecFileError {
    /// A glob pattern was malformed.
    #[error("invalid file pattern: {pattern}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// An input file could not be read.
    #[error("failed to read input file: {path}")]
    Read {
        /// Path to the input file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An input file does not hold the expected JSON document.
    #[error("failed to parse input file: {path}")]
    Parse {
        /// Path to the input file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Why one file in a batch produced no layout.
#[derive(Error, Debug)]
pub enum BatchItemError {
    /// The file could not be loaded.
    #[error(transparent)]
    File(#[from] SpecFileError),

    /// The spec was loaded but could not be laid out.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors that can occur while tabulating results.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A record could not be written.
    #[error("failed to write CSV record")]
    Csv(#[from] csv::Error),

    /// The finished buffer could not be recovered from the writer.
    #[error("failed to flush CSV output")]
    Flush(#[from] csv::IntoInnerError<csv::Writer<Vec<u8>>>),

    /// The output was not valid UTF-8.
    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn spec_file_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = SpecFileError::Parse {
            path: PathBuf::from("specs/four_pin.json"),
            source,
        };
        assert!(error.to_string().contains("four_pin.json"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn pattern_error_names_pattern() {
        let source = glob::Pattern::new("[").unwrap_err();
        let error = SpecFileError::Pattern {
            pattern: "[".to_string(),
            source,
        };
        assert_eq!(error.to_string(), "invalid file pattern: [");
    }
}
