//! Error types for fwbuild

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for fwbuild operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fwbuild
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A spawned command exited with a non-zero status
    #[error("Command failed ({command}): {status}")]
    #[diagnostic(help(
        "The full output was streamed above; a failure report may have been written to the scratch directory"
    ))]
    Process {
        /// Command line that failed
        command: String,
        /// Exit status reported by the operating system
        status: std::process::ExitStatus,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(help("{help}"))]
    Config { message: String, help: String },

    /// Hardware-definition resolution error
    #[error("Hwdef error: {message}")]
    #[diagnostic(help("{help}"))]
    Hwdef { message: String, help: String },

    /// Board registry error
    #[error("Board registry error: {message}")]
    #[diagnostic(help("{help}"))]
    Registry { message: String, help: String },
}

impl Error {
    /// Create a process failure error
    pub fn process(command: impl Into<String>, status: std::process::ExitStatus) -> Self {
        Self::Process {
            command: command.into(),
            status,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a hardware-definition resolution error
    pub fn hwdef(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Hwdef {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a board registry error
    pub fn registry(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
            help: help.into(),
        }
    }
}
