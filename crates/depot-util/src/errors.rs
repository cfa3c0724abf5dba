use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depot operations.
///
/// Ordinary resolution failures (missing artifacts, unsatisfiable
/// constraints) never surface here; they are recorded on the module tree.
/// These variants abort an operation.
#[derive(Debug, Error, Diagnostic)]
pub enum DepotError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed request file or configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check the request file for syntax errors"))]
    Config { message: String },

    /// A resolution rule is missing required fields or is otherwise invalid.
    #[error("Invalid rule: {message}")]
    #[diagnostic(help("Every rule needs a `rule` tag and its required fields"))]
    Rule { message: String },

    /// Invalid module coordinate string.
    #[error("Invalid coordinate: {message}")]
    #[diagnostic(help("Coordinates look like `group:name` or `group:name:version`"))]
    Coordinate { message: String },

    /// Dependency resolution could not run to completion.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Network request or repository access failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type DepotResult<T> = miette::Result<T>;
