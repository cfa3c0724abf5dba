//! The repository seam the resolver depends on.

use depot_core::descriptor::{Descriptor, Signature, VersionCatalog};
use depot_core::module::ModuleIdentifier;
use depot_util::errors::DepotError;
use thiserror::Error;

/// Failure to serve a request from one repository.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// The repository has no such coordinate or catalog.
    #[error("{what} not found in {repository}")]
    NotFound { what: String, repository: String },

    /// Transport-level failure (connection, timeout, server error, I/O).
    #[error("{repository} unavailable: {message}")]
    Unavailable { repository: String, message: String },

    /// The repository answered with a document that could not be used.
    #[error("malformed response from {repository}: {message}")]
    Malformed { repository: String, message: String },
}

impl RepositoryError {
    pub fn not_found(what: impl Into<String>, repository: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            repository: repository.into(),
        }
    }

    pub fn unavailable(repository: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            repository: repository.into(),
            message: message.into(),
        }
    }

    pub fn malformed(repository: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            repository: repository.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<RepositoryError> for DepotError {
    fn from(err: RepositoryError) -> Self {
        DepotError::Network {
            message: err.to_string(),
        }
    }
}

/// A source of module descriptors, version catalogs, and signatures.
///
/// Implementations must be safe to call from several resolution branches at
/// once; the resolver can serialize access when they are not.
#[async_trait::async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Human-readable name used in logs and error messages.
    fn name(&self) -> &str;

    /// Location of the repository, e.g. its base URL.
    fn uri(&self) -> &str {
        self.name()
    }

    /// Fetch the descriptor for an exact identifier.
    async fn fetch_descriptor(&self, id: &ModuleIdentifier)
        -> Result<Descriptor, RepositoryError>;

    /// Fetch every version the repository knows for `group:name`.
    async fn fetch_version_catalog(
        &self,
        group: &str,
        name: &str,
    ) -> Result<VersionCatalog, RepositoryError>;

    /// Fetch a detached signature (`sha1`, `md5`, `asc`, ...) for an artifact.
    ///
    /// Absence is `Ok(None)`, not an error.
    async fn fetch_signature(
        &self,
        locator: &str,
        kind: &str,
    ) -> Result<Option<Signature>, RepositoryError>;
}
