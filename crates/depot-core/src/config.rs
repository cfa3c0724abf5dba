use serde::{Deserialize, Serialize};
use std::path::Path;

use depot_util::errors::DepotError;

use crate::module::ModuleSpecification;
use crate::rule::Rule;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Resolver settings from `[resolver]` in a request file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Upper bound on repository fetches running at the same time.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// How many times conflict resolution may re-run the expansion.
    #[serde(default = "default_max_conflict_rounds")]
    pub max_conflict_rounds: usize,

    /// Serialize every repository call through one resolver-owned lock.
    #[serde(default)]
    pub serialize_repository_access: bool,

    /// Check fetched POMs against their published checksums.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Repositories used when a request names none.
    #[serde(default = "default_repositories")]
    pub default_repositories: Vec<RepositoryEntry>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            max_conflict_rounds: default_max_conflict_rounds(),
            serialize_repository_access: false,
            verify_checksums: false,
            default_repositories: default_repositories(),
        }
    }
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_max_conflict_rounds() -> usize {
    8
}

fn default_repositories() -> Vec<RepositoryEntry> {
    vec![RepositoryEntry::new(MAVEN_CENTRAL_URL)]
}

/// A repository to consult, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RepositoryEntry {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
        }
    }

    /// Explicit name, or the URI when none was given.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uri)
    }
}

/// A complete resolution request: modules, repositories, rules, and settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpecification>,

    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryEntry>,

    #[serde(default, rename = "rule")]
    pub rules: Vec<Rule>,
}

impl ResolveRequest {
    /// Load and validate a request file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DepotError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a request from TOML text.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        let request: Self = toml::from_str(content).map_err(|e| DepotError::Config {
            message: format!("Failed to parse request: {e}"),
        })?;
        request.validate()?;
        Ok(request)
    }

    /// Reject empty coordinates, empty repository URIs, and incomplete rules.
    pub fn validate(&self) -> Result<(), DepotError> {
        for module in &self.modules {
            module.validate()?;
        }
        for repo in &self.repositories {
            if repo.uri.trim().is_empty() {
                return Err(DepotError::Config {
                    message: "repository entries need a non-empty `uri`".to_string(),
                });
            }
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        if self.resolver.max_concurrent_fetches == 0 {
            return Err(DepotError::Config {
                message: "`max-concurrent-fetches` must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The repositories to consult: the request's own, or the configured defaults.
    pub fn effective_repositories(&self) -> &[RepositoryEntry] {
        if self.repositories.is_empty() {
            &self.resolver.default_repositories
        } else {
            &self.repositories
        }
    }
}
