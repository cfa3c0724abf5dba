//! Repository metadata as seen by the resolver.

use serde::{Deserialize, Serialize};

use crate::module::{ModuleIdentifier, ModuleSpecification};
use crate::version::{self, VersionConstraint};

/// Metadata for one resolved module: its identity and declared dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub module_identifier: ModuleIdentifier,
    #[serde(default)]
    pub dependency_specifications: Vec<ModuleSpecification>,
}

impl Descriptor {
    pub fn new(
        module_identifier: ModuleIdentifier,
        dependency_specifications: Vec<ModuleSpecification>,
    ) -> Self {
        Self {
            module_identifier,
            dependency_specifications,
        }
    }
}

/// The versions a repository knows for one `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCatalog {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl VersionCatalog {
    pub fn new(group: impl Into<String>, name: impl Into<String>, versions: Vec<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            versions,
        }
    }

    /// `group:name` key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }

    /// Versions in ascending version order.
    pub fn sorted_versions(&self) -> Vec<String> {
        let mut versions = self.versions.clone();
        version::sort_versions(&mut versions);
        versions
    }

    /// The highest known version.
    pub fn latest(&self) -> Option<&str> {
        VersionConstraint::Any.select(&self.versions)
    }

    /// Pick the identifier that best satisfies `constraint`.
    pub fn select(&self, constraint: &VersionConstraint) -> Option<ModuleIdentifier> {
        constraint
            .select(&self.versions)
            .map(|v| ModuleIdentifier::new(&self.group, &self.name, v))
    }
}

/// A detached signature or checksum published next to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature kind, e.g. `sha1`, `sha256`, `md5`, `asc`.
    pub kind: String,
    pub content: String,
}

impl Signature {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }
}
