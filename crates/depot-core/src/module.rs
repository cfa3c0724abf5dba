//! Module coordinates: resolved identifiers and version-constrained specifications.

use std::fmt;
use std::str::FromStr;

use depot_util::errors::DepotError;
use depot_util::glob::Glob;
use serde::{Deserialize, Serialize};

use crate::version::VersionConstraint;

/// A fully resolved `group:name:version` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleIdentifier {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:name:version"`.
    pub fn parse(s: &str) -> Result<Self, DepotError> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *name, *version))
            }
            _ => Err(DepotError::Coordinate {
                message: format!("expected `group:name:version`, got `{s}`"),
            }),
        }
    }

    /// `group:name` key shared by every version of this module.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }

    /// Whether this identifier names the same module as `other`, ignoring version.
    pub fn same_module(&self, other: &ModuleIdentifier) -> bool {
        self.group == other.group && self.name == other.name
    }
}

impl FromStr for ModuleIdentifier {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A requested module: group and name plus an optional version constraint.
///
/// Rewrite rules mutate specifications in place before they are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleSpecification {
    pub group: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ModuleSpecification {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<impl Into<String>>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.map(Into::into).filter(|v: &String| !v.trim().is_empty()),
        }
    }

    /// Parse `"group:name"` or `"group:name:constraint"`.
    pub fn parse(s: &str) -> Result<Self, DepotError> {
        let parts: Vec<&str> = s.trim().splitn(3, ':').collect();
        match parts.as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(*group, *name, None::<String>))
            }
            [group, name, version] if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(*group, *name, Some(*version)))
            }
            _ => Err(DepotError::Coordinate {
                message: format!("expected `group:name[:version]`, got `{s}`"),
            }),
        }
    }

    /// Reject specifications with an empty group or name.
    pub fn validate(&self) -> Result<(), DepotError> {
        if self.group.trim().is_empty() || self.name.trim().is_empty() {
            return Err(DepotError::Coordinate {
                message: format!("module `{self}` needs both a group and a name"),
            });
        }
        Ok(())
    }

    /// The parsed version constraint (`Any` when no version is given).
    pub fn constraint(&self) -> VersionConstraint {
        VersionConstraint::parse(self.version.as_deref().unwrap_or(""))
    }

    /// `group:name` key, matching [`ModuleIdentifier::key`].
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }

    /// Whether group and name match, by glob when the field contains wildcards.
    pub fn matches_module(&self, group: &str, name: &str) -> bool {
        field_matches(&self.group, group) && field_matches(&self.name, name)
    }

    /// Whether `id` satisfies this specification.
    pub fn allows(&self, id: &ModuleIdentifier) -> bool {
        self.matches_module(&id.group, &id.name) && self.constraint().allows(&id.version)
    }

    /// The identifier this specification pins, when its constraint is exact.
    pub fn exact_identifier(&self) -> Option<ModuleIdentifier> {
        let version = self.constraint().exact()?.to_string();
        Some(ModuleIdentifier::new(&self.group, &self.name, version))
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    let glob = Glob::new(pattern);
    if glob.has_wildcards() {
        glob.matches(value)
    } else {
        pattern == value
    }
}

impl FromStr for ModuleSpecification {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModuleSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref v) => write!(f, "{}:{}:{}", self.group, self.name, v),
            None => write!(f, "{}:{}", self.group, self.name),
        }
    }
}
