//! Resolution tree nodes.

use std::fmt;

use depot_core::module::{ModuleIdentifier, ModuleSpecification};
use thiserror::Error;

/// Where a node is in its resolution lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// Not started; stays this way when a pass is cancelled first.
    Pending,
    /// A repository fetch was in flight and its result was discarded.
    Fetching,
    Resolved,
    Unresolved,
    Excluded,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleState::Pending => "pending",
            ModuleState::Fetching => "fetching",
            ModuleState::Resolved => "resolved",
            ModuleState::Unresolved => "unresolved",
            ModuleState::Excluded => "excluded",
        };
        f.write_str(s)
    }
}

/// Why a module could not be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error("{what} not found in any repository")]
    NotFound { what: String },

    #[error("no version of {module} satisfies `{constraint}`")]
    ConstraintUnsatisfiable { module: String, constraint: String },

    #[error("repository unavailable: {message}")]
    RepositoryUnavailable { message: String },
}

/// One node of a resolution tree. Each parent owns its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// The specification after rewrite rules were applied.
    pub specification: ModuleSpecification,
    pub resolved_identifier: Option<ModuleIdentifier>,
    pub dependencies: Vec<Module>,
    pub state: ModuleState,
    pub reason: Option<ModuleError>,
    /// The identifier already appears among this node's ancestors; the node
    /// is resolved but not expanded again.
    pub cyclic: bool,
}

impl Module {
    pub fn pending(specification: ModuleSpecification) -> Self {
        Self {
            specification,
            resolved_identifier: None,
            dependencies: Vec::new(),
            state: ModuleState::Pending,
            reason: None,
            cyclic: false,
        }
    }

    pub fn excluded(specification: ModuleSpecification) -> Self {
        Self {
            state: ModuleState::Excluded,
            ..Self::pending(specification)
        }
    }

    pub fn unresolved(specification: ModuleSpecification, reason: ModuleError) -> Self {
        Self {
            state: ModuleState::Unresolved,
            reason: Some(reason),
            ..Self::pending(specification)
        }
    }

    pub fn resolved(
        specification: ModuleSpecification,
        identifier: ModuleIdentifier,
        dependencies: Vec<Module>,
    ) -> Self {
        Self {
            resolved_identifier: Some(identifier),
            dependencies,
            state: ModuleState::Resolved,
            ..Self::pending(specification)
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ModuleState::Resolved
    }

    /// Render this node and its subtree, one node per line.
    ///
    /// `max_depth` limits how many dependency levels are shown.
    pub fn dump(&self, max_depth: Option<usize>) -> String {
        let mut output = format!("{self}\n");
        self.dump_children(&mut output, "", 0, max_depth);
        output
    }

    fn dump_children(&self, output: &mut String, prefix: &str, depth: usize, max_depth: Option<usize>) {
        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        let count = self.dependencies.len();
        for (i, child) in self.dependencies.iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { "└── " } else { "├── " };
            output.push_str(&format!("{prefix}{connector}{child}\n"));
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            child.dump_children(output, &child_prefix, depth + 1, max_depth);
        }
    }

    /// Visit this node and its subtree depth-first, left to right.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Module)) {
        visit(self);
        for child in &self.dependencies {
            child.walk(visit);
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.resolved_identifier, self.state) {
            (Some(id), ModuleState::Resolved) => {
                let requested = self.specification.version.as_deref();
                if requested.is_some_and(|v| v != id.version) {
                    write!(f, "{} -> {}", self.specification, id.version)?;
                } else {
                    write!(f, "{id}")?;
                }
                if self.cyclic {
                    write!(f, " (*)")?;
                }
                Ok(())
            }
            (_, ModuleState::Unresolved) => match &self.reason {
                Some(reason) => write!(f, "{} (unresolved: {reason})", self.specification),
                None => write!(f, "{} (unresolved)", self.specification),
            },
            (_, state) => write!(f, "{} ({state})", self.specification),
        }
    }
}
