//! Rule evaluation: exclusion and rewriting of module specifications.

use depot_core::module::{ModuleIdentifier, ModuleSpecification};
use depot_core::rule::Rule;
use depot_core::version;
use depot_util::errors::DepotError;
use depot_util::glob::Glob;

/// A rule with its patterns compiled.
#[derive(Debug, Clone)]
enum CompiledRule {
    Exclude {
        name: Glob,
        group: Option<Glob>,
    },
    ExcludeDependencies {
        group: Glob,
        name: Glob,
    },
    RewriteGroupName {
        group: Glob,
        new_group: String,
        name: Option<Glob>,
        new_name: Option<String>,
    },
    RewriteVersion {
        group: Glob,
        name: Glob,
        new_version: String,
    },
}

/// Evaluates an ordered rule set against specifications and identifiers.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    /// Validate and compile `rules`. An invalid rule rejects the whole set.
    pub fn new(rules: &[Rule]) -> Result<Self, DepotError> {
        let rules = rules
            .iter()
            .map(|rule| {
                rule.validate()?;
                Ok(compile(rule))
            })
            .collect::<Result<Vec<_>, DepotError>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rewrite rule, in declaration order, to `spec`.
    ///
    /// Returns `true` when the specification changed.
    pub fn rewrite(&self, spec: &mut ModuleSpecification) -> bool {
        let original = spec.clone();
        for rule in &self.rules {
            match rule {
                CompiledRule::RewriteGroupName {
                    group,
                    new_group,
                    name,
                    new_name,
                } => {
                    let name_matches = name.as_ref().map_or(true, |n| n.matches(&spec.name));
                    if group.matches(&spec.group) && name_matches {
                        spec.group = new_group.clone();
                        if let Some(new_name) = new_name {
                            spec.name = new_name.clone();
                        }
                    }
                }
                CompiledRule::RewriteVersion {
                    group,
                    name,
                    new_version,
                } => {
                    if group.matches(&spec.group) && name.matches(&spec.name) {
                        spec.version = Some(rewritten_version(spec, new_version));
                    }
                }
                CompiledRule::Exclude { .. } | CompiledRule::ExcludeDependencies { .. } => {}
            }
        }
        *spec != original
    }

    /// Whether an exclude rule removes `group:name` from the resolution.
    pub fn is_excluded(&self, group: &str, name: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            CompiledRule::Exclude {
                name: name_pattern,
                group: group_pattern,
            } => {
                name_pattern.matches(name)
                    && group_pattern.as_ref().map_or(true, |g| g.matches(group))
            }
            _ => false,
        })
    }

    /// Whether the dependencies of `id` are dropped when it is reached
    /// transitively.
    pub fn excludes_dependencies(&self, id: &ModuleIdentifier) -> bool {
        self.rules.iter().any(|rule| match rule {
            CompiledRule::ExcludeDependencies { group, name } => {
                group.matches(&id.group) && name.matches(&id.name)
            }
            _ => false,
        })
    }
}

fn compile(rule: &Rule) -> CompiledRule {
    match rule {
        Rule::Exclude { name, group } => CompiledRule::Exclude {
            name: Glob::new(name),
            group: group.as_deref().map(Glob::new),
        },
        Rule::ExcludeDependencies { group, name } => CompiledRule::ExcludeDependencies {
            group: Glob::new(group),
            name: Glob::new(name),
        },
        Rule::RewriteGroupName {
            group,
            new_group,
            name,
            new_name,
        } => CompiledRule::RewriteGroupName {
            group: Glob::new(group),
            new_group: new_group.clone(),
            name: name.as_deref().map(Glob::new),
            new_name: new_name.clone().filter(|n| !n.trim().is_empty()),
        },
        Rule::RewriteVersion {
            group,
            name,
            new_version,
        } => CompiledRule::RewriteVersion {
            group: Glob::new(group),
            name: Glob::new(name),
            new_version: new_version.trim().to_string(),
        },
    }
}

/// The constraint a `rewriteVersion` rule installs on `spec`.
///
/// A `+` bound keeps an exact declared version that already satisfies it.
fn rewritten_version(spec: &ModuleSpecification, new_version: &str) -> String {
    if let Some(bound) = new_version.strip_suffix('+') {
        let declared = spec.constraint();
        if let Some(exact) = declared.exact() {
            if !bound.is_empty() && version::compare(exact, bound) >= 0 {
                return exact.to_string();
            }
        }
    }
    new_version.to_string()
}
