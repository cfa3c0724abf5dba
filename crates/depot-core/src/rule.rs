//! Declarative resolution rules.
//!
//! Rules are written as tagged tables, e.g. in a request file:
//!
//! ```toml
//! [[rule]]
//! rule = "rewriteVersion"
//! group = "com.beust"
//! name = "*c?mmand*"
//! newVersion = "1.35+"
//! ```
//!
//! Group and name fields are wildcard patterns (see [`depot_util::glob`]).

use std::fmt;

use depot_util::errors::DepotError;
use serde::{Deserialize, Serialize};

/// One resolution rule. Rules apply in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Rule {
    /// Remove matching modules and their subtrees from the resolution.
    Exclude {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
    },
    /// Drop the dependencies of a matching module reached transitively.
    ExcludeDependencies { group: String, name: String },
    /// Move matching specifications to another group (and optionally name).
    RewriteGroupName {
        group: String,
        new_group: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_name: Option<String>,
    },
    /// Replace the version constraint of matching specifications.
    RewriteVersion {
        group: String,
        name: String,
        new_version: String,
    },
}

impl Rule {
    /// The rule tag as written in request files.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Exclude { .. } => "exclude",
            Rule::ExcludeDependencies { .. } => "excludeDependencies",
            Rule::RewriteGroupName { .. } => "rewriteGroupName",
            Rule::RewriteVersion { .. } => "rewriteVersion",
        }
    }

    /// Check that every required field is non-empty.
    pub fn validate(&self) -> Result<(), DepotError> {
        let required: Vec<(&str, &str)> = match self {
            Rule::Exclude { name, .. } => vec![("name", name.as_str())],
            Rule::ExcludeDependencies { group, name } => {
                vec![("group", group.as_str()), ("name", name.as_str())]
            }
            Rule::RewriteGroupName {
                group, new_group, ..
            } => vec![("group", group.as_str()), ("newGroup", new_group.as_str())],
            Rule::RewriteVersion {
                group,
                name,
                new_version,
            } => vec![
                ("group", group.as_str()),
                ("name", name.as_str()),
                ("newVersion", new_version.as_str()),
            ],
        };
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DepotError::Rule {
                    message: format!("`{}` rule requires a non-empty `{field}`", self.kind()),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Exclude { name, group } => {
                write!(f, "exclude {}:{name}", group.as_deref().unwrap_or("*"))
            }
            Rule::ExcludeDependencies { group, name } => {
                write!(f, "excludeDependencies {group}:{name}")
            }
            Rule::RewriteGroupName {
                group,
                new_group,
                name,
                new_name,
            } => write!(
                f,
                "rewriteGroupName {group}:{} -> {new_group}:{}",
                name.as_deref().unwrap_or("*"),
                new_name.as_deref().unwrap_or("*")
            ),
            Rule::RewriteVersion {
                group,
                name,
                new_version,
            } => write!(f, "rewriteVersion {group}:{name} -> {new_version}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Rules {
        rule: Vec<Rule>,
    }

    #[test]
    fn parse_all_rule_kinds_from_toml() {
        let toml = r#"
[[rule]]
rule = "exclude"
name = "*annotations*"

[[rule]]
rule = "excludeDependencies"
group = "org.apache.commons"
name = "commons-beanutils"

[[rule]]
rule = "rewriteGroupName"
group = "javax.mail"
newGroup = "com.sun.mail"

[[rule]]
rule = "rewriteVersion"
group = "com.beust"
name = "*c?mmand*"
newVersion = "1.35+"
"#;
        let rules: Rules = toml::from_str(toml).unwrap();
        assert_eq!(rules.rule.len(), 4);
        assert_eq!(
            rules.rule[0],
            Rule::Exclude {
                name: "*annotations*".to_string(),
                group: None
            }
        );
        assert_eq!(rules.rule[1].kind(), "excludeDependencies");
        assert_eq!(
            rules.rule[2],
            Rule::RewriteGroupName {
                group: "javax.mail".to_string(),
                new_group: "com.sun.mail".to_string(),
                name: None,
                new_name: None,
            }
        );
        assert_eq!(
            rules.rule[3],
            Rule::RewriteVersion {
                group: "com.beust".to_string(),
                name: "*c?mmand*".to_string(),
                new_version: "1.35+".to_string(),
            }
        );
        for rule in &rules.rule {
            rule.validate().unwrap();
        }
    }

    #[test]
    fn missing_required_field_fails_to_parse() {
        let toml = r#"
[[rule]]
rule = "excludeDependencies"
group = "org.apache.commons"
"#;
        assert!(toml::from_str::<Rules>(toml).is_err());
    }

    #[test]
    fn unknown_rule_tag_fails_to_parse() {
        let toml = r#"
[[rule]]
rule = "explode"
name = "x"
"#;
        assert!(toml::from_str::<Rules>(toml).is_err());
    }

    #[test]
    fn empty_required_field_fails_validation() {
        let rule = Rule::Exclude {
            name: " ".to_string(),
            group: None,
        };
        let err = rule.validate().unwrap_err();
        assert!(err.to_string().contains("`exclude` rule requires a non-empty `name`"));
    }

    #[test]
    fn display_is_readable() {
        let rule = Rule::RewriteVersion {
            group: "com.beust".to_string(),
            name: "*c?mmand*".to_string(),
            new_version: "1.35+".to_string(),
        };
        assert_eq!(rule.to_string(), "rewriteVersion com.beust:*c?mmand* -> 1.35+");
    }
}
