//! POM parsing: dependency declarations, parent inheritance, property
//! interpolation, managed versions, and BOM imports.

use std::collections::BTreeMap;

use depot_core::module::{ModuleIdentifier, ModuleSpecification};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Scopes that never reach a consumer's resolution graph.
const NON_TRANSITIVE_SCOPES: &[&str] = &["test", "provided", "system", "import"];

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ParentRef {
    pub fn identifier(&self) -> ModuleIdentifier {
        ModuleIdentifier::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub type_: Option<String>,
}

impl PomDependency {
    fn same_artifact(&self, other: &PomDependency) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }

    /// Whether a consumer of the declaring module inherits this dependency.
    pub fn is_transitive(&self) -> bool {
        !self.optional
            && !self
                .scope
                .as_deref()
                .is_some_and(|s| NON_TRANSITIVE_SCOPES.contains(&s))
    }
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Resolve `${property}` references using POM properties and the
    /// built-in project variables. Unknown references are left as-is.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut cursor = 0;
        let mut substitutions = 0;
        while let Some(offset) = result[cursor..].find("${") {
            let start = cursor + offset;
            let Some(len) = result[start..].find('}') else {
                break;
            };
            let key = &result[start + 2..start + len];
            match self.resolve_property(key) {
                // Bounded so self-referencing properties terminate.
                Some(value) if substitutions < 32 => {
                    result.replace_range(start..start + len + 1, &value);
                    substitutions += 1;
                    cursor = start;
                }
                _ => cursor = start + len + 1,
            }
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" | "groupId" => {
                self.effective_group_id().map(str::to_string)
            }
            "project.artifactId" | "pom.artifactId" | "artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" | "version" => {
                self.effective_version().map(str::to_string)
            }
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate all property references in dependencies and dependency management.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        let resolve = |dep: &mut PomDependency| {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            dep.version = dep.version.as_deref().map(|v| snapshot.interpolate(v));
        };
        self.dependencies.iter_mut().for_each(&resolve);
        self.dependency_management.iter_mut().for_each(&resolve);
    }

    /// Merge a parent POM into this one.
    ///
    /// The child wins for properties, managed versions, and dependencies it
    /// declares itself; everything else is inherited.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(str::to_string);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(str::to_string);
        }
        merge_missing(&mut self.dependency_management, &parent.dependency_management);
        merge_missing(&mut self.dependencies, &parent.dependencies);
    }

    /// Merge the managed versions of an imported BOM.
    pub fn import_bom(&mut self, bom: &Pom) {
        let managed: Vec<PomDependency> = bom
            .dependency_management
            .iter()
            .filter(|d| !is_bom_import(d))
            .cloned()
            .collect();
        merge_missing(&mut self.dependency_management, &managed);
    }

    /// Look up a version from dependency management for a given group:artifact.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id && !is_bom_import(d))
            .and_then(|d| d.version.as_deref())
    }

    /// BOM imports from dependency management
    /// (entries with `scope = "import"` and `type = "pom"`).
    pub fn bom_imports(&self) -> Vec<&PomDependency> {
        self.dependency_management
            .iter()
            .filter(|d| is_bom_import(d))
            .collect()
    }

    /// The dependency specifications a consumer of this module resolves.
    ///
    /// Non-transitive scopes and optional dependencies are skipped; missing
    /// versions are filled from dependency management, and dependencies that
    /// still have none become unconstrained specifications.
    pub fn dependency_specifications(&self) -> Vec<ModuleSpecification> {
        self.dependencies
            .iter()
            .filter(|d| d.is_transitive())
            .filter(|d| !d.group_id.is_empty() && !d.artifact_id.is_empty())
            .map(|d| {
                let version = d
                    .version
                    .as_deref()
                    .or_else(|| self.managed_version(&d.group_id, &d.artifact_id))
                    .filter(|v| !v.contains("${"));
                ModuleSpecification::new(&d.group_id, &d.artifact_id, version)
            })
            .collect()
    }
}

fn is_bom_import(dep: &PomDependency) -> bool {
    dep.scope.as_deref() == Some("import") && dep.type_.as_deref().unwrap_or("jar") == "pom"
}

fn merge_missing(target: &mut Vec<PomDependency>, inherited: &[PomDependency]) {
    for dep in inherited {
        if !target.iter().any(|d| d.same_artifact(dep)) {
            target.push(dep.clone());
        }
    }
}

/// Parse a POM XML string into a [`Pom`].
pub fn parse_pom(xml: &str) -> Result<Pom, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<PomDependency> = None;
    let mut current_parent: Option<ParentRef> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();

                match path.join(">").as_str() {
                    DEPENDENCY | MANAGED_DEPENDENCY => current_dep = Some(PomDependency::default()),
                    "project>parent" => current_parent = Some(ParentRef::default()),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");
                let text = std::mem::take(&mut text_buf);
                let leaf = path.last().map(String::as_str).unwrap_or("");

                if path.len() == 3 && path[1] == "properties" {
                    pom.properties.insert(leaf.to_string(), text.clone());
                }

                if let Some(dep) = current_dep.as_mut() {
                    if ctx.ends_with(&format!(">dependency>{leaf}")) {
                        match leaf {
                            "groupId" => dep.group_id = text.clone(),
                            "artifactId" => dep.artifact_id = text.clone(),
                            "version" => dep.version = Some(text.clone()),
                            "scope" => dep.scope = Some(text.clone()),
                            "optional" => dep.optional = text.trim() == "true",
                            "type" => dep.type_ = Some(text.clone()),
                            _ => {}
                        }
                    }
                    if ctx == DEPENDENCY || ctx == MANAGED_DEPENDENCY {
                        if let Some(dep) = current_dep.take() {
                            if ctx == DEPENDENCY {
                                pom.dependencies.push(dep);
                            } else {
                                pom.dependency_management.push(dep);
                            }
                        }
                    }
                }

                if let Some(parent) = current_parent.as_mut() {
                    match ctx.as_str() {
                        "project>parent>groupId" => parent.group_id = text.clone(),
                        "project>parent>artifactId" => parent.artifact_id = text.clone(),
                        "project>parent>version" => parent.version = text.clone(),
                        "project>parent" => pom.parent = current_parent.take(),
                        _ => {}
                    }
                }

                if path.len() == 2 {
                    match leaf {
                        "groupId" => pom.group_id = Some(text),
                        "artifactId" => pom.artifact_id = Some(text),
                        "version" => pom.version = Some(text),
                        "packaging" => pom.packaging = Some(text),
                        _ => {}
                    }
                }

                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Failed to parse POM XML: {e}")),
            _ => {}
        }
    }

    if pom.artifact_id.is_none() {
        return Err("POM has no <artifactId>".to_string());
    }
    Ok(pom)
}

const DEPENDENCY: &str = "project>dependencies>dependency";
const MANAGED_DEPENDENCY: &str = "project>dependencyManagement>dependencies>dependency";
