//! Operation: resolve a request file into a dependency tree.

use std::fmt::Write as _;
use std::path::Path;

use depot_core::config::ResolveRequest;
use depot_resolver::{ResolutionResult, Resolver};
use depot_util::progress;
use serde_json::json;

/// Options for `depot resolve`.
#[derive(Debug, Default)]
pub struct ResolveOptions {
    /// Skip the tree and print only the summary lists.
    pub no_tree: bool,
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Print a JSON summary instead of text.
    pub json: bool,
}

/// A finished resolution plus the cache statistics behind it.
#[derive(Debug)]
pub struct ResolveOutcome {
    pub result: ResolutionResult,
    pub cache_hits: u64,
    pub catalog_hits: u64,
}

/// Resolve `request` against its repositories.
///
/// Ctrl-C cancels the resolution; the partial result is still returned.
pub async fn run_request(request: &ResolveRequest) -> miette::Result<ResolveOutcome> {
    let entries = request.effective_repositories();
    let repositories = crate::build_repositories(entries, request.resolver.verify_checksums)?;
    let resolver = Resolver::new(request.resolver.clone(), repositories);

    let handle = resolver.cancellation_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling resolution");
            handle.cancel();
        }
    });

    let result = resolver.resolve(&request.modules, &request.rules).await;
    interrupt.abort();

    Ok(ResolveOutcome {
        result: result?,
        cache_hits: resolver.cache_hits(),
        catalog_hits: resolver.catalog_hits(),
    })
}

/// Load the request at `path`, resolve it, and print the report.
pub async fn resolve(path: &Path, opts: &ResolveOptions) -> miette::Result<()> {
    let request = ResolveRequest::from_path(path)?;
    progress::status(
        "Resolving",
        &format!(
            "{} modules from {} repositories",
            request.modules.len(),
            request.effective_repositories().len()
        ),
    );

    let sp = progress::spinner("Fetching descriptors...");
    let outcome = run_request(&request).await;
    sp.finish_and_clear();
    let outcome = outcome?;

    if opts.json {
        println!("{:#}", render_json(&outcome));
    } else {
        print!("{}", render_text(&outcome, opts));
    }

    let result = &outcome.result;
    if result.cancelled {
        progress::status_warn("Cancelled", "resolution did not finish");
    } else if result.unresolved.is_empty() {
        progress::status(
            "Resolved",
            &format!("{} modules in {} passes", result.resolved.len(), result.passes),
        );
    } else {
        progress::status_warn(
            "Unresolved",
            &format!(
                "{} of {} modules",
                result.unresolved.len(),
                result.resolved.len() + result.unresolved.len()
            ),
        );
    }
    Ok(())
}

/// The human-readable report: trees, resolved and unresolved lists,
/// conflicts, and descriptor and catalog cache hits.
pub fn render_text(outcome: &ResolveOutcome, opts: &ResolveOptions) -> String {
    let result = &outcome.result;
    let mut out = String::new();

    if !opts.no_tree {
        for root in &result.roots {
            out.push_str(&root.dump(opts.depth));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "Resolved ({}):", result.resolved.len());
    for id in result.resolved_identifiers() {
        let _ = writeln!(out, "  {id}");
    }

    if !result.unresolved.is_empty() {
        let _ = writeln!(out, "Unresolved ({}):", result.unresolved.len());
        for module in &result.unresolved {
            match &module.reason {
                Some(reason) => {
                    let _ = writeln!(out, "  {}: {reason}", module.specification);
                }
                None => {
                    let _ = writeln!(out, "  {}", module.specification);
                }
            }
        }
    }

    if !result.conflicts.is_empty() {
        let _ = write!(out, "{}", result.conflicts);
    }
    let _ = writeln!(out, "Cache hits: {}", outcome.cache_hits);
    let _ = writeln!(out, "Catalog hits: {}", outcome.catalog_hits);
    out
}

pub fn render_json(outcome: &ResolveOutcome) -> serde_json::Value {
    let result = &outcome.result;
    json!({
        "resolved": result
            .resolved_identifiers()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>(),
        "unresolved": result
            .unresolved
            .iter()
            .map(|m| json!({
                "module": m.specification.to_string(),
                "reason": m.reason.as_ref().map(|r| r.to_string()),
            }))
            .collect::<Vec<_>>(),
        "conflicts": result
            .conflicts
            .conflicts
            .iter()
            .map(|c| json!({
                "module": format!("{}:{}", c.group, c.name),
                "requested": c.requested,
                "resolved": c.resolved,
                "reason": c.reason,
            }))
            .collect::<Vec<_>>(),
        "cancelled": result.cancelled,
        "passes": result.passes,
        "cache_hits": outcome.cache_hits,
        "catalog_hits": outcome.catalog_hits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, locator: &str, content: &str) {
        let path = dir.join(locator);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn pom(group: &str, artifact: &str, version: &str, deps: &[(&str, &str, &str)]) -> String {
        let deps: String = deps
            .iter()
            .map(|(g, a, v)| {
                format!(
                    "<dependency><groupId>{g}</groupId><artifactId>{a}</artifactId><version>{v}</version></dependency>"
                )
            })
            .collect();
        format!(
            "<project><groupId>{group}</groupId><artifactId>{artifact}</artifactId>\
             <version>{version}</version><dependencies>{deps}</dependencies></project>"
        )
    }

    fn repository() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "com/github/sommeri/less4j/1.17.2/less4j-1.17.2.pom",
            &pom(
                "com.github.sommeri",
                "less4j",
                "1.17.2",
                &[
                    ("org.jsoup", "jsoup", "1.8.1"),
                    ("org.jetbrains", "annotations", "13.0"),
                    ("org.example", "gone", "1.0"),
                ],
            ),
        );
        write(
            dir.path(),
            "org/jsoup/jsoup/1.8.1/jsoup-1.8.1.pom",
            &pom("org.jsoup", "jsoup", "1.8.1", &[]),
        );
        dir
    }

    fn request(repo: &Path) -> ResolveRequest {
        ResolveRequest::parse_toml(&format!(
            r#"
[[module]]
group = "com.github.sommeri"
name = "less4j"
version = "1.17.2"

[[repository]]
uri = "file:{}"

[[rule]]
rule = "exclude"
name = "*annotations*"
"#,
            repo.display()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_against_file_repository() {
        let repo = repository();
        let outcome = run_request(&request(repo.path())).await.unwrap();
        let result = &outcome.result;

        let ids: Vec<String> = result
            .resolved_identifiers()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["com.github.sommeri:less4j:1.17.2", "org.jsoup:jsoup:1.8.1"]);
        assert_eq!(result.unresolved.len(), 1);
        assert!(!result.cancelled);
    }

    #[tokio::test]
    async fn text_report_lists_tree_and_failures() {
        let repo = repository();
        let outcome = run_request(&request(repo.path())).await.unwrap();

        let text = render_text(&outcome, &ResolveOptions::default());
        assert!(text.starts_with("com.github.sommeri:less4j:1.17.2\n"));
        assert!(text.contains("├── org.jsoup:jsoup:1.8.1\n"));
        assert!(text.contains("org.jetbrains:annotations:13.0 (excluded)"));
        assert!(text.contains("Resolved (2):"));
        assert!(text.contains("Unresolved (1):\n  org.example:gone:1.0: "));
        assert!(text.ends_with("Cache hits: 0\nCatalog hits: 0\n"));

        let summary = render_text(
            &outcome,
            &ResolveOptions {
                no_tree: true,
                ..ResolveOptions::default()
            },
        );
        assert!(summary.starts_with("Resolved (2):"));
    }

    #[tokio::test]
    async fn json_report() {
        let repo = repository();
        let outcome = run_request(&request(repo.path())).await.unwrap();

        let value = render_json(&outcome);
        assert_eq!(value["resolved"][1], "org.jsoup:jsoup:1.8.1");
        assert_eq!(value["unresolved"][0]["module"], "org.example:gone:1.0");
        assert_eq!(value["cancelled"], false);
        assert_eq!(value["passes"], 1);
        assert_eq!(value["cache_hits"], 0);
        assert_eq!(value["catalog_hits"], 0);
    }
}
