pub mod ops_descriptor;
pub mod ops_resolve;
pub mod ops_versions;

use std::sync::Arc;

use depot_core::config::{RepositoryEntry, ResolverConfig};
use depot_maven::client::RepositoryClient;
use depot_maven::download;
use depot_maven::repository::MavenRepository;
use depot_util::errors::DepotError;

/// Build one Maven repository client per entry, sharing a single HTTP client.
pub fn build_repositories(
    entries: &[RepositoryEntry],
    verify_checksums: bool,
) -> miette::Result<Vec<Arc<dyn RepositoryClient>>> {
    let client = download::build_client().map_err(DepotError::from)?;
    Ok(entries
        .iter()
        .map(|entry| {
            tracing::debug!("using repository {}", entry.uri);
            Arc::new(MavenRepository::with_client(entry, client.clone(), verify_checksums))
                as Arc<dyn RepositoryClient>
        })
        .collect())
}

/// Repository entries from `--repo` flags, falling back to the configured defaults.
pub fn repository_entries(uris: &[String], config: &ResolverConfig) -> Vec<RepositoryEntry> {
    if uris.is_empty() {
        config.default_repositories.clone()
    } else {
        uris.iter().map(RepositoryEntry::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_flags_override_defaults() {
        let config = ResolverConfig::default();
        let defaults = repository_entries(&[], &config);
        assert_eq!(defaults, config.default_repositories);

        let explicit = repository_entries(&["file:/tmp/repo".to_string()], &config);
        assert_eq!(explicit, vec![RepositoryEntry::new("file:/tmp/repo")]);
    }

    #[test]
    fn one_client_per_entry() {
        let entries = vec![
            RepositoryEntry::new("https://repo.maven.apache.org/maven2"),
            RepositoryEntry {
                uri: "file:/tmp/repo".to_string(),
                name: Some("local".to_string()),
            },
        ];
        let repos = build_repositories(&entries, false).unwrap();
        let names: Vec<&str> = repos.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["https://repo.maven.apache.org/maven2", "local"]);
    }
}
