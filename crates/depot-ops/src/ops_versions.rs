//! Operation: list the published versions of a module.

use std::sync::Arc;

use depot_core::descriptor::VersionCatalog;
use depot_core::module::ModuleSpecification;
use depot_maven::client::RepositoryClient;
use depot_util::errors::DepotError;

/// Fetch the version catalog for `group:name` from the first repository that has it.
pub async fn fetch_catalog(
    repositories: &[Arc<dyn RepositoryClient>],
    group: &str,
    name: &str,
) -> miette::Result<VersionCatalog> {
    let mut last_err = None;
    for repo in repositories {
        match repo.fetch_version_catalog(group, name).await {
            Ok(catalog) => return Ok(catalog),
            Err(e) => {
                tracing::debug!("{e}");
                last_err = Some(e);
            }
        }
    }
    Err(last_err
        .map(DepotError::from)
        .unwrap_or_else(|| DepotError::Config {
            message: "no repositories configured".to_string(),
        })
        .into())
}

/// Print every known version of `coordinate` (`group:name`), oldest first.
pub async fn versions(
    coordinate: &str,
    repositories: &[Arc<dyn RepositoryClient>],
) -> miette::Result<()> {
    let spec = ModuleSpecification::parse(coordinate)?;
    let catalog = fetch_catalog(repositories, &spec.group, &spec.name).await?;

    let versions = catalog.sorted_versions();
    if versions.is_empty() {
        println!("No versions published for {}.", catalog.key());
        return Ok(());
    }
    for version in &versions {
        println!("{version}");
    }
    if let Some(latest) = catalog.latest() {
        depot_util::progress::status("Latest", &format!("{} {latest}", catalog.key()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use depot_maven::memory::MemoryRepository;

    use super::*;

    fn repos() -> Vec<Arc<dyn RepositoryClient>> {
        vec![
            Arc::new(MemoryRepository::new("empty")) as Arc<dyn RepositoryClient>,
            Arc::new(
                MemoryRepository::new("central")
                    .with_module("org.jsoup:jsoup:1.8.3", &[])
                    .with_module("org.jsoup:jsoup:1.10.1", &[])
                    .with_module("org.jsoup:jsoup:1.8.1", &[]),
            ),
        ]
    }

    #[tokio::test]
    async fn catalog_from_second_repository() {
        let catalog = fetch_catalog(&repos(), "org.jsoup", "jsoup").await.unwrap();
        assert_eq!(catalog.sorted_versions(), vec!["1.8.1", "1.8.3", "1.10.1"]);
    }

    #[tokio::test]
    async fn missing_catalog_is_an_error() {
        let err = fetch_catalog(&repos(), "org.example", "nothing")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn no_repositories() {
        let err = fetch_catalog(&[], "org.jsoup", "jsoup").await.unwrap_err();
        assert!(err.to_string().contains("no repositories configured"));
    }
}
