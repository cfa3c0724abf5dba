//! An in-process repository built from descriptors and catalogs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use depot_core::descriptor::{Descriptor, Signature, VersionCatalog};
use depot_core::module::{ModuleIdentifier, ModuleSpecification};

use crate::client::{RepositoryClient, RepositoryError};

/// A repository whose contents live in memory.
///
/// Catalogs are derived from the registered descriptors unless set
/// explicitly. Every fetch is counted, which makes it useful for asserting
/// cache behavior.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    name: String,
    descriptors: HashMap<ModuleIdentifier, Descriptor>,
    catalogs: HashMap<(String, String), Vec<String>>,
    signatures: HashMap<(String, String), Signature>,
    unavailable: bool,
    latency: Option<Duration>,
    descriptor_fetches: AtomicUsize,
    catalog_fetches: AtomicUsize,
}

impl MemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a module and its dependencies, parsed from coordinate strings.
    ///
    /// # Panics
    ///
    /// On malformed coordinates; this is a fixture builder.
    pub fn with_module(self, id: &str, dependencies: &[&str]) -> Self {
        let id = ModuleIdentifier::parse(id).unwrap_or_else(|e| panic!("{e}"));
        let deps = dependencies
            .iter()
            .map(|d| ModuleSpecification::parse(d).unwrap_or_else(|e| panic!("{e}")))
            .collect();
        self.with_descriptor(Descriptor::new(id, deps))
    }

    /// Register a descriptor; its version joins the module's catalog.
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        let id = descriptor.module_identifier.clone();
        let versions = self
            .catalogs
            .entry((id.group.clone(), id.name.clone()))
            .or_default();
        if !versions.contains(&id.version) {
            versions.push(id.version.clone());
        }
        self.descriptors.insert(id, descriptor);
        self
    }

    /// Replace the catalog for `group:name`.
    pub fn with_catalog(mut self, group: &str, name: &str, versions: &[&str]) -> Self {
        self.catalogs.insert(
            (group.to_string(), name.to_string()),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_signature(mut self, locator: &str, signature: Signature) -> Self {
        self.signatures
            .insert((locator.to_string(), signature.kind.clone()), signature);
        self
    }

    /// Make every fetch fail with [`RepositoryError::Unavailable`].
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Delay every fetch, to exercise concurrency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn descriptor_fetches(&self) -> usize {
        self.descriptor_fetches.load(Ordering::SeqCst)
    }

    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> Result<(), RepositoryError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable {
            return Err(RepositoryError::unavailable(&self.name, "repository offline"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RepositoryClient for MemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_descriptor(&self, id: &ModuleIdentifier) -> Result<Descriptor, RepositoryError> {
        self.descriptor_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        self.descriptors
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(id.to_string(), &self.name))
    }

    async fn fetch_version_catalog(
        &self,
        group: &str,
        name: &str,
    ) -> Result<VersionCatalog, RepositoryError> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        self.catalogs
            .get(&(group.to_string(), name.to_string()))
            .map(|versions| VersionCatalog::new(group, name, versions.clone()))
            .ok_or_else(|| RepositoryError::not_found(format!("{group}:{name}"), &self.name))
    }

    async fn fetch_signature(
        &self,
        locator: &str,
        kind: &str,
    ) -> Result<Option<Signature>, RepositoryError> {
        self.simulate().await?;
        Ok(self
            .signatures
            .get(&(locator.to_string(), kind.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> MemoryRepository {
        MemoryRepository::new("memory")
            .with_module("org.jsoup:jsoup:1.8.1", &[])
            .with_module("org.jsoup:jsoup:1.8.3", &[])
            .with_module("com.github.sommeri:less4j:1.17.2", &["org.jsoup:jsoup:1.8.1"])
    }

    #[tokio::test]
    async fn descriptors_and_derived_catalogs() {
        let repo = repo();
        let id = ModuleIdentifier::new("com.github.sommeri", "less4j", "1.17.2");
        let descriptor = repo.fetch_descriptor(&id).await.unwrap();
        assert_eq!(descriptor.dependency_specifications.len(), 1);

        let catalog = repo.fetch_version_catalog("org.jsoup", "jsoup").await.unwrap();
        assert_eq!(catalog.versions, vec!["1.8.1", "1.8.3"]);
        assert_eq!(repo.descriptor_fetches(), 1);
        assert_eq!(repo.catalog_fetches(), 1);
    }

    #[tokio::test]
    async fn missing_coordinates_are_not_found() {
        let repo = repo();
        let err = repo
            .fetch_descriptor(&ModuleIdentifier::new("org.jsoup", "jsoup", "9.9"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(repo
            .fetch_version_catalog("nope", "nope")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn explicit_catalog_overrides_derived_one() {
        let repo = repo().with_catalog("org.jsoup", "jsoup", &["1.7.0"]);
        let catalog = repo.fetch_version_catalog("org.jsoup", "jsoup").await.unwrap();
        assert_eq!(catalog.versions, vec!["1.7.0"]);
    }

    #[tokio::test]
    async fn unavailable_repository_fails_every_fetch() {
        let repo = repo().unavailable();
        let err = repo
            .fetch_version_catalog("org.jsoup", "jsoup")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn signatures_are_optional() {
        let repo = repo().with_signature("a/b.pom", Signature::new("sha1", "abc"));
        assert!(repo.fetch_signature("a/b.pom", "sha1").await.unwrap().is_some());
        assert!(repo.fetch_signature("a/b.pom", "md5").await.unwrap().is_none());
    }
}
