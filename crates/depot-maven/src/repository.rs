//! Maven repositories: URL layout and the [`RepositoryClient`] implementation
//! backed by POMs and `maven-metadata.xml`.

use depot_core::config::RepositoryEntry;
use depot_core::descriptor::{Descriptor, Signature, VersionCatalog};
use depot_core::module::ModuleIdentifier;
use reqwest::Client;

use crate::checksum::{self, DIGEST_KINDS};
use crate::client::{RepositoryClient, RepositoryError};
use crate::download;
use crate::metadata::parse_metadata;
use crate::pom::{parse_pom, Pom};

/// Parent chains longer than this are cut off.
const MAX_PARENT_DEPTH: usize = 8;

/// A Maven repository reachable over `http(s)://` or a `file:` URI.
#[derive(Debug, Clone)]
pub struct MavenRepository {
    name: String,
    url: String,
    client: Client,
    verify_checksums: bool,
}

impl MavenRepository {
    /// Build a repository from a request entry.
    pub fn new(entry: &RepositoryEntry, verify_checksums: bool) -> Result<Self, RepositoryError> {
        Ok(Self::with_client(entry, download::build_client()?, verify_checksums))
    }

    /// Build a repository sharing an existing HTTP client.
    pub fn with_client(entry: &RepositoryEntry, client: Client, verify_checksums: bool) -> Self {
        Self {
            name: entry.display_name().trim_end_matches('/').to_string(),
            url: entry.uri.trim_end_matches('/').to_string(),
            client,
            verify_checksums,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Standard Maven layout path for a given coordinate.
    ///
    /// `org.jsoup:jsoup:1.8.1` becomes `org/jsoup/jsoup/1.8.1`.
    pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    /// Repository-relative locator of a module's POM.
    pub fn pom_locator(id: &ModuleIdentifier) -> String {
        format!(
            "{}/{}-{}.pom",
            Self::coordinate_path(&id.group, &id.name, &id.version),
            id.name,
            id.version
        )
    }

    /// Full URL of a repository-relative locator.
    pub fn file_url(&self, locator: &str) -> String {
        format!("{}/{}", self.url, locator.trim_start_matches('/'))
    }

    /// URL to the POM file for a given coordinate.
    pub fn pom_url(&self, id: &ModuleIdentifier) -> String {
        self.file_url(&Self::pom_locator(id))
    }

    /// URL to the artifact-level `maven-metadata.xml` (version listing).
    pub fn metadata_url(&self, group: &str, artifact: &str) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.url,
            group.replace('.', "/"),
            artifact
        )
    }

    async fn fetch_pom(&self, id: &ModuleIdentifier) -> Result<Pom, RepositoryError> {
        let locator = Self::pom_locator(id);
        let url = self.file_url(&locator);
        tracing::debug!("fetching {url}");

        let bytes = download::fetch_bytes(&self.client, &self.name, &url)
            .await?
            .ok_or_else(|| RepositoryError::not_found(id.to_string(), &self.name))?;

        if self.verify_checksums {
            self.verify(&locator, &bytes).await?;
        }

        let xml = String::from_utf8_lossy(&bytes);
        parse_pom(&xml).map_err(|e| RepositoryError::malformed(&self.name, format!("{id}: {e}")))
    }

    /// Check fetched bytes against the strongest published digest.
    async fn verify(&self, locator: &str, bytes: &[u8]) -> Result<(), RepositoryError> {
        for kind in DIGEST_KINDS {
            let Some(signature) = self.fetch_signature(locator, kind).await? else {
                continue;
            };
            return match checksum::verify(&signature, bytes) {
                Some(false) => Err(RepositoryError::malformed(
                    &self.name,
                    format!("{kind} checksum mismatch for {locator}"),
                )),
                _ => Ok(()),
            };
        }
        tracing::debug!("no checksum published for {locator}");
        Ok(())
    }

    /// Merge the parent chain into `pom`.
    async fn apply_parents(&self, pom: &mut Pom) -> Result<(), RepositoryError> {
        let mut next = pom.parent.clone();
        let mut depth = 0;
        while let Some(parent_ref) = next.take() {
            if depth == MAX_PARENT_DEPTH {
                tracing::warn!(
                    "parent chain of {} exceeds {MAX_PARENT_DEPTH} levels, ignoring the rest",
                    pom.artifact_id.as_deref().unwrap_or("?")
                );
                break;
            }
            depth += 1;

            let parent_id = parent_ref.identifier();
            let parent = self.fetch_pom(&parent_id).await.map_err(|e| match e {
                RepositoryError::NotFound { .. } => RepositoryError::malformed(
                    &self.name,
                    format!("parent POM {parent_id} not found"),
                ),
                other => other,
            })?;
            next = parent.parent.clone();
            pom.apply_parent(&parent);
        }
        Ok(())
    }

    /// Fetch a POM with its parents, interpolated properties, and imported BOMs.
    async fn effective_pom(&self, id: &ModuleIdentifier) -> Result<Pom, RepositoryError> {
        let mut pom = self.fetch_pom(id).await?;
        self.apply_parents(&mut pom).await?;
        pom.resolve_properties();

        let imports: Vec<ModuleIdentifier> = pom
            .bom_imports()
            .into_iter()
            .filter_map(|d| {
                d.version
                    .as_deref()
                    .map(|v| ModuleIdentifier::new(&d.group_id, &d.artifact_id, v))
            })
            .collect();
        for bom_id in imports {
            let mut bom = match self.fetch_pom(&bom_id).await {
                Ok(bom) => bom,
                Err(e) => {
                    tracing::warn!("skipping BOM {bom_id} imported by {id}: {e}");
                    continue;
                }
            };
            self.apply_parents(&mut bom).await?;
            bom.resolve_properties();
            pom.import_bom(&bom);
        }

        Ok(pom)
    }
}

#[async_trait::async_trait]
impl RepositoryClient for MavenRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self) -> &str {
        &self.url
    }

    async fn fetch_descriptor(&self, id: &ModuleIdentifier) -> Result<Descriptor, RepositoryError> {
        let pom = self.effective_pom(id).await?;
        Ok(Descriptor::new(id.clone(), pom.dependency_specifications()))
    }

    async fn fetch_version_catalog(
        &self,
        group: &str,
        name: &str,
    ) -> Result<VersionCatalog, RepositoryError> {
        let url = self.metadata_url(group, name);
        tracing::debug!("fetching {url}");
        let xml = download::fetch_text(&self.client, &self.name, &url)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("{group}:{name}"), &self.name))?;
        let metadata =
            parse_metadata(&xml).map_err(|e| RepositoryError::malformed(&self.name, e))?;
        Ok(metadata.into_catalog(group, name))
    }

    async fn fetch_signature(
        &self,
        locator: &str,
        kind: &str,
    ) -> Result<Option<Signature>, RepositoryError> {
        let url = format!("{}.{kind}", self.file_url(locator));
        Ok(download::fetch_text(&self.client, &self.name, &url)
            .await?
            .map(|content| Signature::new(kind, content.trim())))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn central() -> MavenRepository {
        MavenRepository::new(
            &RepositoryEntry::new("https://repo.maven.apache.org/maven2/"),
            false,
        )
        .unwrap()
    }

    fn local(dir: &Path, verify: bool) -> MavenRepository {
        let entry = RepositoryEntry {
            uri: format!("file:{}/", dir.display()),
            name: Some("local".to_string()),
        };
        MavenRepository::new(&entry, verify).unwrap()
    }

    fn write(dir: &Path, locator: &str, content: &str) {
        let path = dir.join(locator);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn coordinate_path_replaces_dots() {
        let path = MavenRepository::coordinate_path("com.github.sommeri", "less4j", "1.17.2");
        assert_eq!(path, "com/github/sommeri/less4j/1.17.2");
    }

    #[test]
    fn pom_url_format() {
        let url = central().pom_url(&ModuleIdentifier::new("org.jsoup", "jsoup", "1.8.1"));
        assert_eq!(
            url,
            "https://repo.maven.apache.org/maven2/org/jsoup/jsoup/1.8.1/jsoup-1.8.1.pom"
        );
    }

    #[test]
    fn metadata_url_format() {
        let url = central().metadata_url("com.github.sommeri", "less4j");
        assert_eq!(
            url,
            "https://repo.maven.apache.org/maven2/com/github/sommeri/less4j/maven-metadata.xml"
        );
    }

    #[test]
    fn name_defaults_to_uri() {
        let repo = central();
        assert_eq!(repo.name(), "https://repo.maven.apache.org/maven2");
        assert_eq!(repo.uri(), "https://repo.maven.apache.org/maven2");
    }

    #[tokio::test]
    async fn descriptor_with_parent_from_file_repository() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "org/example/parent/1/parent-1.pom",
            r#"<project><groupId>org.example</groupId><artifactId>parent</artifactId><version>1</version>
<properties><jsoup.version>1.8.1</jsoup.version></properties></project>"#,
        );
        write(
            dir.path(),
            "org/example/app/2.0/app-2.0.pom",
            r#"<project>
<parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>1</version></parent>
<artifactId>app</artifactId><version>2.0</version>
<dependencies>
  <dependency><groupId>org.jsoup</groupId><artifactId>jsoup</artifactId><version>${jsoup.version}</version></dependency>
  <dependency><groupId>junit</groupId><artifactId>junit</artifactId><version>4.12</version><scope>test</scope></dependency>
</dependencies></project>"#,
        );

        let repo = local(dir.path(), false);
        let id = ModuleIdentifier::new("org.example", "app", "2.0");
        let descriptor = repo.fetch_descriptor(&id).await.unwrap();
        assert_eq!(descriptor.module_identifier, id);
        let deps: Vec<String> = descriptor
            .dependency_specifications
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(deps, vec!["org.jsoup:jsoup:1.8.1"]);
    }

    #[tokio::test]
    async fn missing_descriptor_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = local(dir.path(), false)
            .fetch_descriptor(&ModuleIdentifier::new("a", "b", "1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn missing_parent_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a/b/1/b-1.pom",
            "<project><parent><groupId>a</groupId><artifactId>p</artifactId><version>1</version></parent><artifactId>b</artifactId></project>",
        );
        let err = local(dir.path(), false)
            .fetch_descriptor(&ModuleIdentifier::new("a", "b", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Malformed { .. }), "got {err}");
    }

    #[tokio::test]
    async fn version_catalog_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "com/github/sommeri/less4j/maven-metadata.xml",
            "<metadata><versioning><versions><version>1.15.2</version><version>1.17.2</version></versions></versioning></metadata>",
        );
        let repo = local(dir.path(), false);
        let catalog = repo
            .fetch_version_catalog("com.github.sommeri", "less4j")
            .await
            .unwrap();
        assert_eq!(catalog.versions, vec!["1.15.2", "1.17.2"]);
        assert!(repo
            .fetch_version_catalog("org.jsoup", "jsoup")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn checksum_verification() {
        let dir = tempfile::tempdir().unwrap();
        let pom = "<project><groupId>a</groupId><artifactId>b</artifactId><version>1</version></project>";
        write(dir.path(), "a/b/1/b-1.pom", pom);
        write(
            dir.path(),
            "a/b/1/b-1.pom.sha1",
            &checksum::digest("sha1", pom.as_bytes()).unwrap(),
        );
        write(dir.path(), "c/d/1/d-1.pom", pom.replace(">b<", ">d<").as_str());
        write(dir.path(), "c/d/1/d-1.pom.md5", "00000000000000000000000000000000");

        let repo = local(dir.path(), true);
        assert!(repo
            .fetch_descriptor(&ModuleIdentifier::new("a", "b", "1"))
            .await
            .is_ok());
        let err = repo
            .fetch_descriptor(&ModuleIdentifier::new("c", "d", "1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"), "got {err}");

        let signature = repo
            .fetch_signature("a/b/1/b-1.pom", "sha1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signature.kind, "sha1");
        assert!(repo
            .fetch_signature("a/b/1/b-1.pom", "asc")
            .await
            .unwrap()
            .is_none());
    }
}
