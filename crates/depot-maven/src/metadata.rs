//! `maven-metadata.xml` parsing for version discovery.

use depot_core::descriptor::VersionCatalog;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Artifact-level Maven metadata listing available versions.
#[derive(Debug, Clone, Default)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

impl MavenMetadata {
    /// Convert into a catalog for `group:name`.
    ///
    /// The requested coordinate wins over the document's own ids, which some
    /// repositories omit.
    pub fn into_catalog(self, group: &str, name: &str) -> VersionCatalog {
        VersionCatalog::new(group, name, self.versions)
    }
}

/// Parse an artifact-level `maven-metadata.xml`.
pub fn parse_metadata(xml: &str) -> Result<MavenMetadata, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let text = std::mem::take(&mut text_buf);
                match path.join(">").as_str() {
                    "metadata>groupId" => meta.group_id = Some(text),
                    "metadata>artifactId" => meta.artifact_id = Some(text),
                    "metadata>versioning>latest" => meta.latest = Some(text),
                    "metadata>versioning>release" => meta.release = Some(text),
                    "metadata>versioning>versions>version" if !text.is_empty() => {
                        meta.versions.push(text);
                    }
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Failed to parse maven-metadata.xml: {e}")),
            _ => {}
        }
    }

    Ok(meta)
}
