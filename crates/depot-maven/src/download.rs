//! Document transport for Maven repositories: `http(s)://` and `file:` URIs.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;

use crate::client::RepositoryError;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build a shared reqwest client for repository metadata.
pub fn build_client() -> Result<Client, RepositoryError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RepositoryError::unavailable("http", format!("Failed to create HTTP client: {e}")))
}

/// Map a `file:` URI (or a bare path) to a local path.
///
/// Returns `None` for `http://` and `https://` URIs.
pub fn local_path(uri: &str) -> Option<PathBuf> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return None;
    }
    let path = uri
        .strip_prefix("file://")
        .or_else(|| uri.strip_prefix("file:"))
        .unwrap_or(uri);
    Some(PathBuf::from(path))
}

/// Fetch raw bytes from a URL.
///
/// Returns `Ok(None)` when the document does not exist (HTTP 404 or a missing
/// file). HTTP server errors and timeouts are retried a bounded number of
/// times before surfacing as [`RepositoryError::Unavailable`].
pub async fn fetch_bytes(
    client: &Client,
    repository: &str,
    url: &str,
) -> Result<Option<Vec<u8>>, RepositoryError> {
    match local_path(url) {
        Some(path) => fetch_file(repository, path).await,
        None => fetch_http(client, repository, url).await,
    }
}

/// Fetch a text document (POM, metadata, checksum sidecar).
pub async fn fetch_text(
    client: &Client,
    repository: &str,
    url: &str,
) -> Result<Option<String>, RepositoryError> {
    Ok(fetch_bytes(client, repository, url)
        .await?
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string()))
}

async fn fetch_file(repository: &str, path: PathBuf) -> Result<Option<Vec<u8>>, RepositoryError> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RepositoryError::unavailable(
            repository,
            format!("Failed to read {}: {e}", path.display()),
        )),
    }
}

async fn fetch_http(
    client: &Client,
    repository: &str,
    url: &str,
) -> Result<Option<Vec<u8>>, RepositoryError> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        match client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(RepositoryError::unavailable(
                        repository,
                        format!("HTTP {status} fetching {url}"),
                    ));
                }

                let bytes = resp.bytes().await.map_err(|e| {
                    RepositoryError::unavailable(
                        repository,
                        format!("Failed to read response from {url}: {e}"),
                    )
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                tracing::debug!("attempt {} for {url} failed: {e}", attempt + 1);
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(RepositoryError::unavailable(
                    repository,
                    format!("Request to {url} failed: {e}"),
                ));
            }
        }
    }

    Err(RepositoryError::unavailable(
        repository,
        format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    ))
}
