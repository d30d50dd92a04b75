use crate::error::ApiError;
use async_trait::async_trait;
use configuration::{DEFAULT_BASE_URL, DataSourceConfig};
use std::path::Path;

pub mod error;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

/// The generic, abstract interface for wherever database files are fetched from.
/// The database handle only talks to this trait, so the blob-storage client can
/// be swapped for a local stand-in.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// The URL `name` is fetched from.
    fn url_for(&self, name: &str) -> String;

    /// Downloads `name` to `dest`, replacing any existing file. Returns the
    /// number of bytes written.
    async fn download_to(&self, name: &str, dest: &Path) -> Result<u64, ApiError>;
}

/// A concrete `DatasetSource` reading from an HTTP(S) blob container.
#[derive(Debug, Clone)]
pub struct BlobStorageClient {
    client: reqwest::Client,
    base_url: String,
}

impl BlobStorageClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::with_client(reqwest::Client::builder().build()?, base_url))
    }

    /// The public assessment container.
    pub fn default_container() -> Result<Self, ApiError> {
        Self::new(DEFAULT_BASE_URL)
    }

    pub fn from_config(config: &DataSourceConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url)
    }

    /// Uses a preconfigured `reqwest::Client` (proxies, TLS roots, ...).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DatasetSource for BlobStorageClient {
    fn url_for(&self, name: &str) -> String {
        // The name goes into the path as-is; no escaping.
        format!("{}/{}", self.base_url, name)
    }

    async fn download_to(&self, name: &str, dest: &Path) -> Result<u64, ApiError> {
        let url = self.url_for(name);
        tracing::debug!(%url, dest = %dest.display(), "Downloading database file.");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| ApiError::Io {
                path: dest.display().to_string(),
                source,
            })?;

        tracing::debug!(%url, bytes = bytes.len(), "Download complete.");
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::BlobServer;

    #[test]
    fn name_is_substituted_verbatim() {
        let client = BlobStorageClient::new("https://example.net/container/").unwrap();
        assert_eq!(client.base_url(), "https://example.net/container");
        assert_eq!(
            client.url_for("calls data.db"),
            "https://example.net/container/calls data.db"
        );
    }

    #[test]
    fn default_container_points_at_assessment_data() {
        let client = BlobStorageClient::default_container().unwrap();
        assert_eq!(
            client.url_for("calls.db"),
            "https://techassessment.blob.core.windows.net/aiap18-assessment-data/calls.db"
        );
    }

    #[tokio::test]
    async fn download_overwrites_existing_file() {
        let server = BlobServer::start("aiap18-assessment-data").unwrap();
        server.insert("noise.db", b"fresh bytes".to_vec());

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("noise.db");
        std::fs::write(&dest, b"stale contents that are longer").unwrap();

        let client = server.client();
        let written = client.download_to("noise.db", &dest).await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"fresh bytes");
        assert_eq!(server.requests(), 1);
    }

    #[tokio::test]
    async fn missing_blob_is_a_status_error() {
        let server = BlobServer::start("aiap18-assessment-data").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let client = server.client();
        let err = client
            .download_to("absent.db", &dir.path().join("absent.db"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = BlobServer::unreachable_client();

        let err = client
            .download_to("calls.db", &dir.path().join("calls.db"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Request(_)));
    }
}
