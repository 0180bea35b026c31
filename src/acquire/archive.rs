// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Archive download and extraction.

use async_trait::async_trait;
use reqwest::Client;
use std::{
    fs::File,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::debug;
use zip::ZipArchive;

/// User agent sent with archive downloads.
const USER_AGENT: &str = concat!("clonetools/", env!("CARGO_PKG_VERSION"));

/// Perform the HTTP GET of a repository archive.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Download archive at URL into memory.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::Status`] if server does not respond with 2xx.
    /// - Return [`FetchError::Request`] if request cannot be completed.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Archive fetcher backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Construct new HTTP fetcher.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::Client`] if TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self::with_client(client))
    }

    /// Construct new HTTP fetcher around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("downloaded {} bytes from {url}", bytes.len());

        Ok(bytes.to_vec())
    }
}

/// Archive download error types.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Request failed before a status arrived, or body could not be read.
    #[error("failed to download archive: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with non-2xx status.
    #[error("failed to download archive ({code} {reason})")]
    Status { code: u16, reason: String },
}

/// Construct unique path for a downloaded archive inside a temporary
/// directory.
pub(crate) fn temp_archive_path(temp_dir: &Path) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();

    temp_dir.join(format!("clone-tools-{millis}-{}.zip", std::process::id()))
}

/// Extract zip archive into destination directory.
///
/// Entries that would escape the destination are rejected by the zip reader.
///
/// # Errors
///
/// - Return [`ExtractError::Open`] if archive file cannot be opened.
/// - Return [`ExtractError::Zip`] if archive is malformed or cannot be
///   written out.
pub(crate) fn extract_archive(zip_path: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(zip_path).map_err(|err| ExtractError::Open {
        source: err,
        path: zip_path.to_path_buf(),
    })?;
    let mut archive = ZipArchive::new(file)?;
    debug!("extract {} entries into {:?}", archive.len(), dest.display());
    archive.extract(dest)?;

    Ok(())
}

/// Archive extraction error types.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Archive file cannot be opened.
    #[error("failed to open archive at {:?}: {source}", path.display())]
    Open {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Archive cannot be read or unpacked.
    #[error("failed to extract archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use zip::{ZipWriter, write::SimpleFileOptions};

    async fn serve_once(response: &'static [u8]) -> anyhow::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await?;
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await?;
            socket.write_all(response).await?;
            socket.shutdown().await?;
            Ok::<_, std::io::Error>(())
        });

        Ok(format!("http://{addr}/acme/widgets/archive/refs/heads/main.zip"))
    }

    fn local_fetcher() -> anyhow::Result<HttpFetcher> {
        Ok(HttpFetcher::with_client(Client::builder().no_proxy().build()?))
    }

    #[tokio::test]
    async fn http_fetcher_maps_not_found_status() -> anyhow::Result<()> {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await?;

        let result = local_fetcher()?.fetch(&url).await;
        let error = match result {
            Err(error) => error,
            Ok(_) => anyhow::bail!("expected 404 to fail"),
        };
        assert!(matches!(error, FetchError::Status { code: 404, .. }));
        assert!(error.to_string().contains("404"));

        Ok(())
    }

    #[tokio::test]
    async fn http_fetcher_returns_body_on_success() -> anyhow::Result<()> {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nPK\x03\x04",
        )
        .await?;

        let result = local_fetcher()?.fetch(&url).await?;
        assert_eq!(result, b"PK\x03\x04".to_vec());

        Ok(())
    }

    #[test]
    fn temp_archive_path_lives_in_temp_dir() {
        let temp_dir = std::env::temp_dir();
        let path = temp_archive_path(&temp_dir);
        assert_eq!(path.parent(), Some(temp_dir.as_path()));
        assert!(
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("clone-tools-") && name.ends_with(".zip"))
        );
    }

    #[test]
    fn extract_archive_unpacks_entries() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("widgets.zip");
        let mut writer = ZipWriter::new(File::create(&zip_path)?);
        writer.add_directory("widgets-main/", SimpleFileOptions::default())?;
        writer.start_file("widgets-main/README.md", SimpleFileOptions::default())?;
        writer.write_all(b"# widgets\n")?;
        writer.finish()?;

        let dest = dir.path().join("out");
        std::fs::create_dir(&dest)?;
        extract_archive(&zip_path, &dest)?;

        let readme = std::fs::read_to_string(dest.join("widgets-main").join("README.md"))?;
        assert_eq!(readme, "# widgets\n");

        Ok(())
    }

    #[test]
    fn extract_archive_rejects_garbage() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("garbage.zip");
        std::fs::write(&zip_path, b"<html>not found</html>")?;

        let result = extract_archive(&zip_path, dir.path());
        assert!(matches!(result, Err(ExtractError::Zip(_))));

        Ok(())
    }

    #[test]
    fn status_error_mentions_code() {
        let error = FetchError::Status {
            code: 404,
            reason: "Not Found".into(),
        };
        assert_eq!(error.to_string(), "failed to download archive (404 Not Found)");
    }
}
