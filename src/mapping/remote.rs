//! Loading the mapping table published as a release asset.

use super::MappingTable;
use crate::error::{RemoteError, Result};
use std::path::Path;
use std::time::Duration;

/// Where a loaded table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    /// Downloaded from the release asset
    Release,
    /// The asset does not exist yet; read from the local file instead
    Local,
}

impl MappingTable {
    /// Download the table from `url`, binding it to `local_path` for writes.
    ///
    /// A 404 means the publishing release was never created, in which case the
    /// local file (or an empty table) is used.
    pub async fn from_release(
        client: &reqwest::Client,
        url: &str,
        local_path: &Path,
        timeout: Duration,
    ) -> Result<(Self, TableOrigin)> {
        let operation = "download mapping table";
        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(operation, e, timeout))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            log::info!("No published mapping table at {}, using {}", url, local_path.display());
            return Ok((Self::load(local_path)?, TableOrigin::Local));
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::from_reqwest(operation, e, timeout))?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let table = Self::from_json(&body)?.with_path(local_path);
        Ok((table, TableOrigin::Release))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::github::GitHubClient;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Serve one canned response and return the URL to fetch it from.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/releases/download/llpkgstore.json", addr)
    }

    fn http() -> reqwest::Client {
        // installs the TLS provider the builder expects
        GitHubClient::new("token", "goplus", "llpkg", TIMEOUT).unwrap();
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_published_table_is_bound_to_local_path() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("llpkgstore.json");
        let url = serve_once("200 OK", r#"{"cjson": {"1.7.18": ["v0.1.1"]}}"#).await;

        let (mut table, origin) = MappingTable::from_release(&http(), &url, &local, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(origin, TableOrigin::Release);
        assert_eq!(table.go_versions("cjson"), vec!["v0.1.1"]);
        assert_eq!(table.path(), Some(local.as_path()));

        table.append("cjson", "1.8.18", "v0.2.0").unwrap();
        assert!(MappingTable::load(&local).unwrap().contains("cjson", "1.7.18", "v0.1.1"));
    }

    #[tokio::test]
    async fn test_missing_asset_falls_back_to_local_file() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("llpkgstore.json");
        std::fs::write(&local, r#"{"zlib": {"1.3.1": ["v1.0.0"]}}"#).unwrap();
        let url = serve_once("404 Not Found", r#"{"message": "Not Found"}"#).await;

        let (table, origin) = MappingTable::from_release(&http(), &url, &local, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(origin, TableOrigin::Local);
        assert_eq!(table.go_versions("zlib"), vec!["v1.0.0"]);
    }

    #[tokio::test]
    async fn test_server_error_is_reported_with_status() {
        let dir = TempDir::new().unwrap();
        let url = serve_once("500 Internal Server Error", "boom").await;

        let err = MappingTable::from_release(&http(), &url, &dir.path().join("t.json"), TIMEOUT)
            .await
            .unwrap_err();
        match err {
            ReleaseError::Remote(RemoteError::Status { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
