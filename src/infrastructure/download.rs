//! Detect script download
//!
//! Fetches the bootstrap script over HTTP(S), honoring the configured
//! proxy. The public API is synchronous; the request itself runs on a
//! short-lived tokio runtime.

use super::config::ProxySettings;
use crate::pipeline::DetectError;
use std::path::Path;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads Detect scripts to the agent
#[derive(Debug, Clone)]
pub struct ScriptDownloader {
    proxy: Option<ProxySettings>,
    proxy_credentials: Option<(String, String)>,
    timeout: Duration,
}

impl ScriptDownloader {
    /// Creates a downloader without a proxy
    #[must_use]
    pub fn new() -> Self {
        Self {
            proxy: None,
            proxy_credentials: None,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Routes downloads through a proxy
    #[must_use]
    pub fn with_proxy(
        mut self,
        proxy: Option<ProxySettings>,
        credentials: Option<(String, String)>,
    ) -> Self {
        self.proxy = proxy;
        self.proxy_credentials = credentials;
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Downloads `url` to `dest`
    ///
    /// The body is written to a temporary sibling file first and renamed
    /// into place, so an interrupted download never leaves a partial script
    /// behind.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Download`] if the URL is invalid, the request
    /// fails or the server answers with a non-success status, and
    /// [`DetectError::Io`] if the file cannot be written.
    pub fn download(&self, url: &str, dest: &Path) -> Result<(), DetectError> {
        let parsed = Url::parse(url).map_err(|e| download_error(url, e))?;

        tracing::info!(url = %parsed, dest = %dest.display(), "Downloading Detect script");

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| DetectError::Io(format!("Failed to create runtime: {e}")))?;
        let body = rt.block_on(async { self.fetch(&parsed).await })?;

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "detect".to_string());
        let partial = dest.with_file_name(format!("{file_name}.{}.part", Uuid::new_v4()));

        std::fs::write(&partial, &body)?;
        if let Err(e) = std::fs::rename(&partial, dest) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::debug!(bytes = body.len(), dest = %dest.display(), "Download complete");
        Ok(())
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, DetectError> {
        // Only the configured proxy applies, never one from the process environment
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .no_proxy();

        if let Some(proxy) = &self.proxy {
            let bypass = url.host_str().is_some_and(|host| proxy.bypasses(host));
            if bypass {
                tracing::debug!(host = ?url.host_str(), "Host matches no-proxy pattern");
            } else {
                let mut reqwest_proxy =
                    reqwest::Proxy::all(proxy.url()).map_err(|e| download_error(url, e))?;
                if let Some((username, password)) = &self.proxy_credentials {
                    reqwest_proxy = reqwest_proxy.basic_auth(username, password);
                }
                builder = builder.proxy(reqwest_proxy);
            }
        }

        let client = builder.build().map_err(|e| download_error(url, e))?;
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| download_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetectError::Download {
                url: url.to_string(),
                reason: format!("server responded with {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| download_error(url, e))?;
        Ok(bytes.to_vec())
    }
}

impl Default for ScriptDownloader {
    fn default() -> Self {
        Self::new()
    }
}

fn download_error(url: impl ToString, err: impl std::fmt::Display) -> DetectError {
    DetectError::Download {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::TempDir;

    /// Serves a single request on loopback with `response`
    fn serve_once(response: &'static str) -> (String, std::thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/detect10.sh", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        (url, server)
    }

    #[test]
    fn test_invalid_url_is_download_error() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("detect.sh");

        let err = ScriptDownloader::new()
            .download("not a url", &dest)
            .unwrap_err();

        assert!(matches!(err, DetectError::Download { .. }));
        assert!(err.is_integration());
        assert!(!dest.exists());
    }

    #[test]
    fn test_unreachable_host_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("detect.sh");

        let result = ScriptDownloader::new()
            .with_timeout(Duration::from_secs(5))
            .download("http://127.0.0.1:9/detect.sh", &dest);

        assert!(result.is_err());
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_not_found_is_download_error() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("detect10.sh");
        let (url, server) =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");

        let err = ScriptDownloader::new()
            .with_timeout(Duration::from_secs(10))
            .download(&url, &dest)
            .unwrap_err();
        server.join().unwrap();

        let DetectError::Download { reason, .. } = &err else {
            panic!("expected download error, got {err:?}");
        };
        assert!(reason.contains("404"));
        assert!(!dest.exists());
    }

    #[test]
    fn test_successful_download_writes_script() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("detect10.sh");
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 15\r\nConnection: close\r\n\r\necho detect 10\n",
        );

        ScriptDownloader::new()
            .with_timeout(Duration::from_secs(10))
            .download(&url, &dest)
            .unwrap();
        server.join().unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "echo detect 10\n");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
