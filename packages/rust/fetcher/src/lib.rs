//! Notebook fetching over HTTP.
//!
//! [`NotebookSource`] is the seam the job runner fetches through;
//! [`HttpFetcher`] is the `reqwest` implementation used by the CLI.

use std::time::Duration;

use nbimport_shared::{FetchConfig, NbImportError, Notebook, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// User-Agent string for notebook requests.
const USER_AGENT: &str = concat!("nbimport/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can turn a URL into a parsed [`Notebook`].
pub trait NotebookSource {
    /// Retrieve and parse the notebook at `url`.
    ///
    /// Fails with [`NbImportError::Fetch`] on transport errors, non-success
    /// status, or content that is not a notebook.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Notebook>> + Send;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Fetches notebooks with a shared `reqwest` client. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_response_bytes: u64,
}

impl HttpFetcher {
    /// Build a fetcher from runtime fetch settings.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                NbImportError::config(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

impl NotebookSource for HttpFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<Notebook> {
        debug!("fetching notebook");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| NbImportError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NbImportError::fetch(url.as_str(), format!("HTTP {status}")));
        }

        // Check content-length if available
        if let Some(len) = response.content_length() {
            if len > self.max_response_bytes {
                return Err(NbImportError::fetch(
                    url.as_str(),
                    format!(
                        "response too large ({len} bytes, max {})",
                        self.max_response_bytes
                    ),
                ));
            }
        }

        let body = response.bytes().await.map_err(|e| {
            NbImportError::fetch(url.as_str(), format!("failed to read body: {e}"))
        })?;

        if body.len() as u64 > self.max_response_bytes {
            return Err(NbImportError::fetch(
                url.as_str(),
                format!(
                    "response too large ({} bytes, max {})",
                    body.len(),
                    self.max_response_bytes
                ),
            ));
        }

        let notebook = parse_notebook(&body)
            .map_err(|e| NbImportError::fetch(url.as_str(), e))?;

        debug!(
            cells = notebook.cells.len(),
            bytes = body.len(),
            "notebook fetched"
        );

        Ok(notebook)
    }
}

/// Parse a notebook JSON body, describing the failure on error.
fn parse_notebook(body: &[u8]) -> std::result::Result<Notebook, String> {
    serde_json::from_slice(body).map_err(|e| format!("body is not a valid notebook: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture() -> String {
        std::fs::read_to_string("../../../fixtures/notebooks/plot_radar.ipynb")
            .expect("read notebook fixture")
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchConfig::default()).expect("build fetcher")
    }

    #[test]
    fn parse_notebook_rejects_non_notebook_json() {
        assert!(parse_notebook(br#"{"cells": []}"#).is_ok());
        assert!(parse_notebook(br#"{"nbformat": 4}"#).is_err());
        assert!(parse_notebook(b"[1, 2, 3]").is_err());
        assert!(parse_notebook(b"<html></html>").is_err());
    }

    #[tokio::test]
    async fn fetches_and_parses_notebook() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_downloads/abc/plot_radar.ipynb"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture()))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/_downloads/abc/plot_radar.ipynb", server.uri())).unwrap();
        let notebook = fetcher().fetch(&url).await.unwrap();

        assert_eq!(notebook.cells.len(), 4);
        assert_eq!(notebook.rest["nbformat"], 4);
    }

    #[tokio::test]
    async fn http_error_is_fetch_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing.ipynb"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.ipynb", server.uri())).unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();

        assert!(matches!(err, NbImportError::Fetch { .. }));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn malformed_body_is_fetch_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broken.ipynb"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Not here</html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/broken.ipynb", server.uri())).unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();

        match err {
            NbImportError::Fetch { url: failed, message } => {
                assert!(failed.ends_with("/broken.ipynb"));
                assert!(message.contains("not a valid notebook"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/big.ipynb"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture()))
            .mount(&server)
            .await;

        let config = FetchConfig {
            max_response_bytes: 64,
            ..FetchConfig::default()
        };
        let url = Url::parse(&format!("{}/big.ipynb", server.uri())).unwrap();
        let err = HttpFetcher::new(&config).unwrap().fetch(&url).await.unwrap_err();

        assert!(err.to_string().contains("response too large"));
    }

    #[tokio::test]
    async fn connection_failure_is_fetch_error() {
        // Port 9 (discard) is closed on test hosts.
        let url = Url::parse("http://127.0.0.1:9/gone.ipynb").unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();

        assert!(matches!(err, NbImportError::Fetch { .. }));
    }
}
