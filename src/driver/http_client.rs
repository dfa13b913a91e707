//! Shared HTTP client construction and page requests for drivers.
//!
//! Drivers see only [`PageClient::get`] and [`PageClient::post_form`]; timeout,
//! user-agent, cookie and proxy settings are applied here.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, Proxy, StatusCode};
use tracing::{debug, warn};

use crate::user_agent;

use super::DriverError;

/// Default connect timeout for page requests.
pub const PAGE_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default total timeout for page requests.
pub const PAGE_READ_TIMEOUT_SECS: u64 = 30;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Connect/read timeouts applied to an HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout in seconds.
    pub connect_secs: u64,
    /// Page requests: whole-request timeout. Transfers: longest gap between
    /// two reads.
    pub read_secs: u64,
}

impl HttpTimeouts {
    /// Creates timeouts from explicit values.
    #[must_use]
    pub fn new(connect_secs: u64, read_secs: u64) -> Self {
        Self {
            connect_secs,
            read_secs,
        }
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self::new(PAGE_CONNECT_TIMEOUT_SECS, PAGE_READ_TIMEOUT_SECS)
    }
}

/// A buffered page response.
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response body decoded as text.
    pub body: String,
}

impl PageResponse {
    /// Canonical reason phrase for the status.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    /// Returns the body when the status is exactly 200.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unreachable`] for any other status.
    pub fn into_ok_body(self, url: &str) -> Result<String, DriverError> {
        if self.status == StatusCode::OK {
            Ok(self.body)
        } else {
            Err(DriverError::unreachable(url, self.status))
        }
    }
}

/// Page-level HTTP client owned by one driver.
#[derive(Debug, Clone)]
pub struct PageClient {
    driver: String,
    client: Client,
}

impl PageClient {
    /// Builds a client for `driver` using shared project policy.
    ///
    /// Cookies persist for the client's lifetime, so a token POST carries the
    /// session of the page GET that issued the token.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Client`] when client construction fails.
    pub fn new(driver: &str, timeouts: HttpTimeouts) -> Result<Self, DriverError> {
        Ok(Self {
            driver: driver.to_string(),
            client: build_page_http_client(driver, timeouts)?,
        })
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Transport`] when no response could be read.
    pub async fn get(&self, url: &str) -> Result<PageResponse, DriverError> {
        debug!(driver = %self.driver, url, "GET page");
        let request = self.client.get(url).header(ACCEPT, HTML_ACCEPT);
        self.send(url, request).await
    }

    /// Sends a form-encoded POST request.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Transport`] when no response could be read.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<PageResponse, DriverError> {
        debug!(driver = %self.driver, url, fields = fields.len(), "POST page form");
        let request = self
            .client
            .post(url)
            .header(ACCEPT, HTML_ACCEPT)
            .form(fields);
        self.send(url, request).await
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<PageResponse, DriverError> {
        let response = request.send().await.map_err(|source| self.transport(url, source))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| self.transport(url, source))?;
        debug!(driver = %self.driver, url, status = status.as_u16(), bytes = body.len(), "Page received");
        Ok(PageResponse { status, body })
    }

    fn transport(&self, url: &str, source: reqwest::Error) -> DriverError {
        DriverError::Transport {
            driver: self.driver.clone(),
            url: url.to_string(),
            source,
        }
    }
}

/// Builds a driver HTTP client using shared project policy.
///
/// `driver` is used only for error messages and logging, not in the User-Agent header.
///
/// # Errors
///
/// Returns [`DriverError::Client`] when client construction fails.
pub fn build_page_http_client(driver: &str, timeouts: HttpTimeouts) -> Result<Client, DriverError> {
    let client_error = |reason: String| DriverError::Client {
        driver: driver.to_string(),
        reason,
    };

    match try_build_client(timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; env proxies are still honored by the fallback.
            warn!(
                driver,
                "Driver client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(client_error(
                    "HTTP client construction panicked while initializing driver networking"
                        .to_string(),
                )),
                Err(BuildClientFailure::Build(error)) => Err(client_error(error.to_string())),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(client_error(error.to_string())),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent::default_page_user_agent())
        .cookie_store(true)
        .gzip(true)
}

pub(crate) fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect_secs, PAGE_CONNECT_TIMEOUT_SECS);
        assert_eq!(timeouts.read_secs, PAGE_READ_TIMEOUT_SECS);
    }

    #[test]
    fn test_into_ok_body_accepts_only_200() {
        let ok = PageResponse {
            status: StatusCode::OK,
            body: "<html></html>".to_string(),
        };
        assert_eq!(ok.into_ok_body("https://1fichier.com/?a").unwrap(), "<html></html>");

        let created = PageResponse {
            status: StatusCode::CREATED,
            body: String::new(),
        };
        let err = created.into_ok_body("https://1fichier.com/?a").unwrap_err();
        assert!(matches!(err, DriverError::Unreachable { status: 201, .. }));
    }

    #[test]
    fn test_status_text_uses_reason_phrase() {
        let response = PageResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        };
        assert_eq!(response.status_text(), "Service Unavailable");
    }

    #[test]
    fn test_page_client_builds_with_custom_timeouts() {
        assert!(PageClient::new("UnFichier", HttpTimeouts::new(1, 2)).is_ok());
    }
}
