//! 1fichier driver for `https://1fichier.com/?<id>` URLs.
//!
//! Resolution walks an explicit [`ResolutionState`]: fetch the file page,
//! reject it on host-reported errors, exchange the anonymous `adz` token once
//! when the page carries one, then extract the direct link. Name and size
//! always come from the first page; the token exchange only contributes the
//! link.

mod page;

pub use page::{Cooldown, UnFichierPage, parse_size};

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::auth::CredentialStore;

use super::http_client::{HttpTimeouts, PageClient};
use super::utils::{compile_static_regex, host_with_port, parse_host_or_fallback};
use super::{Download, Driver, DriverError, Metadata};

const DRIVER_NAME: &str = "UnFichier";
const DEFAULT_BASE_URL: &str = "https://1fichier.com";
const TOKEN_FIELD: &str = "adz";
const FALLBACK_FILE_NAME: &str = "download";

static FILE_ID_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^\w+"));

/// Driver for the 1fichier file host.
pub struct UnFichierDriver {
    client: PageClient,
    store: Arc<dyn CredentialStore>,
    base_url: String,
    base_host: String,
}

impl UnFichierDriver {
    /// Creates a driver bound to `1fichier.com`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Client`] when the HTTP client cannot be built.
    pub fn new(store: Arc<dyn CredentialStore>, timeouts: HttpTimeouts) -> Result<Self, DriverError> {
        Self::with_base_url(store, timeouts, DEFAULT_BASE_URL)
    }

    /// Creates a driver that recognizes URLs on a custom base (for tests).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Client`] when the HTTP client cannot be built.
    pub fn with_base_url(
        store: Arc<dyn CredentialStore>,
        timeouts: HttpTimeouts,
        base_url: impl Into<String>,
    ) -> Result<Self, DriverError> {
        let base_url = base_url.into();
        Ok(Self {
            client: PageClient::new(DRIVER_NAME, timeouts)?,
            store,
            base_host: parse_host_or_fallback(&base_url),
            base_url,
        })
    }

    fn validate_url(&self, url: &str) -> Result<(), DriverError> {
        if self.matches(url) {
            Ok(())
        } else {
            Err(DriverError::wrong_host(DRIVER_NAME, url))
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<UnFichierPage, DriverError> {
        let body = self.client.get(url).await?.into_ok_body(url)?;
        Ok(UnFichierPage::parse(&body))
    }

    async fn exchange_token(&self, url: &str, token: &str) -> Result<UnFichierPage, DriverError> {
        let body = self
            .client
            .post_form(url, &[(TOKEN_FIELD, token)])
            .await?
            .into_ok_body(url)?;
        Ok(UnFichierPage::parse(&body))
    }
}

impl std::fmt::Debug for UnFichierDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnFichierDriver")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Steps of one download resolution. Each URL gets a fresh machine, and the
/// only path into [`ResolutionState::TokenExchange`] is from the first parsed
/// page, so at most one POST is issued.
#[derive(Debug)]
enum ResolutionState {
    Fetching,
    Parsed {
        listing: UnFichierPage,
    },
    TokenExchange {
        listing: UnFichierPage,
        token: String,
    },
    Extracting {
        listing: UnFichierPage,
        exchanged: Option<UnFichierPage>,
    },
    Resolved(Download),
}

impl ResolutionState {
    fn label(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Parsed { .. } => "parsed",
            Self::TokenExchange { .. } => "token_exchange",
            Self::Extracting { .. } => "extracting",
            Self::Resolved(_) => "resolved",
        }
    }
}

/// Fails when the page reports a cooldown or any other file error.
fn reject_page_errors(page: &UnFichierPage) -> Result<(), DriverError> {
    if let Some(cooldown) = page.cooldown() {
        return Err(DriverError::cooldown(
            DRIVER_NAME,
            &cooldown.message,
            cooldown.wait,
        ));
    }
    match page.file_error() {
        Some(message) => Err(DriverError::download(DRIVER_NAME, message)),
        None => Ok(()),
    }
}

fn fallback_file_name(url: &str, link: &str) -> String {
    let from_link = Url::parse(link).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|segment| !segment.is_empty())
    });
    from_link
        .or_else(|| {
            Url::parse(url)
                .ok()
                .and_then(|parsed| parsed.query().map(str::to_string))
                .and_then(|query| FILE_ID_RE.find(&query).map(|m| m.as_str().to_string()))
        })
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[async_trait]
impl Driver for UnFichierDriver {
    fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = host_with_port(&parsed) else {
            return false;
        };
        host == self.base_host
            && parsed.path() == "/"
            && parsed.query().is_some_and(|query| FILE_ID_RE.is_match(query))
    }

    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn authenticate(&self, _login: &str, _password: &str) -> Result<(), DriverError> {
        Err(DriverError::auth(
            DRIVER_NAME,
            "authentication is not supported by this host",
        ))
    }

    fn unauthenticate(&self) -> Result<(), DriverError> {
        let removed = self
            .store
            .erase(DRIVER_NAME)
            .map_err(|e| DriverError::Credential {
                driver: DRIVER_NAME.to_string(),
                reason: e.to_string(),
            })?;
        debug!(driver = DRIVER_NAME, removed, "Credential erased");
        Ok(())
    }

    fn is_authenticated(&self) -> Result<bool, DriverError> {
        self.store
            .exists(DRIVER_NAME)
            .map_err(|e| DriverError::Credential {
                driver: DRIVER_NAME.to_string(),
                reason: e.to_string(),
            })
    }

    #[tracing::instrument(skip(self), fields(driver = DRIVER_NAME))]
    async fn resolve_metadata(&self, url: &str) -> Result<Metadata, DriverError> {
        self.validate_url(url)?;
        let page = self.fetch_page(url).await?;
        Ok(Metadata::new(
            DRIVER_NAME,
            page.file_name().map(str::to_string),
            page.file_size(),
            page.file_error().map(str::to_string),
        ))
    }

    #[tracing::instrument(skip(self), fields(driver = DRIVER_NAME))]
    async fn resolve_download(&self, url: &str) -> Result<Download, DriverError> {
        self.validate_url(url)?;

        let mut state = ResolutionState::Fetching;
        loop {
            debug!(state = state.label(), "Resolution step");
            state = match state {
                ResolutionState::Fetching => ResolutionState::Parsed {
                    listing: self.fetch_page(url).await?,
                },
                ResolutionState::Parsed { listing } => {
                    reject_page_errors(&listing)?;
                    match listing.anonymous_token().map(str::to_string) {
                        Some(token) => ResolutionState::TokenExchange { listing, token },
                        None => ResolutionState::Extracting {
                            listing,
                            exchanged: None,
                        },
                    }
                }
                ResolutionState::TokenExchange { listing, token } => {
                    let exchanged = self.exchange_token(url, &token).await?;
                    reject_page_errors(&exchanged)?;
                    ResolutionState::Extracting {
                        listing,
                        exchanged: Some(exchanged),
                    }
                }
                ResolutionState::Extracting { listing, exchanged } => {
                    let link = exchanged
                        .as_ref()
                        .unwrap_or(&listing)
                        .download_link()
                        .unwrap_or_default();
                    let file_name = listing
                        .file_name()
                        .map_or_else(|| fallback_file_name(url, link), str::to_string);
                    let download = Download::new(DRIVER_NAME, file_name, listing.file_size(), link)
                        .ok_or_else(|| DriverError::no_download_link(DRIVER_NAME))?;
                    ResolutionState::Resolved(download)
                }
                ResolutionState::Resolved(download) => {
                    info!(
                        file_name = download.file_name(),
                        file_size = download.file_size(),
                        "Download link resolved"
                    );
                    return Ok(download);
                }
            };
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{Credential, MemoryCredentialStore};
    use crate::driver::ErrorKind;

    fn driver() -> UnFichierDriver {
        UnFichierDriver::new(Arc::new(MemoryCredentialStore::new()), HttpTimeouts::default())
            .unwrap()
    }

    #[test]
    fn test_matches_file_urls() {
        let driver = driver();
        assert!(driver.matches("https://1fichier.com/?abc123"));
        assert!(driver.matches("http://1fichier.com/?abc123&af=42"));
        assert!(driver.matches("https://www.1fichier.com/?abc123"));
        assert!(driver.matches("https://1FICHIER.com/?abc123"));
    }

    #[test]
    fn test_rejects_other_urls() {
        let driver = driver();
        assert!(!driver.matches("https://example.com/?abc123"));
        assert!(!driver.matches("https://1fichier.com/"));
        assert!(!driver.matches("https://1fichier.com/?"));
        assert!(!driver.matches("https://1fichier.com/dir/?abc123"));
        assert!(!driver.matches("ftp://1fichier.com/?abc123"));
        assert!(!driver.matches("not a url"));
    }

    #[test]
    fn test_custom_base_url_keeps_port() {
        let driver = UnFichierDriver::with_base_url(
            Arc::new(MemoryCredentialStore::new()),
            HttpTimeouts::default(),
            "http://127.0.0.1:4567",
        )
        .unwrap();
        assert!(driver.matches("http://127.0.0.1:4567/?abc"));
        assert!(!driver.matches("http://127.0.0.1:4568/?abc"));
        assert!(!driver.matches("https://1fichier.com/?abc"));
    }

    #[tokio::test]
    async fn test_wrong_host_fails_before_io() {
        let err = driver()
            .resolve_download("https://example.com/file")
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::WrongHost { .. }));
        assert!(err.to_string().contains("UnFichier"));
    }

    #[tokio::test]
    async fn test_authenticate_is_unsupported() {
        let err = driver().authenticate("user", "pass").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn test_unauthenticate_erases_and_tolerates_missing() {
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .save(DRIVER_NAME, &Credential::new("user", "secret"))
            .unwrap();
        let driver = UnFichierDriver::new(store.clone(), HttpTimeouts::default()).unwrap();

        assert!(driver.is_authenticated().unwrap());
        driver.unauthenticate().unwrap();
        assert!(!driver.is_authenticated().unwrap());
        driver.unauthenticate().unwrap();
    }

    #[test]
    fn test_reject_page_errors_classifies_cooldown() {
        let page = UnFichierPage::parse(
            r#"<div class="ct_warn">You must wait 3 minutes between each free download</div>"#,
        );
        let err = reject_page_errors(&page).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DownloadCooldown);

        let page = UnFichierPage::parse(r#"<div class="ct_warn">File has been removed</div>"#);
        let err = reject_page_errors(&page).unwrap_err();
        assert_eq!(err.download_message(), Some("File has been removed"));
    }

    #[test]
    fn test_fallback_file_name() {
        assert_eq!(
            fallback_file_name("https://1fichier.com/?abc", "https://a-1.1fichier.com/c/movie.mkv"),
            "movie.mkv"
        );
        assert_eq!(
            fallback_file_name("https://1fichier.com/?abc&af=1", "https://a-1.1fichier.com/"),
            "abc"
        );
    }
}
