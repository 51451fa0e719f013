//! Production [`Fetcher`] backed by `reqwest`.
//!
//! Centralizes verification networking defaults: connect timeout, bounded
//! redirects, shared user-agent, compression and proxy compatibility.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Proxy, redirect};
use tracing::{debug, warn};

use crate::user_agent;

use super::{FetchError, FetchResponse, Fetcher};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 5;
const MAX_BODY_BYTES: usize = 64 * 1024;
const ACCEPT_DOCUMENTS: &str =
    "application/pdf,application/octet-stream;q=0.9,text/html;q=0.8,*/*;q=0.5";

/// Client settings for [`ReqwestFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFetcherConfig {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Redirect hops followed before the check counts as transient.
    pub max_redirects: usize,
    /// Body bytes read for content sniffing; the rest is discarded.
    pub max_body_bytes: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            max_redirects: MAX_REDIRECTS,
            max_body_bytes: MAX_BODY_BYTES,
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// One-GET-per-call fetcher with a bounded body read.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl ReqwestFetcher {
    /// Creates a fetcher with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if client construction fails.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Creates a fetcher with custom settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if client construction fails.
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(&config)?,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let mut response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_DOCUMENTS)
            .timeout(timeout)
            .send()
            .await
            .map_err(|error| map_request_error(url, &error))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        let mut body = Vec::new();
        while body.len() < self.max_body_bytes {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = self.max_body_bytes - body.len();
                    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                }
                Ok(None) => break,
                Err(error) => return Err(map_request_error(url, &error)),
            }
        }

        debug!(
            status,
            final_url = %final_url,
            body_bytes = body.len(),
            "Fetched candidate"
        );

        Ok(FetchResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

fn map_request_error(url: &str, error: &reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_redirect() {
        FetchError::TooManyRedirects { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            reason: error.to_string(),
        }
    } else {
        FetchError::Request {
            url,
            reason: error.to_string(),
        }
    }
}

fn build_http_client(config: &HttpFetcherConfig) -> Result<Client, FetchError> {
    match try_build_client(config, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; retry with env-proxy lookup only.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(config, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(FetchError::ClientBuild {
                    reason: "client construction panicked while initializing networking"
                        .to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(FetchError::ClientBuild {
                    reason: error.to_string(),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(FetchError::ClientBuild {
            reason: error.to_string(),
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    config: &HttpFetcherConfig,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut builder = base_builder(config);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(config: &HttpFetcherConfig) -> ClientBuilder {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .redirect(redirect::Policy::limited(config.max_redirects))
        .user_agent(config.user_agent.clone())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
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
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
