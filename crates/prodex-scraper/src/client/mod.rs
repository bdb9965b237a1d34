//! Resilient JSON fetcher used by every platform adapter.
//!
//! Requests either go straight to the platform ([`Transport::Direct`]) or
//! through one or more relay endpoints ([`Transport::Relay`]) that forward the
//! request server-side. Each exchange is bounded by a timeout, classified into
//! [`ScraperError`] variants, and returns the next-page continuation if the
//! response carried one.

mod origin;
mod relay;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::ScraperError;
use crate::pagination::{extract_next_link, NEXT_PAGE_HEADER};

pub use origin::{parse_store_url, store_hostname, store_origin};
pub use relay::{RelayOptions, RelayRequest};

/// Default bounded wait for a single request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// How requests reach the platform.
#[derive(Debug, Clone)]
pub enum Transport {
    /// Send the request from this process.
    Direct,
    /// Forward through relay endpoints, tried in order.
    Relay(Vec<Url>),
}

/// Extra per-request headers (credentials, mostly).
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// A parsed response body plus the URL of the next page, if any.
#[derive(Debug)]
pub struct Fetched<T> {
    pub data: T,
    pub continuation: Option<String>,
}

/// Where the continuation signal lives in a response.
#[derive(Debug, Clone, Copy)]
enum ContinuationSource {
    /// Upstream `Link` header, `rel="next"`.
    LinkHeader,
    /// Relay's re-exposed [`NEXT_PAGE_HEADER`].
    RelayHeader,
}

/// HTTP client shared by all adapters of one run.
pub struct CatalogClient {
    client: Client,
    transport: Transport,
    timeout: Duration,
}

impl CatalogClient {
    /// Creates a client with the given timeout, `User-Agent`, and transport.
    ///
    /// A relay transport with no endpoints falls back to direct requests.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Network`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        transport: Transport,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let transport = match transport {
            Transport::Relay(relays) if relays.is_empty() => Transport::Direct,
            other => other,
        };
        Ok(Self {
            client,
            transport,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] if a configured relay URL does
    /// not parse, or [`ScraperError::Network`] if the HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &prodex_core::AppConfig) -> Result<Self, ScraperError> {
        let relays = config
            .relay_urls
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|e| ScraperError::InvalidInput {
                    input: raw.clone(),
                    reason: format!("relay URL does not parse: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(
            config.request_timeout_secs,
            &config.user_agent,
            Transport::Relay(relays),
        )
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Fetches `url` and parses the body as `T`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`] when the exchange exceeds the bounded wait.
    /// - [`ScraperError::Unauthorized`] on 401/403, [`ScraperError::NotFound`]
    ///   on 404, [`ScraperError::HttpStatus`] on any other non-2xx status.
    /// - [`ScraperError::MalformedResponse`] when the body does not parse as `T`.
    /// - [`ScraperError::Network`] on transport failure.
    /// - [`ScraperError::AllProxiesFailed`] when several relays are configured
    ///   and every one of them failed.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
        context: &str,
    ) -> Result<Fetched<T>, ScraperError> {
        match &self.transport {
            Transport::Direct => {
                let request = self.direct_request(url, options);
                self.exchange(request, url, ContinuationSource::LinkHeader, context)
                    .await
            }
            Transport::Relay(relays) => self.fetch_via_relays(relays, url, options, context).await,
        }
    }

    fn direct_request(&self, url: &str, options: &RequestOptions) -> RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in options.headers() {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    async fn fetch_via_relays<T: DeserializeOwned>(
        &self,
        relays: &[Url],
        url: &str,
        options: &RequestOptions,
        context: &str,
    ) -> Result<Fetched<T>, ScraperError> {
        let has_fallback = relays.len() > 1;
        let mut last_failure = None;

        for (attempt, relay) in relays.iter().enumerate() {
            let request = relay::relay_request(&self.client, relay, url, options);
            match self
                .exchange(request, url, ContinuationSource::RelayHeader, context)
                .await
                .map_err(|err| self.relay_timeout(err))
            {
                Ok(fetched) => return Ok(fetched),
                Err(err) if has_fallback && err.is_relay_failure() => {
                    tracing::warn!(
                        relay = %relay,
                        attempt = attempt + 1,
                        error = %err,
                        "relay failed, trying the next one"
                    );
                    last_failure = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        match last_failure {
            Some(last) => Err(ScraperError::AllProxiesFailed {
                url: url.to_owned(),
                attempts: relays.len(),
                last: Box::new(last),
            }),
            None => Err(ScraperError::InvalidInput {
                input: url.to_owned(),
                reason: "no relay endpoint configured".to_owned(),
            }),
        }
    }

    /// A relay answers 504 when the store itself timed out.
    fn relay_timeout(&self, err: ScraperError) -> ScraperError {
        match err {
            ScraperError::HttpStatus { status: 504, url } => ScraperError::Timeout {
                url,
                timeout_secs: self.timeout.as_secs(),
            },
            other => other,
        }
    }

    /// Sends one request and classifies the outcome.
    ///
    /// The send and the body read share one deadline; when it passes the
    /// in-flight future is dropped, which aborts the request.
    async fn exchange<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
        continuation_source: ContinuationSource,
        context: &str,
    ) -> Result<Fetched<T>, ScraperError> {
        let timeout_secs = self.timeout.as_secs();
        let to_scraper_error = |err: reqwest::Error| {
            if err.is_timeout() {
                ScraperError::Timeout {
                    url: url.to_owned(),
                    timeout_secs,
                }
            } else {
                ScraperError::Network(err)
            }
        };

        let work = async {
            let response = request.send().await.map_err(to_scraper_error)?;
            let status = response.status();

            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(ScraperError::Unauthorized {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            // Read the continuation before consuming the response body.
            let continuation = match continuation_source {
                ContinuationSource::LinkHeader => extract_next_link(
                    response
                        .headers()
                        .get(reqwest::header::LINK)
                        .and_then(|v| v.to_str().ok()),
                ),
                ContinuationSource::RelayHeader => response
                    .headers()
                    .get(NEXT_PAGE_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned),
            };

            let body = response.bytes().await.map_err(to_scraper_error)?;
            let data = serde_json::from_slice::<T>(&body).map_err(|e| {
                ScraperError::MalformedResponse {
                    context: context.to_owned(),
                    source: e,
                }
            })?;

            Ok(Fetched { data, continuation })
        };

        if let Ok(result) = tokio::time::timeout(self.timeout, work).await {
            result
        } else {
            tracing::warn!(url, timeout_secs, "request timed out");
            Err(ScraperError::Timeout {
                url: url.to_owned(),
                timeout_secs,
            })
        }
    }

    /// Builds a client with a sub-second timeout for tests.
    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
