use prodex_core::Platform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("unauthorized (HTTP {status}) for {url}")]
    Unauthorized { status: u16, url: String },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed response for {context}: {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("all {attempts} relays failed for {url}; last error: {last}")]
    AllProxiesFailed {
        url: String,
        attempts: usize,
        last: Box<ScraperError>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no products found for {platform} store {store}")]
    EmptyResult { platform: Platform, store: String },

    #[error("invalid input \"{input}\": {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("normalization error for product {product_id}: {reason}")]
    Normalization { product_id: String, reason: String },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },
}

impl ScraperError {
    /// Short remediation advice shown next to the error message.
    #[must_use]
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            ScraperError::Timeout { .. } => {
                "The store took too long to answer. A firewall or corporate network may be \
                 blocking the connection; try again from another network."
            }
            ScraperError::Unauthorized { .. } => {
                "Access was denied. Check the store identifier and that the token or API key \
                 is valid and has read access to products."
            }
            ScraperError::NotFound { .. } => {
                "The catalog endpoint does not exist. Check the store URL and that the \
                 platform's API is enabled for this store."
            }
            ScraperError::HttpStatus { .. } => {
                "The store answered with an error. Check the store data and try again later."
            }
            ScraperError::MalformedResponse { .. } => {
                "The store answered with something that is not a product catalog. The URL may \
                 not belong to the selected platform, or a network filter replaced the response."
            }
            ScraperError::AllProxiesFailed { last, .. } => match last.as_ref() {
                ScraperError::Timeout { .. } => {
                    "Every relay timed out. The store may be down or blocking relay traffic."
                }
                ScraperError::MalformedResponse { .. } => {
                    "Every relay returned an unreadable response. The store is probably invalid \
                     or blocking automated access."
                }
                ScraperError::Network(_) => {
                    "No relay could be reached. Check the internet connection or whether a \
                     firewall blocks outgoing requests."
                }
                _ => "Every relay failed. Check the store data and try again later.",
            },
            ScraperError::Network(_) => {
                "The store could not be reached. Check the internet connection or whether a \
                 firewall blocks outgoing requests."
            }
            ScraperError::EmptyResult { .. } => {
                "No products were found. Check the data you entered."
            }
            ScraperError::InvalidInput { .. } => "Fix the highlighted value and try again.",
            ScraperError::Normalization { .. } => {
                "The store returned a product with invalid data; the extraction was stopped."
            }
            ScraperError::PaginationLimit { .. } => {
                "The catalog kept returning pages past the safety limit; the store may be \
                 repeating results."
            }
        }
    }

    /// The single user-facing message for a failed run.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("{self}. {}", self.remediation_hint())
    }

    /// `true` when a failure belongs to the relay hop rather than the upstream
    /// store, so another relay may succeed.
    pub(crate) fn is_relay_failure(&self) -> bool {
        match self {
            ScraperError::Timeout { .. }
            | ScraperError::Network(_)
            | ScraperError::MalformedResponse { .. } => true,
            ScraperError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed() -> ScraperError {
        ScraperError::MalformedResponse {
            context: "page 1".to_owned(),
            source: serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
        }
    }

    #[test]
    fn all_proxies_failed_hint_depends_on_last_error() {
        let timeout = ScraperError::AllProxiesFailed {
            url: "https://shop.example.com/products.json".to_owned(),
            attempts: 2,
            last: Box::new(ScraperError::Timeout {
                url: "https://shop.example.com/products.json".to_owned(),
                timeout_secs: 20,
            }),
        };
        let bad_body = ScraperError::AllProxiesFailed {
            url: "https://shop.example.com/products.json".to_owned(),
            attempts: 2,
            last: Box::new(malformed()),
        };
        assert!(timeout.remediation_hint().contains("timed out"));
        assert!(bad_body.remediation_hint().contains("unreadable"));
        assert_ne!(timeout.remediation_hint(), bad_body.remediation_hint());
    }

    #[test]
    fn user_message_combines_error_and_hint() {
        let err = ScraperError::Unauthorized {
            status: 401,
            url: "https://x.myshopify.com/admin/api/2024-04/products.json".to_owned(),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("unauthorized (HTTP 401)"));
        assert!(msg.contains("Access was denied"));
    }

    #[test]
    fn relay_failures_exclude_upstream_verdicts() {
        assert!(malformed().is_relay_failure());
        assert!(ScraperError::HttpStatus {
            status: 502,
            url: String::new()
        }
        .is_relay_failure());
        assert!(!ScraperError::Unauthorized {
            status: 403,
            url: String::new()
        }
        .is_relay_failure());
        assert!(!ScraperError::NotFound { url: String::new() }.is_relay_failure());
        assert!(!ScraperError::HttpStatus {
            status: 429,
            url: String::new()
        }
        .is_relay_failure());
    }
}
