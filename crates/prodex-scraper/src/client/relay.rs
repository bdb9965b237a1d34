//! Wire format of the relay endpoint, shared with `prodex-relay`.

use std::collections::BTreeMap;

use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::RequestOptions;

/// Body of `POST <relay>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub url: String,
    #[serde(default)]
    pub options: RelayOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOptions {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Builds the request that asks `relay` to fetch `target`.
///
/// Header-free requests use `GET <relay>?url=<target>` so the relay's cache
/// can serve them; anything carrying credentials goes in a POST body.
pub(super) fn relay_request(
    client: &Client,
    relay: &Url,
    target: &str,
    options: &RequestOptions,
) -> RequestBuilder {
    if options.is_empty() {
        return client
            .get(relay.clone())
            .query(&[("url", target)])
            .header(reqwest::header::ACCEPT, "application/json");
    }

    let body = RelayRequest {
        url: target.to_owned(),
        options: RelayOptions {
            headers: options
                .headers()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        },
    };
    client
        .post(relay.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&body)
}
