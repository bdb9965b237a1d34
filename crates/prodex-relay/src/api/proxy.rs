use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{
        header::{CACHE_CONTROL, LINK},
        HeaderName, HeaderValue,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};
use prodex_scraper::client::RelayRequest;
use prodex_scraper::pagination::{extract_next_link, NEXT_PAGE_HEADER};
use serde::Deserialize;

use super::target::{outbound_headers, validate_target};
use super::{ApiError, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct ProxyQuery {
    url: Option<String>,
}

/// `GET /api/proxy?url=<target>`
pub(super) async fn proxy_get(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let Some(target) = query.url.filter(|u| !u.trim().is_empty()) else {
        return ApiError::new(req_id.0, "bad_request", "the url parameter is required")
            .into_response();
    };
    forward(&state, req_id.0, &target, &BTreeMap::new()).await
}

/// `POST /api/proxy` with `{"url": ..., "options": {"headers": {...}}}`
pub(super) async fn proxy_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return ApiError::new(req_id.0, "bad_request", rejection.body_text()).into_response();
        }
    };
    if request.url.trim().is_empty() {
        return ApiError::new(req_id.0, "bad_request", "the url field is required").into_response();
    }
    forward(&state, req_id.0, &request.url, &request.options.headers).await
}

async fn forward(
    state: &AppState,
    request_id: String,
    raw_target: &str,
    client_headers: &BTreeMap<String, String>,
) -> Response {
    let target = match validate_target(raw_target, state.allow_insecure) {
        Ok(url) => url,
        Err(reason) => {
            tracing::warn!(request_id = %request_id, reason, "rejected relay target");
            return ApiError::new(request_id, "bad_request", reason).into_response();
        }
    };
    let headers = match outbound_headers(client_headers, &target, &state.host_headers) {
        Ok(headers) => headers,
        Err(reason) => return ApiError::new(request_id, "bad_request", reason).into_response(),
    };

    let host = target.host_str().unwrap_or_default().to_owned();
    let started = Instant::now();
    let upstream = match state.upstream.get(target).headers(headers).send().await {
        Ok(response) => response,
        Err(err) => return upstream_failure(request_id, &host, &err),
    };

    let status = upstream.status();
    if !status.is_success() {
        tracing::info!(
            request_id = %request_id,
            host = %host,
            status = status.as_u16(),
            "upstream returned an error status"
        );
        return ApiError::new(
            request_id,
            "upstream_error",
            format!("upstream responded with HTTP {}", status.as_u16()),
        )
        .with_status(status)
        .into_response();
    }

    let next_page = extract_next_link(
        upstream
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok()),
    );
    let body = match upstream.bytes().await {
        Ok(body) => body,
        Err(err) => return upstream_failure(request_id, &host, &err),
    };
    let Ok(data) = serde_json::from_slice::<serde_json::Value>(&body) else {
        tracing::warn!(request_id = %request_id, host = %host, "upstream body is not JSON");
        return ApiError::new(request_id, "bad_gateway", "upstream returned a non-JSON body")
            .into_response();
    };

    tracing::debug!(
        request_id = %request_id,
        host = %host,
        bytes = body.len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        has_next = next_page.is_some(),
        "relayed upstream response"
    );

    let mut response = Json(data).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!(
        "s-maxage={}, stale-while-revalidate",
        state.cache_ttl_secs
    )) {
        headers.insert(CACHE_CONTROL, value);
    }
    if let Some(value) = next_page.and_then(|next| HeaderValue::from_str(&next).ok()) {
        headers.insert(HeaderName::from_static(NEXT_PAGE_HEADER), value);
    }
    response
}

fn upstream_failure(request_id: String, host: &str, err: &reqwest::Error) -> Response {
    if err.is_timeout() {
        tracing::warn!(request_id = %request_id, host, "upstream timed out");
        return ApiError::new(request_id, "upstream_timeout", "upstream did not answer in time")
            .into_response();
    }
    tracing::warn!(request_id = %request_id, host, error = %err, "upstream request failed");
    ApiError::new(request_id, "bad_gateway", "could not reach upstream").into_response()
}
