use crate::app_config::{AppConfig, Environment, HostHeader};
use crate::ConfigError;

/// Bounds for the per-request timeout, in seconds.
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 15..=25;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str| -> Result<bool, ConfigError> {
        match or_default(var, "false").trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => Err(invalid(var, format!("expected true/false, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("PRODEX_ENV", "development"));
    let log_level = or_default("PRODEX_LOG_LEVEL", "info");

    let relay_urls = or_default("PRODEX_RELAY_URLS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    for relay in &relay_urls {
        if !(relay.starts_with("https://") || relay.starts_with("http://")) {
            return Err(invalid(
                "PRODEX_RELAY_URLS",
                format!("relay \"{relay}\" must be an http(s) URL"),
            ));
        }
    }

    let request_timeout_secs = parse_u64("PRODEX_REQUEST_TIMEOUT_SECS", "20")?;
    if !TIMEOUT_RANGE_SECS.contains(&request_timeout_secs) {
        return Err(invalid(
            "PRODEX_REQUEST_TIMEOUT_SECS",
            format!(
                "must be between {} and {} seconds",
                TIMEOUT_RANGE_SECS.start(),
                TIMEOUT_RANGE_SECS.end()
            ),
        ));
    }

    let user_agent = or_default("PRODEX_USER_AGENT", "prodex/0.1 (catalog-extractor)");
    let item_delay_ms = parse_u64("PRODEX_ITEM_DELAY_MS", "250")?;
    let output_dir = PathBuf::from(or_default("PRODEX_OUTPUT_DIR", "."));

    let relay_bind_addr = or_default("PRODEX_RELAY_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PRODEX_RELAY_BIND_ADDR", e.to_string()))?;
    let relay_cache_ttl_secs = parse_u64("PRODEX_RELAY_CACHE_TTL_SECS", "300")?;
    let relay_allow_insecure = parse_bool("PRODEX_RELAY_ALLOW_INSECURE")?;
    if relay_allow_insecure && env == Environment::Production {
        return Err(invalid(
            "PRODEX_RELAY_ALLOW_INSECURE",
            "cannot be enabled in production".to_string(),
        ));
    }
    let relay_host_headers = parse_host_headers(&or_default("PRODEX_RELAY_HOST_HEADERS", ""))
        .map_err(|reason| invalid("PRODEX_RELAY_HOST_HEADERS", reason))?;

    Ok(AppConfig {
        env,
        log_level,
        relay_urls,
        request_timeout_secs,
        user_agent,
        item_delay_ms,
        output_dir,
        relay_bind_addr,
        relay_cache_ttl_secs,
        relay_allow_insecure,
        relay_host_headers,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Parses `host|Header-Name|value` entries separated by `;`.
fn parse_host_headers(raw: &str) -> Result<Vec<HostHeader>, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, '|').map(str::trim);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(host), Some(name), Some(value))
                    if !host.is_empty() && !name.is_empty() && !value.is_empty() =>
                {
                    Ok(HostHeader {
                        host: host.to_ascii_lowercase(),
                        name: name.to_owned(),
                        value: value.to_owned(),
                    })
                }
                _ => Err(format!(
                    "entry for host \"{}\" must look like host|Header|value",
                    entry.split('|').next().unwrap_or_default()
                )),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
