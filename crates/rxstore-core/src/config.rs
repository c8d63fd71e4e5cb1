use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let api_base_url = require("RXSTORE_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "RXSTORE_API_BASE_URL",
            "must start with http:// or https://".to_string(),
        ));
    }

    let env = parse_environment(&or_default("RXSTORE_ENV", "development"));
    let log_level = or_default("RXSTORE_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("RXSTORE_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("RXSTORE_USER_AGENT", "rxstore/0.1 (storefront-resolver)");
    let max_retries = parse_u32("RXSTORE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("RXSTORE_RETRY_BACKOFF_BASE_MS", "250")?;

    let default_page_size = parse_u32("RXSTORE_DEFAULT_PAGE_SIZE", "12")?;
    if default_page_size == 0 {
        return Err(invalid(
            "RXSTORE_DEFAULT_PAGE_SIZE",
            "must be greater than zero".to_string(),
        ));
    }
    let over_limit_product_count = parse_u64("RXSTORE_OVER_LIMIT_PRODUCT_COUNT", "1000")?;
    let detail_depth_threshold = parse_usize("RXSTORE_DETAIL_DEPTH_THRESHOLD", "3")?;

    let cache_ttl_secs = parse_u64("RXSTORE_CACHE_TTL_SECS", "300")?;
    let cache_capacity = parse_usize("RXSTORE_CACHE_CAPACITY", "256")?;

    let filters_include_variants = parse_bool("RXSTORE_FILTERS_INCLUDE_VARIANTS", "true")?;
    let filters_include_counts = parse_bool("RXSTORE_FILTERS_INCLUDE_COUNTS", "true")?;

    let state_path = PathBuf::from(or_default("RXSTORE_STATE_PATH", "./.rxstore/state.json"));

    Ok(AppConfig {
        api_base_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        default_page_size,
        over_limit_product_count,
        detail_depth_threshold,
        cache_ttl_secs,
        cache_capacity,
        filters_include_variants,
        filters_include_counts,
        state_path,
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
