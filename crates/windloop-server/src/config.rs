//! Server configuration from environment.

use std::env;
use std::time::Duration;

use windloop_core::{parse_wind, WindConditions};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Blank disables road snapping (demo mode).
    pub ors_api_key: String,
    pub ors_base_url: String,
    pub open_meteo_base_url: String,
    pub http_timeout_s: u64,
    pub wind_cache_ttl_s: u64,
    pub wind_cache_max_entries: usize,
    /// Replaces the forecast lookup when set.
    pub fixed_wind: Option<WindConditions>,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            ors_api_key: String::new(),
            ors_base_url: windloop_upstream::directions::DEFAULT_BASE_URL.to_string(),
            open_meteo_base_url: windloop_upstream::weather::DEFAULT_BASE_URL.to_string(),
            http_timeout_s: 10,
            wind_cache_ttl_s: 600,
            wind_cache_max_entries: 512,
            fixed_wind: None,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("WINDLOOP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            ors_api_key: env::var("ORS_API_KEY").unwrap_or_default(),
            ors_base_url: env::var("ORS_BASE_URL").unwrap_or(defaults.ors_base_url),
            open_meteo_base_url: env::var("OPEN_METEO_BASE_URL")
                .unwrap_or(defaults.open_meteo_base_url),
            http_timeout_s: env::var("WINDLOOP_HTTP_TIMEOUT_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(defaults.http_timeout_s),
            wind_cache_ttl_s: env::var("WINDLOOP_WIND_CACHE_TTL_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.wind_cache_ttl_s),
            wind_cache_max_entries: defaults.wind_cache_max_entries,
            fixed_wind: env::var("WINDLOOP_FIXED_WIND")
                .ok()
                .and_then(|s| parse_wind(&s)),
            log_json: env::var("LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_s.max(1))
    }

    pub fn wind_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.wind_cache_ttl_s)
    }
}
