//! Shared application state.

use anyhow::Result;
use windloop_upstream::OrsClient;

use crate::config::Config;
use crate::wind::WindService;

pub struct AppState {
    config: Config,
    router: OrsClient,
    wind: WindService,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let router = OrsClient::new(
            config.ors_base_url.clone(),
            config.ors_api_key.clone(),
            config.http_timeout(),
        )?;
        if !router.is_configured() {
            tracing::warn!("ORS_API_KEY not set, routes will not be snapped to roads");
        }
        let wind = WindService::from_config(&config)?;
        Ok(Self {
            config,
            router,
            wind,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &OrsClient {
        &self.router
    }

    pub fn wind(&self) -> &WindService {
        &self.wind
    }
}
