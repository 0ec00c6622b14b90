//! Wind lookups with a short-lived per-location cache.

use std::time::{Duration, Instant};

use anyhow::Result;
use dashmap::DashMap;
use windloop_core::{GeoPoint, WindConditions};
use windloop_upstream::{OpenMeteoClient, WindTime};

use crate::cache::{prune_cache, CacheEntry};
use crate::config::Config;

/// Cache cells are 0.01° (about 1 km) wide.
const CELL_SCALE: f64 = 100.0;

pub enum WindSource {
    OpenMeteo(OpenMeteoClient),
    /// Same wind everywhere, for offline runs and demos.
    Fixed(WindConditions),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WindKey {
    lat_cell: i64,
    lon_cell: i64,
    when: Option<WindTime>,
}

impl WindKey {
    fn new(point: GeoPoint, when: Option<WindTime>) -> Self {
        Self {
            lat_cell: (point.lat * CELL_SCALE).round() as i64,
            lon_cell: (point.lon * CELL_SCALE).round() as i64,
            when,
        }
    }
}

struct WindCacheEntry {
    fetched_at: Instant,
    wind: WindConditions,
}

impl CacheEntry for WindCacheEntry {
    fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

pub struct WindService {
    source: WindSource,
    cache: DashMap<WindKey, WindCacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl WindService {
    pub fn new(source: WindSource, ttl: Duration, max_entries: usize) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let source = match config.fixed_wind {
            Some(wind) => {
                tracing::info!(
                    direction_deg = wind.direction_deg,
                    speed_kmh = wind.speed_kmh,
                    "Using fixed wind"
                );
                WindSource::Fixed(wind)
            }
            None => WindSource::OpenMeteo(OpenMeteoClient::new(
                config.open_meteo_base_url.clone(),
                config.http_timeout(),
            )?),
        };
        Ok(Self::new(
            source,
            config.wind_cache_ttl(),
            config.wind_cache_max_entries,
        ))
    }

    /// Wind at `point` for `when`.
    ///
    /// Fresh cache hits skip the forecast service. When the service fails, an
    /// entry up to twice the TTL old is served instead.
    pub async fn lookup(&self, point: GeoPoint, when: Option<WindTime>) -> Result<WindConditions> {
        let client = match &self.source {
            WindSource::Fixed(wind) => return Ok(*wind),
            WindSource::OpenMeteo(client) => client,
        };

        let key = WindKey::new(point, when);
        let mut stale = None;
        if let Some(entry) = self.cache.get(&key) {
            let age = entry.fetched_at.elapsed();
            if age <= self.ttl {
                return Ok(entry.wind);
            }
            if age <= self.ttl.saturating_mul(2) {
                stale = Some(entry.wind);
            }
        }

        match client.wind_at(point, when).await {
            Ok(wind) => {
                self.cache.insert(
                    key,
                    WindCacheEntry {
                        fetched_at: Instant::now(),
                        wind,
                    },
                );
                prune_cache(&self.cache, self.max_entries, self.ttl.saturating_mul(2));
                Ok(wind)
            }
            Err(err) => match stale {
                Some(wind) => {
                    tracing::warn!("Wind fetch failed, using stale cache: {:#}", err);
                    Ok(wind)
                }
                None => Err(err),
            },
        }
    }
}
