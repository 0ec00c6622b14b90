//! Open-Meteo wind forecast client.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use windloop_core::{GeoPoint, WindConditions};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const WIND_FIELDS: &str = "wind_speed_10m,wind_direction_10m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastDay {
    Today,
    Tomorrow,
}

/// Hour of the forecast to ride in, local to the start point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindTime {
    pub day: ForecastDay,
    pub hour: u32,
}

impl WindTime {
    /// Parse `"today"|"tomorrow"` and an `"HH:MM"` time. Minutes are dropped.
    pub fn parse(date: &str, time: &str) -> Result<Self> {
        let day = match date.trim().to_ascii_lowercase().as_str() {
            "today" => ForecastDay::Today,
            "tomorrow" => ForecastDay::Tomorrow,
            other => bail!("date must be \"today\" or \"tomorrow\", got {:?}", other),
        };
        let (hour, minute) = time
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("time must be HH:MM, got {:?}", time))?;
        let hour: u32 = hour.parse().with_context(|| format!("invalid hour in {:?}", time))?;
        let minute: u32 = minute
            .parse()
            .with_context(|| format!("invalid minute in {:?}", time))?;
        if hour > 23 || minute > 59 {
            bail!("time out of range: {:?}", time);
        }
        Ok(Self { day, hour })
    }
}

impl fmt::Display for WindTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = match self.day {
            ForecastDay::Today => "today",
            ForecastDay::Tomorrow => "tomorrow",
        };
        write!(f, "{} {:02}:00", day, self.hour)
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub current: CurrentWind,
    #[serde(default)]
    pub hourly: Option<HourlyWind>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentWind {
    pub time: String,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
}

#[derive(Debug, Deserialize)]
pub struct HourlyWind {
    pub time: Vec<String>,
    pub wind_speed_10m: Vec<Option<f64>>,
    pub wind_direction_10m: Vec<Option<f64>>,
}

impl ForecastResponse {
    /// Wind for `when`, or the current observation when no time is asked for
    /// or the forecast lacks that hour.
    pub fn wind_at(&self, when: Option<WindTime>) -> Result<WindConditions> {
        let current = WindConditions {
            direction_deg: self.current.wind_direction_10m,
            speed_kmh: self.current.wind_speed_10m,
        };
        if !current.direction_deg.is_finite() || !current.speed_kmh.is_finite() {
            bail!("forecast has no usable current wind");
        }

        let Some(when) = when else {
            return Ok(current);
        };
        let slot = slot_label(today(&self.current.time)?, when)?;
        let hourly = self.hourly.as_ref().and_then(|hourly| {
            let idx = hourly.time.iter().position(|time| time == &slot)?;
            let speed = (*hourly.wind_speed_10m.get(idx)?)?;
            let direction = (*hourly.wind_direction_10m.get(idx)?)?;
            Some(WindConditions {
                direction_deg: direction,
                speed_kmh: speed,
            })
        });
        match hourly {
            Some(wind) => Ok(wind),
            None => {
                tracing::debug!(slot = %slot, "Forecast slot missing, using current wind");
                Ok(current)
            }
        }
    }
}

/// Local date of the forecast's `current.time`.
fn today(current_time: &str) -> Result<NaiveDate> {
    NaiveDateTime::parse_from_str(current_time, "%Y-%m-%dT%H:%M")
        .map(|time| time.date())
        .or_else(|_| NaiveDate::parse_from_str(current_time.get(..10).unwrap_or(""), "%Y-%m-%d"))
        .with_context(|| format!("unrecognised forecast time {:?}", current_time))
}

/// Hourly key such as `2024-05-02T09:00`.
fn slot_label(today: NaiveDate, when: WindTime) -> Result<String> {
    let date = match when.day {
        ForecastDay::Today => today,
        ForecastDay::Tomorrow => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| anyhow!("date overflow after {}", today))?,
    };
    Ok(format!("{}T{:02}:00", date.format("%Y-%m-%d"), when.hour))
}

/// HTTP client for the Open-Meteo forecast API.
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_forecast(&self, point: GeoPoint) -> Result<ForecastResponse> {
        let url = format!("{}/v1/forecast", self.base_url);
        let latitude = point.lat.to_string();
        let longitude = point.lon.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", WIND_FIELDS),
                ("hourly", WIND_FIELDS),
                ("timezone", "auto"),
                ("forecast_days", "2"),
                ("wind_speed_unit", "kmh"),
            ])
            .send()
            .await
            .context("Failed to fetch wind forecast")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Wind forecast request failed: {} {}", status, body));
        }

        response
            .json::<ForecastResponse>()
            .await
            .context("Failed to parse wind forecast")
    }

    /// Wind at `point` for `when`, falling back to the current observation.
    pub async fn wind_at(&self, point: GeoPoint, when: Option<WindTime>) -> Result<WindConditions> {
        let forecast = self.fetch_forecast(point).await?;
        let wind = forecast.wind_at(when)?;
        tracing::debug!(
            lat = point.lat,
            lon = point.lon,
            direction_deg = wind.direction_deg,
            speed_kmh = wind.speed_kmh,
            "Fetched wind"
        );
        Ok(wind)
    }
}
