//! Core data models for route generation.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// A geographic position, optionally carrying an elevation sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation_m: None,
        }
    }

    pub fn with_elevation(mut self, elevation_m: f64) -> Self {
        self.elevation_m = Some(elevation_m);
        self
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Latitude/longitude within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Same horizontal position, ignoring elevation.
    pub fn same_position(&self, other: &GeoPoint) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

/// Ordered waypoints in visiting order.
pub type WaypointList = Vec<GeoPoint>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindStrategy {
    /// Ride into the wind first, enjoy the tailwind home.
    #[default]
    #[serde(alias = "headwind")]
    HeadwindFirst,
    #[serde(alias = "tailwind")]
    TailwindFirst,
    Crosswind,
    /// Outbound towards an explicit return point.
    Custom,
}

impl WindStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindStrategy::HeadwindFirst => "headwind_first",
            WindStrategy::TailwindFirst => "tailwind_first",
            WindStrategy::Crosswind => "crosswind",
            WindStrategy::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteShape {
    #[default]
    Loop,
    #[serde(alias = "figure-8", alias = "figure_8", alias = "eight")]
    Figure8,
    Square,
    Triangle,
    Hexagon,
    Star,
    Zigzag,
    Boomerang,
}

impl RouteShape {
    /// Fixed geometric forms ignore bend and randomness.
    pub fn is_fixed_form(&self) -> bool {
        matches!(
            self,
            RouteShape::Square | RouteShape::Triangle | RouteShape::Hexagon | RouteShape::Star
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfacePreference {
    Paved,
    Unpaved,
    #[default]
    Mixed,
}

/// Road features the routing engine should steer around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvoidFeature {
    Ferries,
    Steps,
    Fords,
    Highways,
    Tollways,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingPreferences {
    #[serde(default)]
    pub surface: SurfacePreference,
    #[serde(default)]
    pub avoid_features: Vec<AvoidFeature>,
    #[serde(default)]
    pub maximize_elevation: bool,
}

/// A validated route-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub target_distance_km: f64,
    pub wind_strategy: WindStrategy,
    pub shape: RouteShape,
    pub bend_outbound_pct: f64,
    pub bend_inbound_pct: f64,
    pub randomness_outbound: f64,
    pub randomness_inbound: f64,
    pub return_point: Option<GeoPoint>,
    pub preferences: RoutingPreferences,
}

impl RouteRequest {
    /// Build a request for a wind-relative loop of `target_distance_km`.
    pub fn new(
        start: GeoPoint,
        target_distance_km: f64,
        wind_strategy: WindStrategy,
        shape: RouteShape,
    ) -> Result<Self, RouteError> {
        if !start.is_valid() {
            return Err(RouteError::InvalidPoint("start".to_string()));
        }
        if !target_distance_km.is_finite() || target_distance_km <= 0.0 {
            return Err(RouteError::InvalidDistance(target_distance_km));
        }
        if wind_strategy == WindStrategy::Custom {
            return Err(RouteError::MissingReturnPoint);
        }
        Ok(Self {
            start,
            target_distance_km,
            wind_strategy,
            shape,
            bend_outbound_pct: 0.0,
            bend_inbound_pct: 0.0,
            randomness_outbound: 0.0,
            randomness_inbound: 0.0,
            return_point: None,
            preferences: RoutingPreferences::default(),
        })
    }

    /// Build an out-and-back request via an explicit return point.
    ///
    /// The target distance is derived from the return point, so the strategy is
    /// always [`WindStrategy::Custom`].
    pub fn with_return_point(start: GeoPoint, return_point: GeoPoint) -> Result<Self, RouteError> {
        if !start.is_valid() {
            return Err(RouteError::InvalidPoint("start".to_string()));
        }
        if !return_point.is_valid() {
            return Err(RouteError::InvalidPoint("return point".to_string()));
        }
        let round_trip_km = 2.0 * crate::geo::distance_km(start, return_point);
        if round_trip_km <= 0.0 {
            return Err(RouteError::InvalidDistance(round_trip_km));
        }
        Ok(Self {
            start,
            target_distance_km: round_trip_km,
            wind_strategy: WindStrategy::Custom,
            shape: RouteShape::Loop,
            bend_outbound_pct: 0.0,
            bend_inbound_pct: 0.0,
            randomness_outbound: 0.0,
            randomness_inbound: 0.0,
            return_point: Some(return_point),
            preferences: RoutingPreferences::default(),
        })
    }

    pub fn bend(mut self, outbound_pct: f64, inbound_pct: f64) -> Self {
        self.bend_outbound_pct = sanitize_param(outbound_pct, 100.0);
        self.bend_inbound_pct = sanitize_param(inbound_pct, 100.0);
        self
    }

    pub fn randomness(mut self, outbound: f64, inbound: f64) -> Self {
        self.randomness_outbound = sanitize_param(outbound, 10.0);
        self.randomness_inbound = sanitize_param(inbound, 10.0);
        self
    }

    pub fn preferences(mut self, preferences: RoutingPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn is_custom(&self) -> bool {
        self.return_point.is_some()
    }
}

fn sanitize_param(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

/// One rung of the retry ladder, frozen once submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteAttempt {
    pub attempt_number: u32,
    pub distance_used_km: f64,
    pub rotation_offset_deg: f64,
    pub waypoints: WaypointList,
}

/// Wind conditions at the start location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindConditions {
    /// Meteorological "from" direction in degrees.
    pub direction_deg: f64,
    pub speed_kmh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSummary {
    pub direction_deg: f64,
    pub speed_kmh: f64,
    pub strategy: WindStrategy,
}

/// Road-snapped path returned by a routing gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub geometry: Vec<GeoPoint>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Surface/steepness/waytype summaries as returned by the engine.
    pub extras: Option<serde_json::Value>,
}

/// Final artifact handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub geometry: Vec<GeoPoint>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub wind: Option<WindSummary>,
    pub warning: Option<String>,
    pub extras: Option<serde_json::Value>,
    /// Number of gateway calls issued.
    pub attempts: u32,
    /// False for straight-line fallbacks.
    pub snapped: bool,
}
