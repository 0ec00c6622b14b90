//! GeoJSON rendering of a [`RouteResult`].

use serde::Serialize;

use crate::models::{RouteResult, WindStrategy};

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: LineString,
    pub properties: RouteProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[lon, lat]` or `[lon, lat, elevation]`.
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteProperties {
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<WindProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<serde_json::Value>,
    pub attempts: u32,
    pub snapped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindProperties {
    pub direction: f64,
    pub speed: f64,
    pub strategy: WindStrategy,
}

impl RouteResult {
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let coordinates = self
            .geometry
            .iter()
            .map(|point| match point.elevation_m {
                Some(ele) => vec![point.lon, point.lat, ele],
                None => vec![point.lon, point.lat],
            })
            .collect();

        FeatureCollection {
            kind: "FeatureCollection",
            features: vec![Feature {
                kind: "Feature",
                geometry: LineString {
                    kind: "LineString",
                    coordinates,
                },
                properties: RouteProperties {
                    summary: Summary {
                        distance: self.distance_m,
                        duration: self.duration_s,
                    },
                    wind: self.wind.as_ref().map(|wind| WindProperties {
                        direction: wind.direction_deg,
                        speed: wind.speed_kmh,
                        strategy: wind.strategy,
                    }),
                    warning: self.warning.clone(),
                    extras: self.extras.clone(),
                    attempts: self.attempts,
                    snapped: self.snapped,
                },
            }],
        }
    }
}
