//! openrouteservice directions gateway.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use windloop_core::{
    GatewayFailure, GatewayOutcome, GeoPoint, RoutedPath, RoutingGateway, RoutingPreferences,
    SurfacePreference,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Steepest weighting openrouteservice accepts for cycling profiles.
const STEEPNESS_DIFFICULTY_MAX: u8 = 3;

/// Longest error body excerpt carried into a failure message.
const ERROR_EXCERPT_CHARS: usize = 200;

/// HTTP client for the openrouteservice directions API.
pub struct OrsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OrsClient {
    /// Create a client. A blank key leaves the client unconfigured: every
    /// call answers [`GatewayOutcome::Unconfigured`] without touching the
    /// network.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        let api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key.trim().to_string())
        };
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, preferences: &RoutingPreferences) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.base_url,
            profile_for(preferences.surface)
        )
    }

    async fn send(&self, api_key: &str, waypoints: &[GeoPoint], preferences: &RoutingPreferences) -> GatewayOutcome {
        let url = self.endpoint(preferences);
        let request = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .header("Accept", "application/geo+json, application/json")
            .json(&request_body(waypoints, preferences));

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return GatewayOutcome::Failure(GatewayFailure::transport("request timed out"));
            }
            Err(err) => return GatewayOutcome::Failure(GatewayFailure::transport(err.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return GatewayOutcome::Failure(GatewayFailure::http(status.as_u16(), err.to_string()));
            }
        };

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Directions request rejected");
            return GatewayOutcome::Failure(GatewayFailure::http(status.as_u16(), error_message(&body)));
        }

        match parse_directions(&body) {
            Ok(routed) => GatewayOutcome::Success(routed),
            Err(err) => GatewayOutcome::Failure(GatewayFailure::http(
                status.as_u16(),
                format!("unreadable directions response: {}", err),
            )),
        }
    }
}

impl RoutingGateway for OrsClient {
    async fn directions(&self, waypoints: &[GeoPoint], preferences: &RoutingPreferences) -> GatewayOutcome {
        match self.api_key.as_deref() {
            Some(api_key) => self.send(api_key, waypoints, preferences).await,
            None => GatewayOutcome::Unconfigured,
        }
    }
}

pub fn profile_for(surface: SurfacePreference) -> &'static str {
    match surface {
        SurfacePreference::Paved => "cycling-road",
        SurfacePreference::Unpaved => "cycling-mountain",
        SurfacePreference::Mixed => "cycling-regular",
    }
}

/// JSON body for a directions request.
pub fn request_body(waypoints: &[GeoPoint], preferences: &RoutingPreferences) -> Value {
    let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|p| [p.lon, p.lat]).collect();
    let mut body = json!({
        "coordinates": coordinates,
        "elevation": true,
        "extra_info": ["surface", "steepness", "waytype"],
    });

    let mut options = serde_json::Map::new();
    if !preferences.avoid_features.is_empty() {
        options.insert("avoid_features".to_string(), json!(preferences.avoid_features));
    }
    if preferences.maximize_elevation {
        options.insert(
            "profile_params".to_string(),
            json!({ "weightings": { "steepness_difficulty": STEEPNESS_DIFFICULTY_MAX } }),
        );
    }
    if !options.is_empty() {
        body["options"] = Value::Object(options);
    }
    body
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
struct DirectionsFeature {
    geometry: DirectionsGeometry,
    #[serde(default)]
    properties: DirectionsProperties,
}

#[derive(Debug, Deserialize)]
struct DirectionsGeometry {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectionsProperties {
    #[serde(default)]
    summary: DirectionsSummary,
    extras: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectionsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

/// Parse a GeoJSON directions response into a routed path.
pub fn parse_directions(body: &str) -> Result<RoutedPath> {
    let response: DirectionsResponse = serde_json::from_str(body).context("invalid JSON")?;
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no route feature"))?;

    let geometry = feature
        .geometry
        .coordinates
        .iter()
        .map(|coord| match coord.as_slice() {
            [lon, lat] => Ok(GeoPoint::new(*lat, *lon)),
            [lon, lat, ele, ..] => Ok(GeoPoint::new(*lat, *lon).with_elevation(*ele)),
            _ => Err(anyhow!("coordinate with {} values", coord.len())),
        })
        .collect::<Result<Vec<_>>>()?;
    if geometry.len() < 2 {
        return Err(anyhow!("route geometry has {} points", geometry.len()));
    }

    Ok(RoutedPath {
        geometry,
        distance_m: feature.properties.summary.distance,
        duration_s: feature.properties.summary.duration,
        extras: feature.properties.extras,
    })
}

/// Pull a readable message out of an error body.
///
/// openrouteservice answers `{"error": {"code": .., "message": ..}}` for
/// routing errors and `{"error": ".."}` from its gateway.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let error = &value["error"];
        if let Some(message) = error["message"].as_str().or_else(|| error.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value["message"].as_str() {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(ERROR_EXCERPT_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windloop_core::AvoidFeature;

    fn waypoints() -> Vec<GeoPoint> {
        vec![GeoPoint::new(52.09, 5.12), GeoPoint::new(52.10, 5.00), GeoPoint::new(52.09, 5.12)]
    }

    #[test]
    fn profile_follows_surface() {
        assert_eq!(profile_for(SurfacePreference::Paved), "cycling-road");
        assert_eq!(profile_for(SurfacePreference::Unpaved), "cycling-mountain");
        assert_eq!(profile_for(SurfacePreference::Mixed), "cycling-regular");
    }

    #[test]
    fn body_uses_lon_lat_and_omits_empty_options() {
        let body = request_body(&waypoints(), &RoutingPreferences::default());
        assert_eq!(body["coordinates"][1], json!([5.0, 52.1]));
        assert_eq!(body["elevation"], true);
        assert_eq!(body["extra_info"], json!(["surface", "steepness", "waytype"]));
        assert!(body.get("options").is_none());
    }

    #[test]
    fn body_carries_avoidances_and_steepness() {
        let preferences = RoutingPreferences {
            surface: SurfacePreference::Paved,
            avoid_features: vec![AvoidFeature::Ferries, AvoidFeature::Steps],
            maximize_elevation: true,
        };
        let body = request_body(&waypoints(), &preferences);
        assert_eq!(body["options"]["avoid_features"], json!(["ferries", "steps"]));
        assert_eq!(
            body["options"]["profile_params"]["weightings"]["steepness_difficulty"],
            3
        );
    }

    #[test]
    fn parses_geojson_route() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[5.12, 52.09, 4.0], [5.13, 52.1, 6.5]]},
                "properties": {
                    "summary": {"distance": 1450.2, "duration": 290.0},
                    "extras": {"surface": {"values": [[0, 1, 3]]}}
                }
            }]
        }"#;
        let routed = parse_directions(body).unwrap();
        assert_eq!(routed.geometry.len(), 2);
        assert_eq!(routed.geometry[0].lat, 52.09);
        assert_eq!(routed.geometry[0].lon, 5.12);
        assert_eq!(routed.geometry[1].elevation_m, Some(6.5));
        assert_eq!(routed.distance_m, 1450.2);
        assert!(routed.extras.is_some());
    }

    #[test]
    fn rejects_empty_feature_list() {
        assert!(parse_directions(r#"{"features": []}"#).is_err());
        assert!(parse_directions("not json").is_err());
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(
            error_message(r#"{"error":{"code":2010,"message":"Could not find routable point"}}"#),
            "Could not find routable point"
        );
        assert_eq!(error_message(r#"{"error":"Quota exceeded"}"#), "Quota exceeded");
        assert_eq!(error_message("  "), "empty response body");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn blank_key_is_unconfigured() {
        let client = OrsClient::new(DEFAULT_BASE_URL, "  ", Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        let outcome = client
            .directions(&waypoints(), &RoutingPreferences::default())
            .await;
        assert_eq!(outcome, GatewayOutcome::Unconfigured);
    }

    #[tokio::test]
    async fn unreachable_engine_is_a_transport_failure() {
        let client = OrsClient::new("http://127.0.0.1:9", "key", Duration::from_secs(2)).unwrap();
        match client.directions(&waypoints(), &RoutingPreferences::default()).await {
            GatewayOutcome::Failure(failure) => assert_eq!(failure.status, None),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
