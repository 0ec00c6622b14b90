//! Route generation and snap-to-road endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use windloop_core::{
    generate_route, snap_route, AbortSignal, AvoidFeature, FeatureCollection, GeoPoint,
    RouteRequest, RouteShape, RoutingPreferences, SurfacePreference, WindStrategy,
};
use windloop_upstream::WindTime;

use super::error::ApiError;
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/generate-route", post(generate_route_handler))
        .route("/api/snap-route", post(snap_route_handler))
}

// === Request types ===

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl LatLng {
    fn to_point(self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateTimeParam {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    #[serde(default)]
    pub avoid_features: Vec<AvoidFeature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRouteRequest {
    pub start_location: Option<LatLng>,
    pub return_location: Option<LatLng>,
    /// Kilometers.
    pub distance: Option<f64>,
    pub wind_strategy: Option<WindStrategy>,
    pub shape: Option<RouteShape>,
    /// Shared bend for both legs; a per-leg value wins.
    pub bending: Option<f64>,
    pub bending_outbound: Option<f64>,
    pub bending_inbound: Option<f64>,
    pub randomness: Option<f64>,
    pub randomness_outbound: Option<f64>,
    pub randomness_inbound: Option<f64>,
    pub surface_preference: Option<SurfacePreference>,
    #[serde(default)]
    pub maximize_elevation: bool,
    pub date_time: Option<DateTimeParam>,
    #[serde(default)]
    pub options: RouteOptions,
}

impl GenerateRouteRequest {
    /// Validate into a core request plus the forecast hour to use.
    pub fn into_request(self) -> Result<(RouteRequest, Option<WindTime>), ApiError> {
        let start = self
            .start_location
            .ok_or_else(|| ApiError::bad_request("startLocation is required"))?
            .to_point();

        let base = match self.return_location {
            Some(return_location) => {
                RouteRequest::with_return_point(start, return_location.to_point())?
            }
            None => {
                let distance = self
                    .distance
                    .ok_or_else(|| ApiError::bad_request("distance or returnLocation is required"))?;
                RouteRequest::new(
                    start,
                    distance,
                    self.wind_strategy.unwrap_or_default(),
                    self.shape.unwrap_or_default(),
                )?
            }
        };

        let request = base
            .bend(
                self.bending_outbound.or(self.bending).unwrap_or(0.0),
                self.bending_inbound.or(self.bending).unwrap_or(0.0),
            )
            .randomness(
                self.randomness_outbound.or(self.randomness).unwrap_or(0.0),
                self.randomness_inbound.or(self.randomness).unwrap_or(0.0),
            )
            .preferences(RoutingPreferences {
                surface: self.surface_preference.unwrap_or_default(),
                avoid_features: self.options.avoid_features,
                maximize_elevation: self.maximize_elevation,
            });

        let when = self
            .date_time
            .map(|param| WindTime::parse(&param.date, &param.time))
            .transpose()
            .map_err(|err| ApiError::bad_request(format!("invalid dateTime: {:#}", err)))?;

        Ok((request, when))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapRouteRequest {
    /// `[lon, lat]` or `[lon, lat, elevation]`.
    pub waypoints: Option<Vec<Vec<f64>>>,
    pub surface_preference: Option<SurfacePreference>,
    #[serde(default)]
    pub maximize_elevation: bool,
    #[serde(default)]
    pub options: RouteOptions,
}

impl SnapRouteRequest {
    pub fn into_path(self) -> Result<(Vec<GeoPoint>, RoutingPreferences), ApiError> {
        let waypoints = self
            .waypoints
            .ok_or_else(|| ApiError::bad_request("waypoints are required"))?;
        let path = waypoints
            .iter()
            .enumerate()
            .map(|(idx, coord)| match coord.as_slice() {
                [lon, lat] => Ok(GeoPoint::new(*lat, *lon)),
                [lon, lat, ele, ..] => Ok(GeoPoint::new(*lat, *lon).with_elevation(*ele)),
                _ => Err(ApiError::bad_request(format!(
                    "waypoint {} must be [lon, lat]",
                    idx
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let preferences = RoutingPreferences {
            surface: self.surface_preference.unwrap_or_default(),
            avoid_features: self.options.avoid_features,
            maximize_elevation: self.maximize_elevation,
        };
        Ok((path, preferences))
    }
}

// === Handlers ===

/// Stops the ladder from starting new attempts once the handler is dropped,
/// e.g. when the client disconnects.
struct AbortOnDrop(AbortSignal);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

async fn generate_route_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRouteRequest>, JsonRejection>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let (request, when) = json_body(payload)?.into_request()?;

    let wind = state
        .wind()
        .lookup(request.start, when)
        .await
        .map_err(ApiError::Wind)?;
    tracing::info!(
        distance_km = request.target_distance_km,
        strategy = request.wind_strategy.as_str(),
        shape = ?request.shape,
        wind_direction_deg = wind.direction_deg,
        wind_speed_kmh = wind.speed_kmh,
        "Generating route"
    );

    let guard = AbortOnDrop(AbortSignal::new());
    let abort = guard.0.clone();
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        let mut rng = StdRng::from_os_rng();
        generate_route(task_state.router(), &request, wind, &mut rng, &abort).await
    });

    let result = task
        .await
        .map_err(|err| ApiError::Internal(format!("route task failed: {}", err)))??;
    drop(guard);

    tracing::info!(
        attempts = result.attempts,
        snapped = result.snapped,
        distance_m = result.distance_m,
        "Route generated"
    );
    Ok(Json(result.to_feature_collection()))
}

async fn snap_route_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SnapRouteRequest>, JsonRejection>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let (path, preferences) = json_body(payload)?.into_path()?;
    let result = snap_route(state.router(), &path, &preferences).await?;
    tracing::info!(
        waypoints = path.len(),
        snapped = result.snapped,
        distance_m = result.distance_m,
        "Route snapped"
    );
    Ok(Json(result.to_feature_collection()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_leg_values_override_shared_ones() {
        let body: GenerateRouteRequest = serde_json::from_value(serde_json::json!({
            "startLocation": {"lat": 52.0907, "lng": 5.1214},
            "distance": 50,
            "windStrategy": "tailwind_first",
            "shape": "figure-8",
            "bending": 40,
            "bendingInbound": 10,
            "randomness": 3,
            "randomnessOutbound": 8,
            "surfacePreference": "paved",
            "options": {"avoidFeatures": ["ferries"]}
        }))
        .unwrap();
        let (request, when) = body.into_request().unwrap();
        assert_eq!(request.bend_outbound_pct, 40.0);
        assert_eq!(request.bend_inbound_pct, 10.0);
        assert_eq!(request.randomness_outbound, 8.0);
        assert_eq!(request.randomness_inbound, 3.0);
        assert_eq!(request.wind_strategy, WindStrategy::TailwindFirst);
        assert_eq!(request.shape, RouteShape::Figure8);
        assert_eq!(request.preferences.surface, SurfacePreference::Paved);
        assert_eq!(request.preferences.avoid_features, vec![AvoidFeature::Ferries]);
        assert!(when.is_none());
    }

    #[test]
    fn return_location_makes_a_custom_request() {
        let body: GenerateRouteRequest = serde_json::from_value(serde_json::json!({
            "startLocation": {"lat": 52.0907, "lng": 5.1214},
            "returnLocation": {"lat": 52.15, "lng": 5.2},
            "dateTime": {"date": "tomorrow", "time": "08:30"}
        }))
        .unwrap();
        let (request, when) = body.into_request().unwrap();
        assert!(request.is_custom());
        assert_eq!(request.wind_strategy, WindStrategy::Custom);
        assert_eq!(when.map(|w| w.hour), Some(8));
    }

    #[test]
    fn snap_waypoints_are_lon_lat() {
        let body: SnapRouteRequest = serde_json::from_value(serde_json::json!({
            "waypoints": [[5.12, 52.09], [5.2, 52.1, 3.0]]
        }))
        .unwrap();
        let (path, _) = body.into_path().unwrap();
        assert_eq!(path[0], GeoPoint::new(52.09, 5.12));
        assert_eq!(path[1].elevation_m, Some(3.0));

        let bad: SnapRouteRequest =
            serde_json::from_value(serde_json::json!({"waypoints": [[5.12]]})).unwrap();
        assert!(bad.into_path().is_err());
    }
}
