//! Re-snap a user-edited polyline to roads.

use crate::error::RouteError;
use crate::gateway::{GatewayOutcome, RoutingGateway};
use crate::geo::simplify;
use crate::ladder::{finish, straight_line, FallbackReason};
use crate::models::{GeoPoint, RouteResult, RoutingPreferences};

/// Most waypoints a single directions request may carry.
pub const MAX_GATEWAY_WAYPOINTS: usize = 50;

const INITIAL_TOLERANCE_M: f64 = 25.0;
const MAX_SIMPLIFY_ROUNDS: usize = 24;

/// Submit `path` through the gateway once and clean the result.
///
/// Edited polylines are usually far denser than the engine accepts, so the
/// path is simplified first. Failures degrade to a straight line through the
/// submitted waypoints, same as the ladder.
pub async fn snap_route<G: RoutingGateway>(
    gateway: &G,
    path: &[GeoPoint],
    preferences: &RoutingPreferences,
) -> Result<RouteResult, RouteError> {
    if path.len() < 2 {
        return Err(RouteError::TooFewWaypoints(path.len()));
    }
    if let Some(idx) = path.iter().position(|point| !point.is_valid()) {
        return Err(RouteError::InvalidPoint(format!("waypoint {}", idx)));
    }

    let waypoints = reduce_waypoints(path, MAX_GATEWAY_WAYPOINTS);
    tracing::debug!(
        submitted = path.len(),
        reduced = waypoints.len(),
        "Snapping edited route"
    );

    let result = match gateway.directions(&waypoints, preferences).await {
        GatewayOutcome::Success(routed) => finish(routed, None, 1),
        GatewayOutcome::Failure(failure) => {
            tracing::warn!("Snap-to-road failed: {}", failure);
            straight_line(&waypoints, FallbackReason::Failed(failure), 1)
        }
        GatewayOutcome::Unconfigured => straight_line(&waypoints, FallbackReason::Unconfigured, 1),
    };
    Ok(result)
}

/// Simplify with growing tolerance until at most `max_points` remain.
pub fn reduce_waypoints(path: &[GeoPoint], max_points: usize) -> Vec<GeoPoint> {
    let max_points = max_points.max(2);
    if path.len() <= max_points {
        return path.to_vec();
    }

    let mut tolerance_m = INITIAL_TOLERANCE_M;
    for _ in 0..MAX_SIMPLIFY_ROUNDS {
        let simplified = simplify(path, tolerance_m);
        if simplified.len() <= max_points {
            return simplified;
        }
        tolerance_m *= 2.0;
    }

    // Pathological input: sample evenly, keeping both endpoints.
    let last = path.len() - 1;
    (0..max_points)
        .map(|i| path[i * last / (max_points - 1)])
        .collect()
}
