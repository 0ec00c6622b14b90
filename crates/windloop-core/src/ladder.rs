//! Retry ladder: synthesize, submit, perturb, repeat.
//!
//! Each rung of the ladder rebuilds the waypoints with a shorter distance
//! and/or a rotated heading and asks the gateway again. When every rung fails
//! the caller still gets a renderable straight-line route with a warning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::cleanup::clean_routed_path;
use crate::error::RouteError;
use crate::gateway::{GatewayFailure, GatewayOutcome, RoutingGateway};
use crate::geo::{normalize_bearing, path_length_km};
use crate::models::{
    GeoPoint, RouteAttempt, RouteRequest, RouteResult, RoutedPath, WindConditions, WindSummary,
};
use crate::shapes::{synthesize, synthesize_custom, LegStyle, ShapeSpec};
use crate::wind::{resolve_heading, Heading};

/// Upper bound on gateway calls per request.
pub const MAX_ATTEMPTS: usize = 6;

/// Assumed riding speed for straight-line fallbacks.
pub const FALLBACK_SPEED_KMH: f64 = 20.0;

/// One rung of the ladder, relative to the requested distance and heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptStep {
    pub distance_multiplier: f64,
    pub rotation_deg: f64,
}

const fn step(distance_multiplier: f64, rotation_deg: f64) -> AttemptStep {
    AttemptStep {
        distance_multiplier,
        rotation_deg,
    }
}

/// The first rung adds a 5% margin; later rungs trade distance and heading for
/// a better chance of a routable path.
pub const ATTEMPT_SCHEDULE: [AttemptStep; MAX_ATTEMPTS] = [
    step(1.05, 0.0),
    step(0.8, 0.0),
    step(0.8, 30.0),
    step(0.8, -30.0),
    step(0.6, 0.0),
    step(0.6, 90.0),
];

/// Control variables for one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptState {
    /// Zero-based index into [`ATTEMPT_SCHEDULE`].
    index: usize,
    target_km: f64,
}

impl AttemptState {
    pub fn first(target_km: f64) -> Self {
        Self {
            index: 0,
            target_km,
        }
    }

    /// Next rung, or `None` once the schedule is exhausted.
    pub fn next(self) -> Option<Self> {
        (self.index + 1 < ATTEMPT_SCHEDULE.len()).then_some(Self {
            index: self.index + 1,
            ..self
        })
    }

    pub fn attempt_number(&self) -> u32 {
        self.index as u32 + 1
    }

    pub fn step(&self) -> AttemptStep {
        ATTEMPT_SCHEDULE[self.index]
    }

    pub fn distance_km(&self) -> f64 {
        self.target_km * self.step().distance_multiplier
    }

    pub fn rotation_deg(&self) -> f64 {
        self.step().rotation_deg
    }
}

/// Cooperative cancellation flag shared with the caller.
///
/// The ladder checks it before every gateway call; a call already in flight
/// is left to finish or time out.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a result is a straight-line approximation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FallbackReason {
    Unconfigured,
    Failed(GatewayFailure),
}

impl FallbackReason {
    fn warning(&self, attempts: u32) -> String {
        match self {
            FallbackReason::Unconfigured => {
                "Demo mode: no routing credentials configured. Showing a straight-line route without road snapping.".to_string()
            }
            FallbackReason::Failed(failure) if failure.is_authorization() => format!(
                "Routing service rejected the request's authorization ({}). The API key may be invalid or its quota exhausted. Showing a straight-line route without road snapping.",
                failure
            ),
            FallbackReason::Failed(failure) => format!(
                "Routing failed after {} attempt{} ({}). Showing a straight-line route without road snapping.",
                attempts,
                if attempts == 1 { "" } else { "s" },
                failure
            ),
        }
    }
}

/// Generate a route for `request` under the given wind.
pub async fn generate_route<G, R>(
    gateway: &G,
    request: &RouteRequest,
    wind: WindConditions,
    rng: &mut R,
    abort: &AbortSignal,
) -> Result<RouteResult, RouteError>
where
    G: RoutingGateway,
    R: Rng + Send,
{
    let heading = resolve_heading(
        request.start,
        wind.direction_deg,
        request.wind_strategy,
        request.return_point,
    )
    .ok_or(RouteError::MissingReturnPoint)?;

    let summary = WindSummary {
        direction_deg: wind.direction_deg,
        speed_kmh: wind.speed_kmh,
        strategy: request.wind_strategy,
    };
    let outbound = LegStyle::new(request.bend_outbound_pct, request.randomness_outbound);
    let inbound = LegStyle::new(request.bend_inbound_pct, request.randomness_inbound);

    match heading {
        Heading::ReturnPoint {
            point,
            round_trip_km,
        } => {
            if abort.is_aborted() {
                return Err(RouteError::Cancelled);
            }
            let attempt = RouteAttempt {
                attempt_number: 1,
                distance_used_km: round_trip_km,
                rotation_offset_deg: 0.0,
                waypoints: synthesize_custom(request.start, point, outbound, inbound, rng),
            };
            tracing::debug!(
                round_trip_km,
                waypoints = attempt.waypoints.len(),
                "Routing custom out-and-back"
            );
            let result = match gateway
                .directions(&attempt.waypoints, &request.preferences)
                .await
            {
                GatewayOutcome::Success(routed) => finish(routed, None, 1),
                GatewayOutcome::Failure(failure) => {
                    tracing::warn!("Custom route failed: {}", failure);
                    straight_line(&attempt.waypoints, FallbackReason::Failed(failure), 1)
                }
                GatewayOutcome::Unconfigured => {
                    straight_line(&attempt.waypoints, FallbackReason::Unconfigured, 1)
                }
            };
            Ok(RouteResult {
                wind: Some(summary),
                ..result
            })
        }
        Heading::Bearing(bearing) => {
            let mut state = AttemptState::first(request.target_distance_km);
            loop {
                if abort.is_aborted() {
                    tracing::info!(
                        attempt = state.attempt_number(),
                        "Route generation cancelled"
                    );
                    return Err(RouteError::Cancelled);
                }

                let attempt = build_attempt(request, bearing, state, outbound, inbound, rng);
                tracing::debug!(
                    attempt = attempt.attempt_number,
                    distance_km = attempt.distance_used_km,
                    rotation_deg = attempt.rotation_offset_deg,
                    waypoints = attempt.waypoints.len(),
                    "Submitting route attempt"
                );

                let calls = attempt.attempt_number;
                let result = match gateway
                    .directions(&attempt.waypoints, &request.preferences)
                    .await
                {
                    GatewayOutcome::Success(routed) => {
                        let warning = (calls > 1).then(|| adjustment_warning(request, &attempt));
                        finish(routed, warning, calls)
                    }
                    GatewayOutcome::Unconfigured => {
                        straight_line(&attempt.waypoints, FallbackReason::Unconfigured, calls)
                    }
                    GatewayOutcome::Failure(failure) => match state.next() {
                        Some(next) => {
                            tracing::warn!(
                                attempt = calls,
                                "Route attempt failed, retrying: {}",
                                failure
                            );
                            state = next;
                            continue;
                        }
                        None => {
                            tracing::warn!(
                                attempts = calls,
                                "All route attempts failed, using straight line: {}",
                                failure
                            );
                            straight_line(
                                &attempt.waypoints,
                                FallbackReason::Failed(failure),
                                calls,
                            )
                        }
                    },
                };
                return Ok(RouteResult {
                    wind: Some(summary),
                    ..result
                });
            }
        }
    }
}

fn build_attempt<R: Rng>(
    request: &RouteRequest,
    bearing: f64,
    state: AttemptState,
    outbound: LegStyle,
    inbound: LegStyle,
    rng: &mut R,
) -> RouteAttempt {
    let spec = ShapeSpec {
        start: request.start,
        bearing_deg: normalize_bearing(bearing + state.rotation_deg()),
        distance_km: state.distance_km(),
        shape: request.shape,
        outbound,
        inbound,
    };
    RouteAttempt {
        attempt_number: state.attempt_number(),
        distance_used_km: spec.distance_km,
        rotation_offset_deg: state.rotation_deg(),
        waypoints: synthesize(&spec, rng),
    }
}

fn adjustment_warning(request: &RouteRequest, attempt: &RouteAttempt) -> String {
    let mut changes = Vec::new();
    if attempt.distance_used_km < request.target_distance_km {
        let pct = attempt.distance_used_km / request.target_distance_km * 100.0;
        changes.push(format!(
            "shortened to {:.1} km ({:.0}% of the requested {:.1} km)",
            attempt.distance_used_km, pct, request.target_distance_km
        ));
    }
    if attempt.rotation_offset_deg != 0.0 {
        changes.push(format!(
            "rotated {:+.0}° from the wind-optimal heading",
            attempt.rotation_offset_deg
        ));
    }
    format!(
        "No route found for the original request; succeeded on attempt {} with the route {}.",
        attempt.attempt_number,
        changes.join(" and ")
    )
}

/// Run cleanup on a successful path and wrap it as a result.
pub(crate) fn finish(mut routed: RoutedPath, warning: Option<String>, attempts: u32) -> RouteResult {
    if let Err(err) = clean_routed_path(&mut routed) {
        tracing::warn!("Spur cleanup failed, keeping engine geometry: {}", err);
    }
    RouteResult {
        geometry: routed.geometry,
        distance_m: routed.distance_m,
        duration_s: routed.duration_s,
        wind: None,
        warning,
        extras: routed.extras,
        attempts,
        snapped: true,
    }
}

/// Join the waypoints directly, no road snapping.
pub(crate) fn straight_line(
    waypoints: &[GeoPoint],
    reason: FallbackReason,
    attempts: u32,
) -> RouteResult {
    let distance_km = path_length_km(waypoints);
    RouteResult {
        geometry: waypoints.to_vec(),
        distance_m: distance_km * 1000.0,
        duration_s: distance_km / FALLBACK_SPEED_KMH * 3600.0,
        wind: None,
        warning: Some(reason.warning(attempts)),
        extras: None,
        attempts,
        snapped: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_walks_every_rung_once() {
        let mut state = AttemptState::first(50.0);
        let mut seen = vec![(state.distance_km(), state.rotation_deg())];
        while let Some(next) = state.next() {
            state = next;
            seen.push((state.distance_km(), state.rotation_deg()));
        }
        assert_eq!(seen.len(), MAX_ATTEMPTS);
        assert!((seen[0].0 - 52.5).abs() < 1e-9);
        assert_eq!(seen[2].1, 30.0);
        assert_eq!(seen[3].1, -30.0);
        assert!((seen[4].0 - 30.0).abs() < 1e-9);
        assert_eq!(seen[5].1, 90.0);
        assert_eq!(state.attempt_number(), 6);
    }

    #[test]
    fn warnings_name_the_cause() {
        let auth = FallbackReason::Failed(GatewayFailure::http(403, "Quota exceeded")).warning(6);
        assert!(auth.contains("authorization"));
        assert!(auth.contains("quota"));

        let generic = FallbackReason::Failed(GatewayFailure::http(500, "boom")).warning(6);
        assert!(generic.contains("6 attempts"));

        assert!(FallbackReason::Unconfigured.warning(1).contains("Demo mode"));
    }

    #[test]
    fn abort_signal_is_shared() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_aborted());
        clone.abort();
        assert!(signal.is_aborted());
    }
}
