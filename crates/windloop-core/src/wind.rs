//! Wind-relative heading resolution.

use crate::geo::{distance_km, normalize_bearing};
use crate::models::{GeoPoint, WindConditions, WindStrategy};

/// Where the outbound leg should head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Heading {
    /// Compass bearing of the outbound leg.
    Bearing(f64),
    /// Explicit turnaround; bearing is irrelevant.
    ReturnPoint { point: GeoPoint, round_trip_km: f64 },
}

/// Outbound bearing for a wind-relative strategy.
///
/// `wind_direction_deg` uses the meteorological "from" convention, so heading
/// straight at it means riding into the wind. Returns `None` for
/// [`WindStrategy::Custom`], which has no bearing.
pub fn outbound_bearing(wind_direction_deg: f64, strategy: WindStrategy) -> Option<f64> {
    let offset = match strategy {
        WindStrategy::HeadwindFirst => 0.0,
        WindStrategy::TailwindFirst => 180.0,
        WindStrategy::Crosswind => 90.0,
        WindStrategy::Custom => return None,
    };
    Some(normalize_bearing(wind_direction_deg + offset))
}

/// Resolve the heading for a request.
///
/// A return point always wins over the strategy: the route becomes an
/// out-and-back of twice the start-to-return distance.
pub fn resolve_heading(
    start: GeoPoint,
    wind_direction_deg: f64,
    strategy: WindStrategy,
    return_point: Option<GeoPoint>,
) -> Option<Heading> {
    if let Some(point) = return_point {
        return Some(Heading::ReturnPoint {
            point,
            round_trip_km: 2.0 * distance_km(start, point),
        });
    }
    outbound_bearing(wind_direction_deg, strategy).map(Heading::Bearing)
}

/// Parse a fixed wind written as `DIR@KMH`, e.g. `270@18`.
pub fn parse_wind(value: &str) -> Option<WindConditions> {
    let (direction, speed) = value.trim().split_once('@')?;
    let direction_deg: f64 = direction.trim().parse().ok()?;
    let speed_kmh: f64 = speed.trim().parse().ok()?;
    if !direction_deg.is_finite() || !speed_kmh.is_finite() || speed_kmh < 0.0 {
        return None;
    }
    Some(WindConditions {
        direction_deg: normalize_bearing(direction_deg),
        speed_kmh,
    })
}
