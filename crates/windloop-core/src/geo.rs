//! Spherical geometry primitives over [`GeoPoint`].
//!
//! All functions are pure. Distances are kilometres unless a name says
//! otherwise, bearings are degrees clockwise from north.

use crate::error::GeoError;
use crate::models::GeoPoint;

/// Mean Earth radius used by every projection in this crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance budget for floating-point slop when walking a path.
const PATH_EPSILON_KM: f64 = 1e-9;

/// Normalize any finite bearing into [0, 360).
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let normalized = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Great-circle distance between two points using the haversine formula.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_km(a, b) * 1000.0
}

/// Point reached from `origin` after `distance_km` along the initial bearing.
pub fn destination(origin: GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    if distance_km.abs() <= f64::EPSILON {
        return GeoPoint::new(origin.lat, origin.lon);
    }

    let bearing_rad = normalize_bearing(bearing_deg).to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let angular_distance = distance_km / EARTH_RADIUS_KM;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let lon2 = lon1 + y.atan2(x);
    let lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    GeoPoint::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Initial bearing from `a` to `b`, in [0, 360).
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_bearing(x.atan2(y).to_degrees())
}

/// Great-circle midpoint of `a` and `b`.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let lambda1 = a.lon.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let bx = phi2.cos() * delta_lambda.cos();
    let by = phi2.cos() * delta_lambda.sin();
    let phi3 = (phi1.sin() + phi2.sin()).atan2(((phi1.cos() + bx).powi(2) + by * by).sqrt());
    let lambda3 = lambda1 + by.atan2(phi1.cos() + bx);

    GeoPoint::new(phi3.to_degrees(), normalize_lon(lambda3.to_degrees()))
}

fn normalize_lon(lon: f64) -> f64 {
    (lon + 540.0).rem_euclid(360.0) - 180.0
}

/// Sum of segment lengths along a polyline.
pub fn path_length_km(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|pair| distance_km(pair[0], pair[1])).sum()
}

/// Point located `along_km` along `path` from its first point.
pub fn point_along(path: &[GeoPoint], along_km: f64) -> Result<GeoPoint, GeoError> {
    let first = *path.first().ok_or(GeoError::EmptyPath)?;
    let length_km = path_length_km(path);
    if !along_km.is_finite() || along_km < 0.0 || along_km > length_km + PATH_EPSILON_KM {
        return Err(GeoError::BeyondPath {
            requested_km: along_km,
            length_km,
        });
    }

    let mut remaining = along_km;
    for pair in path.windows(2) {
        let segment = distance_km(pair[0], pair[1]);
        if remaining <= segment {
            if segment <= f64::EPSILON {
                return Ok(pair[0]);
            }
            return Ok(destination(pair[0], remaining, bearing_deg(pair[0], pair[1])));
        }
        remaining -= segment;
    }

    Ok(path.last().copied().unwrap_or(first))
}

// ==== Local ENU helpers ====

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Minimum distance from `point` to the segment `start..end`, in meters.
///
/// Uses a flat projection anchored at `start`, which is accurate at the
/// segment lengths a routing engine returns.
pub fn distance_to_segment_m(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    let ref_lat = start.lat;
    let m_lat = meters_per_deg_lat(ref_lat);
    let m_lon = meters_per_deg_lon(ref_lat);

    let px = (point.lon - start.lon) * m_lon;
    let py = (point.lat - start.lat) * m_lat;
    let sx = (end.lon - start.lon) * m_lon;
    let sy = (end.lat - start.lat) * m_lat;

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 0.0001 {
        return (px * px + py * py).sqrt();
    }

    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    let dx = px - t * sx;
    let dy = py - t * sy;
    (dx * dx + dy * dy).sqrt()
}

/// Douglas-Peucker simplification with a tolerance in meters.
///
/// Endpoints are kept verbatim and the output never grows.
pub fn simplify(path: &[GeoPoint], tolerance_m: f64) -> Vec<GeoPoint> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let tolerance_m = if tolerance_m.is_finite() {
        tolerance_m.max(0.0)
    } else {
        0.0
    };

    let last = path.len() - 1;
    let mut keep = vec![false; path.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((first, end)) = stack.pop() {
        if end <= first + 1 {
            continue;
        }
        let mut max_dist = -1.0;
        let mut max_idx = first;
        for idx in first + 1..end {
            let dist = distance_to_segment_m(path[idx], path[first], path[end]);
            if dist > max_dist {
                max_dist = dist;
                max_idx = idx;
            }
        }
        if max_dist > tolerance_m {
            keep[max_idx] = true;
            stack.push((first, max_idx));
            stack.push((max_idx, end));
        }
    }

    path.iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}
