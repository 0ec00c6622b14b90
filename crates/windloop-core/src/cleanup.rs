//! Spur removal for road-snapped geometry.
//!
//! Routing engines occasionally detour onto a dead end and come straight back.
//! Such a spur shows up as a short stretch of path whose end lands next to its
//! beginning. This pass cuts those stretches out.

use crate::error::GeoError;
use crate::geo::{distance_m, path_length_km};
use crate::models::{GeoPoint, RoutedPath};

/// Points scanned ahead of each walk position.
pub const SPUR_LOOKAHEAD: usize = 50;
/// A spur closes when the path returns within this radius.
pub const SPUR_CLOSURE_M: f64 = 30.0;
/// Longest detour still treated as a spur.
pub const SPUR_MAX_LOOP_M: f64 = 1_000.0;
/// Shorter stretches are duplicate or jittered points, not spurs.
pub const SPUR_MIN_LENGTH_M: f64 = 5.0;
/// Detour length must exceed the closing gap by this ratio.
pub const SPUR_MIN_DETOUR_RATIO: f64 = 3.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub spurs: usize,
    pub removed_points: usize,
}

/// Remove spurs from `path`, returning the reduced path.
///
/// Passes repeat until nothing changes, so the output is a fixpoint and a
/// second call returns it unchanged.
pub fn remove_spurs(path: &[GeoPoint]) -> Result<(Vec<GeoPoint>, CleanupReport), GeoError> {
    if let Some(idx) = path.iter().position(|point| !point.is_finite()) {
        return Err(GeoError::NonFinite(idx));
    }

    let mut current = path.to_vec();
    let mut report = CleanupReport::default();
    loop {
        let (next, spurs) = single_pass(&current);
        if spurs == 0 {
            break;
        }
        report.spurs += spurs;
        report.removed_points += current.len() - next.len();
        current = next;
    }
    Ok((current, report))
}

/// Clean a routed path in place and recompute its distance when anything was
/// cut. Duration shrinks in proportion.
pub fn clean_routed_path(routed: &mut RoutedPath) -> Result<CleanupReport, GeoError> {
    let (cleaned, report) = remove_spurs(&routed.geometry)?;
    if report.removed_points == 0 {
        return Ok(report);
    }

    let distance_m = path_length_km(&cleaned) * 1000.0;
    if routed.distance_m > 0.0 {
        routed.duration_s *= (distance_m / routed.distance_m).min(1.0);
    }
    routed.distance_m = distance_m;
    routed.geometry = cleaned;
    tracing::debug!(
        spurs = report.spurs,
        removed_points = report.removed_points,
        distance_m,
        "Removed spurs from routed path"
    );
    Ok(report)
}

fn single_pass(path: &[GeoPoint]) -> (Vec<GeoPoint>, usize) {
    let n = path.len();
    if n < 4 {
        return (path.to_vec(), 0);
    }

    let mut out = Vec::with_capacity(n);
    let mut spurs = 0;
    let mut i = 0;
    while i < n {
        out.push(path[i]);
        match find_spur_end(path, i) {
            Some(j) => {
                spurs += 1;
                i = j;
            }
            None => i += 1,
        }
    }
    (out, spurs)
}

/// Farthest index within the lookahead window that closes a spur opened at `i`.
fn find_spur_end(path: &[GeoPoint], i: usize) -> Option<usize> {
    let last = path.len() - 1;
    let window_end = (i + SPUR_LOOKAHEAD).min(last);
    let mut loop_m = 0.0;
    let mut best = None;

    for j in i + 1..=window_end {
        loop_m += distance_m(path[j - 1], path[j]);
        if loop_m > SPUR_MAX_LOOP_M {
            break;
        }
        if j < i + 2 || (i == 0 && j == last) {
            continue;
        }
        let gap = distance_m(path[i], path[j]);
        if gap < SPUR_CLOSURE_M
            && loop_m >= SPUR_MIN_LENGTH_M
            && loop_m >= SPUR_MIN_DETOUR_RATIO * gap
            && !continues_outward(path, i, j)
        {
            best = Some(j);
        }
    }
    best
}

/// True when the points just outside `i..j` also meet, i.e. `i..j` is only the
/// tip of a longer out-and-back that must be judged as a whole.
fn continues_outward(path: &[GeoPoint], i: usize, j: usize) -> bool {
    match (i.checked_sub(1), path.get(j + 1)) {
        (Some(before), Some(after)) => distance_m(path[before], *after) < SPUR_CLOSURE_M,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    const START: GeoPoint = GeoPoint::new(52.0907, 5.1214);

    /// Eastbound road sampled every 100 m.
    fn straight(from: GeoPoint, count: usize) -> Vec<GeoPoint> {
        (0..count)
            .map(|i| destination(from, i as f64 * 0.1, 90.0))
            .collect()
    }

    /// Road with a 300 m dead-end excursion north at its fifth point.
    fn road_with_spur() -> (Vec<GeoPoint>, usize) {
        let mut path = straight(START, 5);
        let junction = *path.last().unwrap();
        let spur_len = path.len();
        for step in 1..=3 {
            path.push(destination(junction, step as f64 * 0.1, 0.0));
        }
        for step in (1..=2).rev() {
            path.push(destination(junction, step as f64 * 0.1, 0.0));
        }
        // back on the road, 5 m from the junction
        let rejoin = destination(junction, 0.005, 90.0);
        path.push(rejoin);
        path.extend(straight(destination(rejoin, 0.1, 90.0), 5));
        (path, spur_len)
    }

    #[test]
    fn removes_injected_spur() {
        let (path, spur_start) = road_with_spur();
        let before_km = path_length_km(&path);

        let (cleaned, report) = remove_spurs(&path).unwrap();
        assert_eq!(report.spurs, 1);
        assert_eq!(report.removed_points, 5);
        assert_eq!(cleaned.len(), path.len() - 5);
        // the junction is followed directly by the rejoin point
        assert_eq!(cleaned[spur_start - 1], path[spur_start - 1]);
        assert_eq!(cleaned[spur_start], path[spur_start + 5]);
        assert!(path_length_km(&cleaned) < before_km);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let (path, _) = road_with_spur();
        let (once, _) = remove_spurs(&path).unwrap();
        let (twice, report) = remove_spurs(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(report, CleanupReport::default());
    }

    #[test]
    fn leaves_dense_straight_geometry_alone() {
        let path: Vec<GeoPoint> = (0..40)
            .map(|i| destination(START, i as f64 * 0.01, 45.0))
            .collect();
        let (cleaned, report) = remove_spurs(&path).unwrap();
        assert_eq!(cleaned, path);
        assert_eq!(report.spurs, 0);
    }

    #[test]
    fn keeps_long_detours() {
        // 2 km out-and-back is a real part of the ride
        let mut path = straight(START, 3);
        let junction = *path.last().unwrap();
        for step in 1..=10 {
            path.push(destination(junction, step as f64 * 0.1, 0.0));
        }
        for step in (1..10).rev() {
            path.push(destination(junction, step as f64 * 0.1, 0.0));
        }
        path.push(destination(junction, 0.005, 90.0));
        let (cleaned, _) = remove_spurs(&path).unwrap();
        assert_eq!(cleaned.len(), path.len());
    }

    #[test]
    fn removes_short_dead_end() {
        // road sampled every 50 m, 25 m dead end north at the junction
        let mut path: Vec<GeoPoint> = (0..6)
            .map(|i| destination(START, i as f64 * 0.05, 90.0))
            .collect();
        let junction = *path.last().unwrap();
        path.push(destination(junction, 0.025, 0.0));
        let rejoin = destination(junction, 0.002, 90.0);
        path.push(rejoin);
        path.extend((1..6).map(|i| destination(rejoin, i as f64 * 0.05, 90.0)));

        let (cleaned, report) = remove_spurs(&path).unwrap();
        assert_eq!(report.spurs, 1);
        assert_eq!(report.removed_points, 1);
        assert_eq!(cleaned[5], junction);
        assert_eq!(cleaned[6], rejoin);
        assert!(path_length_km(&cleaned) < path_length_km(&path));
    }

    #[test]
    fn keeps_the_tip_of_a_long_out_and_back() {
        // 800 m each way: the whole detour exceeds the spur limit, and the
        // last few hundred meters before the tip must not be cut on their own
        let mut path = straight(START, 3);
        let junction = *path.last().unwrap();
        for step in 1..=8 {
            path.push(destination(junction, step as f64 * 0.1, 0.0));
        }
        for step in (1..8).rev() {
            path.push(destination(junction, step as f64 * 0.1, 0.0));
        }
        let rejoin = destination(junction, 0.005, 90.0);
        path.push(rejoin);
        path.extend((1..4).map(|i| destination(rejoin, i as f64 * 0.1, 90.0)));

        let (cleaned, report) = remove_spurs(&path).unwrap();
        assert_eq!(report, CleanupReport::default());
        assert_eq!(cleaned, path);
    }

    #[test]
    fn does_not_collapse_a_tiny_closed_loop() {
        let a = START;
        let b = destination(a, 0.1, 90.0);
        let c = destination(b, 0.1, 0.0);
        let d = destination(a, 0.1, 0.0);
        let path = vec![a, b, c, d, a];
        let (cleaned, _) = remove_spurs(&path).unwrap();
        assert_eq!(cleaned.first(), Some(&a));
        assert_eq!(cleaned.last(), Some(&a));
        assert!(cleaned.len() >= 2);
    }

    #[test]
    fn rejects_non_finite_points() {
        let path = vec![START, GeoPoint::new(f64::NAN, 5.0), START];
        assert_eq!(remove_spurs(&path), Err(GeoError::NonFinite(1)));
    }

    #[test]
    fn routed_distance_is_recomputed() {
        let (path, _) = road_with_spur();
        let length_m = path_length_km(&path) * 1000.0;
        let mut routed = RoutedPath {
            geometry: path,
            distance_m: length_m,
            duration_s: 600.0,
            extras: None,
        };
        let report = clean_routed_path(&mut routed).unwrap();
        assert_eq!(report.spurs, 1);
        assert!(routed.distance_m < length_m);
        assert!((routed.distance_m - path_length_km(&routed.geometry) * 1000.0).abs() < 1e-6);
        assert!(routed.duration_s < 600.0);
    }
}
