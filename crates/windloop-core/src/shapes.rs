//! Waypoint synthesis for the supported route shapes.
//!
//! Every shape starts and ends at the start point. Straight-line legs are
//! scaled down by a per-shape factor because road-snapped routes run longer
//! than the geometric figure. The factors are calibration values tuned against
//! openrouteservice cycling profiles and may need re-tuning for another engine.

use rand::Rng;

use crate::geo::{bearing_deg, destination, distance_km, midpoint};
use crate::models::{GeoPoint, RouteShape, WaypointList};

/// Loop turnaround sits at `(D/2) * LOOP_RADIUS_FACTOR` from the start.
pub const LOOP_RADIUS_FACTOR: f64 = 0.55;
/// Radius factor reduction per randomness point above [`HIGH_RANDOMNESS`].
pub const LOOP_HIGH_RANDOMNESS_REDUCTION: f64 = 0.03;
pub const SQUARE_FACTOR: f64 = 0.67;
pub const TRIANGLE_FACTOR: f64 = 0.71;
pub const HEXAGON_FACTOR: f64 = 0.62;
pub const STAR_FACTOR: f64 = 0.51;
/// Apex distance of each figure-8 lobe, as a fraction of half the distance.
pub const FIGURE8_APEX_FACTOR: f64 = 0.205;
pub const ZIGZAG_FACTOR: f64 = 0.60;
pub const BOOMERANG_FACTOR: f64 = 0.51;
/// Perpendicular offset of the boomerang control point, relative to its leg.
pub const BOOMERANG_BEND: f64 = 0.55;

/// Jitter distance is `leg * JITTER_SCALE * randomness / 10`.
pub const JITTER_SCALE: f64 = 0.15;
/// Extra control points move up to `leg * EXTRA_POINT_SCALE * randomness / 10`.
pub const EXTRA_POINT_SCALE: f64 = 0.20;
/// Randomness above this adds extra control points and shrinks loops.
pub const HIGH_RANDOMNESS: f64 = 5.0;

const ZIGZAG_SEGMENTS: usize = 3;
const ZIGZAG_BASE_OFFSET: f64 = 0.20;
const ZIGZAG_OFFSET_STEP: f64 = 0.10;

/// Curvature and jitter for one leg of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LegStyle {
    /// Bow of the leg as a percentage of its straight-line length.
    pub bend_pct: f64,
    /// 0 (none) to 10 (wild).
    pub randomness: f64,
}

impl LegStyle {
    pub fn new(bend_pct: f64, randomness: f64) -> Self {
        Self {
            bend_pct,
            randomness,
        }
    }

    fn has_control_point(&self) -> bool {
        self.bend_pct > 0.0 || self.randomness > 0.0
    }
}

/// Geometry inputs for one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub start: GeoPoint,
    /// Outbound bearing including any rotation offset.
    pub bearing_deg: f64,
    pub distance_km: f64,
    pub shape: RouteShape,
    pub outbound: LegStyle,
    pub inbound: LegStyle,
}

/// Build the waypoint list for `spec`.
pub fn synthesize<R: Rng>(spec: &ShapeSpec, rng: &mut R) -> WaypointList {
    let ShapeSpec {
        start,
        bearing_deg: bearing,
        distance_km: distance,
        ..
    } = *spec;

    match spec.shape {
        RouteShape::Loop => {
            let randomness = spec.outbound.randomness.max(spec.inbound.randomness);
            let turnaround =
                destination(start, loop_turnaround_km(distance, randomness), bearing);
            bent_legs(start, turnaround, spec.outbound, spec.inbound, rng)
        }
        RouteShape::Square => polygon(start, bearing, distance / 4.0 * SQUARE_FACTOR, 4),
        RouteShape::Triangle => polygon(start, bearing, distance / 3.0 * TRIANGLE_FACTOR, 3),
        RouteShape::Hexagon => polygon(start, bearing, distance / 6.0 * HEXAGON_FACTOR, 6),
        RouteShape::Star => star(start, bearing, distance / 5.0 * STAR_FACTOR),
        RouteShape::Figure8 => {
            let apex_km = distance / 2.0 * FIGURE8_APEX_FACTOR;
            let mut points = figure8(start, bearing, apex_km);
            jitter_interior(&mut points, apex_km, spec, rng);
            points
        }
        RouteShape::Zigzag => {
            let segment_km = distance * ZIGZAG_FACTOR / (2 * ZIGZAG_SEGMENTS) as f64;
            let mut points = zigzag(start, bearing, segment_km);
            jitter_interior(&mut points, segment_km, spec, rng);
            points
        }
        RouteShape::Boomerang => {
            let leg_km = distance / 2.0 * BOOMERANG_FACTOR;
            let mut points = boomerang(start, bearing, leg_km);
            jitter_interior(&mut points, leg_km, spec, rng);
            points
        }
    }
}

/// Out-and-back via a user-chosen turnaround point.
///
/// The turnaround is used verbatim; only the bend/jitter control points move.
pub fn synthesize_custom<R: Rng>(
    start: GeoPoint,
    return_point: GeoPoint,
    outbound: LegStyle,
    inbound: LegStyle,
    rng: &mut R,
) -> WaypointList {
    bent_legs(start, return_point, outbound, inbound, rng)
}

/// Distance from start to the loop turnaround, before bend or jitter.
pub fn loop_turnaround_km(distance_km: f64, randomness: f64) -> f64 {
    distance_km / 2.0 * loop_radius_factor(randomness)
}

fn loop_radius_factor(randomness: f64) -> f64 {
    if randomness > HIGH_RANDOMNESS {
        LOOP_RADIUS_FACTOR - LOOP_HIGH_RANDOMNESS_REDUCTION * (randomness - HIGH_RANDOMNESS)
    } else {
        LOOP_RADIUS_FACTOR
    }
}

/// `[start, extra-out?, A?, turnaround, B?, extra-in?, start]`
fn bent_legs<R: Rng>(
    start: GeoPoint,
    turnaround: GeoPoint,
    outbound: LegStyle,
    inbound: LegStyle,
    rng: &mut R,
) -> WaypointList {
    let leg_km = distance_km(start, turnaround);
    let base = bearing_deg(start, turnaround);
    let mid = midpoint(start, turnaround);

    let mut points = Vec::with_capacity(7);
    points.push(start);

    if outbound.randomness > HIGH_RANDOMNESS {
        points.push(extra_point(start, base, leg_km, 0.25, outbound.randomness, rng));
    }
    if outbound.has_control_point() {
        let bowed = destination(mid, leg_km * outbound.bend_pct / 100.0, base - 90.0);
        points.push(jitter(bowed, leg_km, outbound.randomness, rng));
    }

    points.push(turnaround);

    if inbound.has_control_point() {
        let bowed = destination(mid, leg_km * inbound.bend_pct / 100.0, base + 90.0);
        points.push(jitter(bowed, leg_km, inbound.randomness, rng));
    }
    // 75% of the way home is 25% of the way out along the same axis
    if inbound.randomness > HIGH_RANDOMNESS {
        points.push(extra_point(start, base, leg_km, 0.25, inbound.randomness, rng));
    }

    points.push(start);
    points
}

fn jitter<R: Rng>(point: GeoPoint, leg_km: f64, randomness: f64, rng: &mut R) -> GeoPoint {
    if randomness <= 0.0 || leg_km <= 0.0 {
        return point;
    }
    let distance = leg_km * JITTER_SCALE * randomness / 10.0;
    let bearing = rng.random_range(0.0..360.0);
    destination(point, distance, bearing)
}

fn extra_point<R: Rng>(
    start: GeoPoint,
    base: f64,
    leg_km: f64,
    fraction: f64,
    randomness: f64,
    rng: &mut R,
) -> GeoPoint {
    let anchor = destination(start, leg_km * fraction, base);
    let max_offset = leg_km * EXTRA_POINT_SCALE * randomness / 10.0;
    let offset = rng.random_range(0.0..=max_offset);
    let side = if rng.random_bool(0.5) { 90.0 } else { -90.0 };
    destination(anchor, offset, base + side)
}

/// Jitter every point except the closing start points. The first half of the
/// interior uses the outbound randomness, the second half the inbound one.
fn jitter_interior<R: Rng>(points: &mut [GeoPoint], scale_km: f64, spec: &ShapeSpec, rng: &mut R) {
    let len = points.len();
    if len <= 2 {
        return;
    }
    let interior = len - 2;
    for (offset, point) in points[1..len - 1].iter_mut().enumerate() {
        if point.same_position(&spec.start) {
            continue;
        }
        let randomness = if offset * 2 < interior {
            spec.outbound.randomness
        } else {
            spec.inbound.randomness
        };
        *point = jitter(*point, scale_km, randomness, rng);
    }
}

/// Regular polygon walked clockwise, first edge along `bearing`.
fn polygon(start: GeoPoint, bearing: f64, side_km: f64, sides: usize) -> WaypointList {
    let turn = 360.0 / sides as f64;
    let mut points = Vec::with_capacity(sides + 1);
    points.push(start);
    let mut current = start;
    for edge in 0..sides - 1 {
        current = destination(current, side_km, bearing + turn * edge as f64);
        points.push(current);
    }
    points.push(start);
    points
}

/// Pentagram whose first vertex is the start point.
fn star(start: GeoPoint, bearing: f64, chord_km: f64) -> WaypointList {
    const POINTS: usize = 5;
    const VISIT_ORDER: [usize; POINTS] = [0, 2, 4, 1, 3];

    let radius_km = chord_km / (2.0 * 72f64.to_radians().sin());
    let center = destination(start, radius_km, bearing);
    let back = bearing + 180.0;

    let mut points = Vec::with_capacity(POINTS + 1);
    for vertex in VISIT_ORDER {
        if vertex == 0 {
            points.push(start);
        } else {
            let angle = back + 360.0 / POINTS as f64 * vertex as f64;
            points.push(destination(center, radius_km, angle));
        }
    }
    points.push(start);
    points
}

/// Two diamond lobes crossing at the start, left and right of `bearing`.
fn figure8(start: GeoPoint, bearing: f64, apex_km: f64) -> WaypointList {
    let flank_km = apex_km / std::f64::consts::SQRT_2;
    let left = bearing - 90.0;
    let right = bearing + 90.0;
    vec![
        start,
        destination(start, flank_km, left + 45.0),
        destination(start, apex_km, left),
        destination(start, flank_km, left - 45.0),
        start,
        destination(start, flank_km, right - 45.0),
        destination(start, apex_km, right),
        destination(start, flank_km, right + 45.0),
        start,
    ]
}

/// Three forward segments with widening alternating offsets, back through the
/// mirrored offsets.
fn zigzag(start: GeoPoint, bearing: f64, segment_km: f64) -> WaypointList {
    let offset_at = |step: usize| -> f64 {
        let magnitude = ZIGZAG_BASE_OFFSET + ZIGZAG_OFFSET_STEP * (step - 1) as f64;
        let sign = if step % 2 == 1 { 1.0 } else { -1.0 };
        sign * magnitude * segment_km
    };
    let place = |step: usize, offset_km: f64| -> GeoPoint {
        let anchor = destination(start, segment_km * step as f64, bearing);
        let side = if offset_km >= 0.0 { 90.0 } else { -90.0 };
        destination(anchor, offset_km.abs(), bearing + side)
    };

    let mut points = Vec::with_capacity(2 * ZIGZAG_SEGMENTS + 1);
    points.push(start);
    for step in 1..=ZIGZAG_SEGMENTS {
        points.push(place(step, offset_at(step)));
    }
    for step in (1..ZIGZAG_SEGMENTS).rev() {
        points.push(place(step, -offset_at(step)));
    }
    points.push(start);
    points
}

/// Out-and-back with one strongly bowed outbound leg.
fn boomerang(start: GeoPoint, bearing: f64, leg_km: f64) -> WaypointList {
    let turnaround = destination(start, leg_km, bearing);
    let control = destination(
        midpoint(start, turnaround),
        leg_km * BOOMERANG_BEND,
        bearing + 90.0,
    );
    vec![start, control, turnaround, start]
}
