//! Error types for route generation.

use thiserror::Error;

/// Failures of the pure geometry layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("path is empty")]
    EmptyPath,

    #[error("distance {requested_km:.3} km exceeds path length {length_km:.3} km")]
    BeyondPath { requested_km: f64, length_km: f64 },

    #[error("non-finite coordinate at index {0}")]
    NonFinite(usize),
}

/// Failures that abort a route request before or during the ladder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("target distance must be positive, got {0}")]
    InvalidDistance(f64),

    #[error("invalid {0} coordinate")]
    InvalidPoint(String),

    #[error("custom wind strategy needs a return point")]
    MissingReturnPoint,

    #[error("need at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("route generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Geometry(#[from] GeoError),
}
