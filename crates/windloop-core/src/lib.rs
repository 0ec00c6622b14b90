pub mod cleanup;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod geojson;
pub mod ladder;
pub mod models;
pub mod shapes;
pub mod snap;
pub mod wind;

pub use cleanup::{clean_routed_path, remove_spurs, CleanupReport};
pub use error::{GeoError, RouteError};
pub use gateway::{GatewayFailure, GatewayOutcome, RoutingGateway};
pub use geojson::FeatureCollection;
pub use ladder::{generate_route, AbortSignal, AttemptState, ATTEMPT_SCHEDULE, MAX_ATTEMPTS};
pub use models::{
    AvoidFeature, GeoPoint, RouteAttempt, RouteRequest, RouteResult, RouteShape, RoutedPath,
    RoutingPreferences, SurfacePreference, WaypointList, WindConditions, WindStrategy,
    WindSummary,
};
pub use snap::{snap_route, MAX_GATEWAY_WAYPOINTS};
pub use wind::{outbound_bearing, parse_wind, resolve_heading, Heading};
