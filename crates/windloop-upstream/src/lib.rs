//! windloop upstream clients
//!
//! Road snapping through openrouteservice and wind forecasts from Open-Meteo.

pub mod directions;
pub mod weather;

pub use directions::OrsClient;
pub use weather::{ForecastDay, OpenMeteoClient, WindTime};
