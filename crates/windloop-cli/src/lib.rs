//! Argument parsing shared by the windloop command line tools.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use windloop_core::{parse_wind, GeoPoint, WindConditions};

/// Parse a snake_case/lowercase enum value the way the HTTP API spells it.
pub fn parse_keyword<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_ascii_lowercase()))
        .map_err(|_| anyhow!("unknown value {:?}", value))
}

/// Parse `LAT,LON`.
pub fn parse_point(value: &str) -> Result<GeoPoint> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("expected LAT,LON, got {:?}", value))?;
    let point = GeoPoint::new(lat.trim().parse()?, lon.trim().parse()?);
    if !point.is_valid() {
        return Err(anyhow!("coordinate out of range: {:?}", value));
    }
    Ok(point)
}

/// Parse `DIR@KMH`.
pub fn parse_fixed_wind(value: &str) -> Result<WindConditions> {
    parse_wind(value).ok_or_else(|| anyhow!("expected DIR@KMH, got {:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use windloop_core::{AvoidFeature, RouteShape, WindStrategy};

    #[test]
    fn keywords_follow_api_spelling() {
        assert_eq!(parse_keyword::<WindStrategy>("Headwind").unwrap(), WindStrategy::HeadwindFirst);
        assert_eq!(parse_keyword::<RouteShape>("figure-8").unwrap(), RouteShape::Figure8);
        assert_eq!(parse_keyword::<AvoidFeature>("ferries").unwrap(), AvoidFeature::Ferries);
        assert!(parse_keyword::<RouteShape>("circle").is_err());
    }

    #[test]
    fn points_are_lat_lon() {
        let point = parse_point("52.0907, 5.1214").unwrap();
        assert_eq!(point.lat, 52.0907);
        assert_eq!(point.lon, 5.1214);
        assert!(parse_point("52.0907").is_err());
        assert!(parse_point("152,5").is_err());
    }

    #[test]
    fn wind_needs_direction_and_speed() {
        assert_eq!(parse_fixed_wind("90@12").unwrap().direction_deg, 90.0);
        assert!(parse_fixed_wind("90").is_err());
    }
}
