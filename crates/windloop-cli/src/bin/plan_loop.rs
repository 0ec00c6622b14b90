//! Plan a single wind-aware route and print it as GeoJSON.
//!
//! Usage:
//!   cargo run -p windloop-cli --bin plan_loop -- --start 52.0907,5.1214 --distance 50
//!
//! Without `--wind` the current forecast is fetched from Open-Meteo. Without
//! an openrouteservice key the route is a straight-line sketch.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use windloop_cli::{parse_fixed_wind, parse_keyword, parse_point};
use windloop_core::{
    generate_route, AbortSignal, AvoidFeature, GeoPoint, RouteRequest, RouteShape,
    RoutingPreferences, SurfacePreference, WindConditions, WindStrategy,
};
use windloop_upstream::{directions, weather, OpenMeteoClient, OrsClient, WindTime};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a wind-aware cycling route")]
struct Args {
    /// Start as LAT,LON
    #[arg(long, value_parser = parse_point)]
    start: GeoPoint,

    /// Target distance in km (ignored with --return-to)
    #[arg(long, default_value_t = 50.0)]
    distance: f64,

    /// headwind_first, tailwind_first or crosswind
    #[arg(long, default_value = "headwind_first", value_parser = parse_keyword::<WindStrategy>)]
    strategy: WindStrategy,

    /// loop, figure8, square, triangle, hexagon, star, zigzag or boomerang
    #[arg(long, default_value = "loop", value_parser = parse_keyword::<RouteShape>)]
    shape: RouteShape,

    /// Turnaround as LAT,LON; makes an out-and-back via that point
    #[arg(long, value_parser = parse_point)]
    return_to: Option<GeoPoint>,

    /// Bend of both legs, 0-100 %
    #[arg(long, default_value_t = 0.0)]
    bend: f64,

    /// Randomness of both legs, 0-10
    #[arg(long, default_value_t = 0.0)]
    randomness: f64,

    /// paved, unpaved or mixed
    #[arg(long, default_value = "mixed", value_parser = parse_keyword::<SurfacePreference>)]
    surface: SurfacePreference,

    /// Feature to avoid; repeatable
    #[arg(long, value_parser = parse_keyword::<AvoidFeature>)]
    avoid: Vec<AvoidFeature>,

    #[arg(long)]
    maximize_elevation: bool,

    /// Fixed wind as DIR@KMH instead of a forecast lookup
    #[arg(long, value_parser = parse_fixed_wind)]
    wind: Option<WindConditions>,

    /// Forecast day, today or tomorrow
    #[arg(long, requires = "time")]
    date: Option<String>,

    /// Forecast time, HH:MM
    #[arg(long, requires = "date")]
    time: Option<String>,

    /// Seed for reproducible shapes
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, env = "ORS_API_KEY", default_value = "", hide_env_values = true)]
    ors_api_key: String,

    #[arg(long, env = "ORS_BASE_URL", default_value = directions::DEFAULT_BASE_URL)]
    ors_base_url: String,

    #[arg(long, env = "OPEN_METEO_BASE_URL", default_value = weather::DEFAULT_BASE_URL)]
    open_meteo_base_url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("windloop_core=info".parse()?))
        .init();

    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout.max(1));

    let preferences = RoutingPreferences {
        surface: args.surface,
        avoid_features: args.avoid.clone(),
        maximize_elevation: args.maximize_elevation,
    };
    let request = match args.return_to {
        Some(point) => RouteRequest::with_return_point(args.start, point)?,
        None => RouteRequest::new(args.start, args.distance, args.strategy, args.shape)?,
    }
    .bend(args.bend, args.bend)
    .randomness(args.randomness, args.randomness)
    .preferences(preferences);

    let wind = match args.wind {
        Some(wind) => wind,
        None => {
            let when = match (&args.date, &args.time) {
                (Some(date), Some(time)) => Some(WindTime::parse(date, time)?),
                _ => None,
            };
            OpenMeteoClient::new(args.open_meteo_base_url.clone(), timeout)?
                .wind_at(args.start, when)
                .await
                .context("Failed to look up wind")?
        }
    };
    eprintln!(
        "Wind from {:.0}° at {:.1} km/h",
        wind.direction_deg, wind.speed_kmh
    );

    let gateway = OrsClient::new(args.ors_base_url.clone(), args.ors_api_key.clone(), timeout)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let result = generate_route(&gateway, &request, wind, &mut rng, &AbortSignal::new()).await?;

    if let Some(warning) = &result.warning {
        eprintln!("Warning: {}", warning);
    }
    eprintln!(
        "{:.1} km, about {:.0} min, {} attempt(s)",
        result.distance_m / 1000.0,
        result.duration_s / 60.0,
        result.attempts
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&result.to_feature_collection())?
    );

    Ok(())
}
