use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use windloop_core::WindConditions;

use crate::{api, config::Config, state::AppState};

fn test_config() -> Config {
    Config {
        ors_api_key: String::new(),
        fixed_wind: Some(WindConditions {
            direction_deg: 270.0,
            speed_kmh: 20.0,
        }),
        ..Config::default()
    }
}

fn setup_app_with(config: Config) -> axum::Router {
    let state = Arc::new(AppState::new(config).expect("init state"));
    api::app(state)
}

fn setup_app() -> axum::Router {
    setup_app_with(test_config())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_carries_request_id() {
    let app = setup_app();

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "ride-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "ride-42");
}

#[tokio::test]
async fn generate_route_without_credentials_is_demo_mode() {
    let app = setup_app();
    let res = app
        .oneshot(post_json(
            "/api/generate-route",
            json!({
                "startLocation": {"lat": 52.0907, "lng": 5.1214},
                "distance": 50,
                "windStrategy": "headwind_first",
                "shape": "loop",
                "bending": 30,
                "randomness": 2
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    assert_eq!(body["type"], "FeatureCollection");
    let feature = &body["features"][0];
    let coordinates = feature["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(coordinates.first().unwrap(), &json!([5.1214, 52.0907]));
    assert_eq!(coordinates.last().unwrap(), &json!([5.1214, 52.0907]));

    let properties = &feature["properties"];
    assert!(properties["warning"].as_str().unwrap().contains("Demo mode"));
    assert_eq!(properties["wind"]["direction"], 270.0);
    assert_eq!(properties["wind"]["speed"], 20.0);
    assert_eq!(properties["wind"]["strategy"], "headwind_first");
    assert!(properties["summary"]["distance"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn every_shape_renders() {
    let app = setup_app();
    for shape in ["loop", "figure8", "square", "triangle", "hexagon", "star", "zigzag", "boomerang"] {
        let res = app
            .clone()
            .oneshot(post_json(
                "/api/generate-route",
                json!({
                    "startLocation": {"lat": 52.0907, "lng": 5.1214},
                    "distance": 40,
                    "windStrategy": "crosswind",
                    "shape": shape,
                    "randomness": 7
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "shape {shape}");
        let body = read_json(res).await;
        let coordinates = body["features"][0]["geometry"]["coordinates"]
            .as_array()
            .unwrap()
            .len();
        assert!(coordinates >= 4, "shape {shape} has {coordinates} points");
    }
}

#[tokio::test]
async fn return_location_routes_through_it() {
    let app = setup_app();
    let res = app
        .oneshot(post_json(
            "/api/generate-route",
            json!({
                "startLocation": {"lat": 52.0907, "lng": 5.1214},
                "returnLocation": {"lat": 52.15, "lng": 5.2},
                "windStrategy": "custom"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let coordinates = body["features"][0]["geometry"]["coordinates"]
        .as_array()
        .unwrap();
    assert!(coordinates.contains(&json!([5.2, 52.15])));
    assert_eq!(body["features"][0]["properties"]["wind"]["strategy"], "custom");
}

#[tokio::test]
async fn missing_parameters_are_rejected() {
    let app = setup_app();
    let cases = [
        (json!({"distance": 30}), "startLocation"),
        (json!({"startLocation": {"lat": 52.0, "lng": 5.0}}), "distance"),
        (
            json!({"startLocation": {"lat": 52.0, "lng": 5.0}, "distance": -5}),
            "distance",
        ),
        (
            json!({"startLocation": {"lat": 52.0, "lng": 5.0}, "distance": 30, "windStrategy": "custom"}),
            "return point",
        ),
        (
            json!({"startLocation": {"lat": 95.0, "lng": 5.0}, "distance": 30}),
            "start",
        ),
        (
            json!({
                "startLocation": {"lat": 52.0, "lng": 5.0},
                "distance": 30,
                "dateTime": {"date": "next week", "time": "10:00"}
            }),
            "dateTime",
        ),
    ];

    for (body, expected) in cases {
        let res = app
            .clone()
            .oneshot(post_json("/api/generate-route", body.clone()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {body}");
        let error = read_json(res).await["error"].as_str().unwrap().to_string();
        assert!(error.contains(expected), "{error:?} should mention {expected:?}");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = setup_app();
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-route")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(res).await["error"].is_string());
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = setup_app();
    let res = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/generate-route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn wind_failure_is_an_internal_error() {
    let app = setup_app_with(Config {
        fixed_wind: None,
        open_meteo_base_url: "http://127.0.0.1:9".to_string(),
        http_timeout_s: 2,
        ..test_config()
    });
    let res = app
        .oneshot(post_json(
            "/api/generate-route",
            json!({"startLocation": {"lat": 52.0907, "lng": 5.1214}, "distance": 30}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(read_json(res).await["error"]
        .as_str()
        .unwrap()
        .contains("wind"));
}

#[tokio::test]
async fn snap_route_returns_feature_collection() {
    let app = setup_app();
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/snap-route",
            json!({
                "waypoints": [[5.1214, 52.0907], [5.15, 52.1], [5.18, 52.09]],
                "surfacePreference": "unpaved"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let properties = &body["features"][0]["properties"];
    assert!(properties["warning"].as_str().unwrap().contains("Demo mode"));
    assert!(properties.get("wind").is_none());
    assert_eq!(
        body["features"][0]["geometry"]["coordinates"][1],
        json!([5.15, 52.1])
    );

    let res = app
        .oneshot(post_json(
            "/api/snap-route",
            json!({"waypoints": [[5.1214, 52.0907]]}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
