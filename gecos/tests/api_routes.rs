use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use gecos::api::{router, ApiState};
use gecos::carga::PointStore;
use gecos::types::MapView;

const CSV: &str = "\
X,Y,TARGET DEP,SCORE,COS
6.05,46.15,100,10,0.5
6.10,46.18,300,4,0.25
6.15,46.22,900,6,0.75
6.20,46.26,1500,2,1.0
6.25,46.30,3900,8,0.5
";

fn app() -> Router {
    let store = PointStore::from_reader(CSV.as_bytes()).unwrap();
    router(ApiState { store: Arc::new(store), view: MapView::default() }, "web")
}

async fn get(uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let resp = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let ctype = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, ctype, body)
}

async fn get_json(uri: &str) -> Value {
    let (status, _, body) = get(uri).await;
    assert_eq!(status, StatusCode::OK, "{uri}");
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (status, _, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn dataset_summary() {
    let v = get_json("/dataset").await;
    assert_eq!(v["points"], 5);
    assert_eq!(v["depth_max"], 3900.0);
}

#[tokio::test]
async fn options_list_the_enumerations() {
    let v = get_json("/options").await;
    assert_eq!(v["resolutions"], serde_json::json!([300, 500, 750, 1000, 2000]));
    assert_eq!(v["resolution_labels"][0], "300 m");
    assert_eq!(v["resolution_labels"][4], "2000 m");
    assert_eq!(v["indicators"], serde_json::json!(["density", "chance-of-success"]));
    assert_eq!(v["default_colormap"], "IceFire");
    assert_eq!(v["depth"]["step"], 20.0);
}

#[tokio::test]
async fn hex_map_is_geojson() {
    let (status, ctype, body) = get("/map/hex?resolution=300&colormap=Magma").await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctype.unwrap().starts_with("application/geo+json"));
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["type"], "FeatureCollection");
    assert_eq!(v["points"], 5);
    assert_eq!(v["total"], 30.0);
    assert_eq!(v["colormap"], "Magma");
    assert!(!v["features"].as_array().unwrap().is_empty());
    let hover = v["features"][0]["properties"]["hover"].as_str().unwrap();
    assert!(hover.starts_with("Data density index = "), "{hover}");
}

#[tokio::test]
async fn depth_filter_applies() {
    let v = get_json("/map/hex?indicator=chance-of-success&min_depth=250&max_depth=1500").await;
    assert_eq!(v["points"], 3);
    assert_eq!(v["total"], 2.0);
    assert_eq!(v["label"], "COS index");
}

#[tokio::test]
async fn empty_range_is_not_an_error() {
    let v = get_json("/map/hex?min_depth=5000&max_depth=6000").await;
    assert_eq!(v["points"], 0);
    assert!(v["features"].as_array().unwrap().is_empty());
    assert!(v["columns"].is_null());
}

#[tokio::test]
async fn values_outside_the_enumerations_are_rejected() {
    assert_eq!(get("/map/hex?resolution=600").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(get("/map/hex?indicator=porosity").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(get("/map/hex?colormap=Rainbow").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn views_return_both_maps() {
    let v = get_json("/map/views?resolution=1000").await;
    assert_eq!(v["density"]["total"], 30.0);
    assert_eq!(v["chance_of_success"]["total"], 3.0);
    assert_eq!(v["density"]["columns"], v["chance_of_success"]["columns"]);
}
