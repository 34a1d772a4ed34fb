//! api.rs — Rutas HTTP: /health, /dataset, /options, /map/hex y /map/views

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir};

use crate::carga::{DatasetSummary, PointStore};
use crate::colormap::Colormap;
use crate::grid;
use crate::types::{DepthRange, Indicator, MapQuery, MapView, Resolution};

/// El dataset es inmutable: se comparte sin lock.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<PointStore>,
    pub view: MapView,
}

pub fn router(state: ApiState, web_dir: &str) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/dataset", get(dataset))
        .route("/options", get(options))
        .route("/map/hex", get(map_hex))
        .route("/map/views", get(map_views))
        .fallback_service(ServeDir::new(web_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

async fn dataset(State(st): State<ApiState>) -> Json<DatasetSummary> {
    Json(st.store.summary())
}

/// Valores permitidos en los controles de la UI.
#[derive(Serialize)]
struct Options {
    resolutions: Vec<u32>,
    resolution_labels: Vec<String>,
    default_resolution: u32,
    indicators: Vec<Indicator>,
    colormaps: Vec<Colormap>,
    default_colormap: Colormap,
    depth: DepthSlider,
}

#[derive(Serialize)]
struct DepthSlider {
    min: f64,
    max: f64,
    step: f64,
    value: [f64; 2],
}

async fn options() -> Json<Options> {
    Json(Options {
        resolutions: Resolution::ALL.iter().map(|r| r.meters()).collect(),
        resolution_labels: Resolution::ALL.iter().map(|r| r.label()).collect(),
        default_resolution: Resolution::default().meters(),
        indicators: Indicator::ALL.to_vec(),
        colormaps: Colormap::ALL.to_vec(),
        default_colormap: Colormap::default(),
        depth: DepthSlider {
            min: DepthRange::SLIDER_MIN,
            max: DepthRange::SLIDER_MAX,
            step: DepthRange::SLIDER_STEP,
            value: [DepthRange::SLIDER_MIN, DepthRange::SLIDER_MAX],
        },
    })
}

/// Un mapa (indicador de la query) como GeoJSON.
async fn map_hex(State(st): State<ApiState>, Query(q): Query<MapQuery>) -> impl IntoResponse {
    let map = grid::recompute(&st.store, &q);
    let fc = grid::to_geojson(&map, q.colormap, &st.view);
    ([(CONTENT_TYPE, "application/geo+json; charset=utf-8")], fc.to_string())
}

/// Los dos mapas sobre el mismo filtro.
async fn map_views(State(st): State<ApiState>, Query(q): Query<MapQuery>) -> Json<serde_json::Value> {
    let [density, cos] = grid::recompute_views(&st.store, &q);
    Json(json!({
        "density": grid::to_geojson(&density, q.colormap, &st.view),
        "chance_of_success": grid::to_geojson(&cos, q.colormap, &st.view),
    }))
}
