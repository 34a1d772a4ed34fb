//! main.rs — carga el CSV una vez y sirve los mapas hexbin por HTTP

use std::{env, sync::Arc};

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gecos::{api, carga::PointStore, types::{AppCfg, MapView}};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app_cfg = app_cfg_from_env();

    // Sin dataset no hay nada que servir: fallo inmediato
    info!("Cargando dataset: {}", app_cfg.csv_path);
    let store = PointStore::load(&app_cfg.csv_path).context("carga inicial del dataset")?;

    let state = api::ApiState { store: Arc::new(store), view: MapView::default() };
    let app = api::router(state, &app_cfg.web_dir);

    info!("Escuchando en http://{}", app_cfg.bind);
    let listener = tokio::net::TcpListener::bind(&app_cfg.bind).await?;
    let serve = axum::serve(listener, app);
    tokio::select! {
        r = serve => { r?; },
        _ = signal::ctrl_c() => { info!("Señal de salida recibida"); }
    }

    Ok(())
}

fn app_cfg_from_env() -> AppCfg {
    let mut c = AppCfg::default();
    if let Ok(v) = env::var("BIND") { c.bind = v; }
    if let Ok(v) = env::var("COS_CSV_PATH") { c.csv_path = v; }
    if let Ok(v) = env::var("WEB_DIR") { c.web_dir = v; }
    c
}
