//! grid.rs
//!
//! Malla hexagonal y agregación de puntos por celda.
//!
//! Funcionalidad principal:
//! - `compute_column_count()`: nº de columnas de hexágonos a partir de la
//!   extensión en longitud de los puntos filtrados y la resolución en metros.
//! - `hexbin_aggregate()`: ajusta una malla de dos retículas desplazadas sobre
//!   el bbox (en mercator), asigna cada punto al centro más cercano y agrega el
//!   indicador elegido. Sólo se emiten celdas con datos.
//! - `recompute()` / `recompute_views()`: filtro de profundidad + lo anterior,
//!   una vez por indicador.
//! - `to_geojson()`: FeatureCollection coloreada para el front.
//!
//! Todo es puro: mismas entradas, mismas celdas.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{SecondsFormat, Utc};
use geo::{Coord, LineString, Point, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::carga::PointStore;
use crate::colormap::Colormap;
use crate::mercator::{from_mercator, to_mercator};
use crate::types::{AggFn, Indicator, MapQuery, MapView, PointRecord, Resolution};

/// Radio medio terrestre (m) para el tamaño de hexágono.
pub const EARTH_RADIUS_M: f64 = 6.371e6;

/// Vértices del hexágono unidad, en unidades de (dx, dy/3).
const HEX_UNIT: [(f64, f64); 6] = [
    (0.5, -0.5),
    (0.5, 0.5),
    (0.0, 1.0),
    (-0.5, 0.5),
    (-0.5, -0.5),
    (0.0, -1.0),
];

// -------------------------------
// Tamaño de la malla
// -------------------------------

/// Fórmula tal cual la calibra el mapa:
/// `-1 * (Δlon / res * π/180 * R * cos(lat_media))`.
/// El coseno recibe el valor de la latitud media sin convertir; en la zona de
/// estudio (~46.2) sale negativo y el `-1` lo devuelve a positivo.
#[inline]
pub fn column_count_raw(lon_extent: f64, mean_lat: f64, resolution_m: f64) -> f64 {
    -1.0 * (lon_extent / resolution_m * PI / 180.0 * EARTH_RADIUS_M * mean_lat.cos())
}

/// Nº de columnas para los puntos ya filtrados.
///
/// `None` si no hay puntos, la extensión en longitud es nula o el resultado no
/// es finito. Un resultado finito por debajo de 1 se satura a 1.
pub fn compute_column_count(points: &[PointRecord], resolution_m: f64) -> Option<u32> {
    if points.is_empty() || !(resolution_m > 0.0) {
        return None;
    }
    let (lon_min, lon_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.lon), hi.max(p.lon)));
    let extent = lon_max - lon_min;
    if !(extent > 0.0) {
        return None;
    }
    let mean_lat = points.iter().map(|p| p.lat).sum::<f64>() / points.len() as f64;

    let n = column_count_raw(extent, mean_lat, resolution_m).floor();
    if !n.is_finite() {
        return None;
    }
    if n < 1.0 {
        warn!("nº de columnas no positivo ({n}) para lat media {mean_lat:.3}; se usa 1");
        return Some(1);
    }
    Some(n.min(u32::MAX as f64) as u32)
}

// -------------------------------
// Retícula hexagonal
// -------------------------------

/// Celda de la malla: retícula principal (centros en enteros) o desplazada
/// (centros en +0.5, +0.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellKey {
    Primary(usize, usize),
    Offset(usize, usize),
}

impl CellKey {
    pub fn id(&self) -> String {
        match self {
            CellKey::Primary(i, j) => format!("p{i}_{j}"),
            CellKey::Offset(i, j) => format!("o{i}_{j}"),
        }
    }
}

/// Malla ajustada a un bbox en coordenadas mercator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexLattice {
    pub xmin: f64,
    pub ymin: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

impl HexLattice {
    /// `columns` hexágonos cubren exactamente [xmin, xmax] (con un margen de
    /// 1e-9 de la extensión); las filas se centran en vertical.
    pub fn fit(xmin: f64, xmax: f64, ymin: f64, ymax: f64, columns: u32) -> Self {
        let nx = columns.max(1) as usize;
        let padding = 1.0e-9 * (xmax - xmin);
        let xmin = xmin - padding;
        let xmax = xmax + padding;
        let span_x = xmax - xmin;
        let span_y = ymax - ymin;

        let dx = if span_x > 0.0 {
            span_x / nx as f64
        } else if span_y > 0.0 {
            span_y / nx as f64
        } else {
            // todos los puntos en el mismo sitio: hexágono de 1 grado
            1f64.to_radians()
        };
        let dy = dx * 3f64.sqrt();
        let ny = (span_y / dy).ceil() as usize;
        let ymin = ymin - (ymin + dy * ny as f64 - ymax) / 2.0;

        Self { xmin, ymin, dx, dy, nx, ny }
    }

    /// Celda que contiene el punto (x, y) en mercator.
    pub fn locate(&self, x: f64, y: f64) -> Option<CellKey> {
        let x = (x - self.xmin) / self.dx;
        let y = (y - self.ymin) / self.dy;

        let ix1 = x.round_ties_even();
        let iy1 = y.round_ties_even();
        let ix2 = x.floor();
        let iy2 = y.floor();

        let d1 = (x - ix1).powi(2) + 3.0 * (y - iy1).powi(2);
        let d2 = (x - ix2 - 0.5).powi(2) + 3.0 * (y - iy2 - 0.5).powi(2);

        if d1 < d2 {
            in_bounds(ix1, iy1, self.nx + 1, self.ny + 1).map(|(i, j)| CellKey::Primary(i, j))
        } else {
            in_bounds(ix2, iy2, self.nx, self.ny).map(|(i, j)| CellKey::Offset(i, j))
        }
    }

    /// Centro de la celda en mercator.
    pub fn center(&self, key: CellKey) -> (f64, f64) {
        let (cx, cy) = match key {
            CellKey::Primary(i, j) => (i as f64, j as f64),
            CellKey::Offset(i, j) => (i as f64 + 0.5, j as f64 + 0.5),
        };
        (self.xmin + cx * self.dx, self.ymin + cy * self.dy)
    }

    /// Anillo cerrado del hexágono en (lon, lat).
    pub fn polygon(&self, key: CellKey) -> Polygon<f64> {
        let (cx, cy) = self.center(key);
        let mut ring: Vec<Coord<f64>> = HEX_UNIT
            .iter()
            .map(|(ux, uy)| {
                let (lon, lat) = from_mercator(cx + ux * self.dx, cy + uy * self.dy / 3.0);
                Coord { x: lon, y: lat }
            })
            .collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        Polygon::new(LineString::new(ring), vec![])
    }
}

#[inline]
fn in_bounds(i: f64, j: f64, ni: usize, nj: usize) -> Option<(usize, usize)> {
    if i < 0.0 || j < 0.0 {
        return None;
    }
    let (i, j) = (i as usize, j as usize);
    (i < ni && j < nj).then_some((i, j))
}

// -------------------------------
// Agregación
// -------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexbinOpts {
    pub agg: AggFn,
    /// Celdas con menos puntos no se emiten (mínimo efectivo 1).
    pub min_count: usize,
}

impl Default for HexbinOpts {
    fn default() -> Self {
        Self { agg: AggFn::Sum, min_count: 1 }
    }
}

#[derive(Clone, Debug)]
pub struct HexCell {
    pub key: CellKey,
    pub center: Point<f64>, // (lon, lat)
    pub poly: Polygon<f64>,
    pub value: f64,
    pub count: usize,
}

#[derive(Clone, Copy, Debug)]
struct Acc {
    sum: f64,
    max: f64,
    count: usize,
}

impl Acc {
    fn new() -> Self {
        Self { sum: 0.0, max: f64::NEG_INFINITY, count: 0 }
    }

    fn push(&mut self, v: f64) {
        self.sum += v;
        self.max = self.max.max(v);
        self.count += 1;
    }

    fn finish(&self, agg: AggFn) -> f64 {
        match agg {
            AggFn::Sum => self.sum,
            AggFn::Mean => self.sum / self.count as f64,
            AggFn::Count => self.count as f64,
            AggFn::Max => self.max,
        }
    }
}

/// Malla ajustada al bbox (mercator) de los puntos. `None` sin puntos.
pub fn lattice_for(points: &[PointRecord], columns: u32) -> Option<HexLattice> {
    if points.is_empty() {
        return None;
    }
    let (mut xmin, mut xmax) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut ymin, mut ymax) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        let (x, y) = to_mercator(p.lon, p.lat);
        xmin = xmin.min(x);
        xmax = xmax.max(x);
        ymin = ymin.min(y);
        ymax = ymax.max(y);
    }
    Some(HexLattice::fit(xmin, xmax, ymin, ymax, columns))
}

/// Agrega `indicator` por hexágono. Salida ordenada por celda.
pub fn hexbin_aggregate(
    points: &[PointRecord],
    columns: u32,
    indicator: Indicator,
    opts: HexbinOpts,
) -> Vec<HexCell> {
    if columns == 0 {
        return Vec::new();
    }
    let Some(lattice) = lattice_for(points, columns) else {
        return Vec::new();
    };

    let mut acc: BTreeMap<CellKey, Acc> = BTreeMap::new();
    let mut dropped = 0usize;
    for p in points {
        let (x, y) = to_mercator(p.lon, p.lat);
        match lattice.locate(x, y) {
            Some(key) => acc.entry(key).or_insert_with(Acc::new).push(indicator.value(p)),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("{dropped} puntos fuera de la malla");
    }

    let min_count = opts.min_count.max(1);
    acc.into_iter()
        .filter(|(_, a)| a.count >= min_count)
        .map(|(key, a)| {
            let (cx, cy) = lattice.center(key);
            let (lon, lat) = from_mercator(cx, cy);
            HexCell {
                key,
                center: Point::new(lon, lat),
                poly: lattice.polygon(key),
                value: a.finish(opts.agg),
                count: a.count,
            }
        })
        .collect()
}

// -------------------------------
// Orquestador
// -------------------------------

#[derive(Clone, Debug)]
pub struct HexMap {
    pub indicator: Indicator,
    pub resolution: Resolution,
    pub agg: AggFn,
    /// `None` si no hay datos o la extensión en longitud es nula
    pub columns: Option<u32>,
    pub n_points: usize,
    pub cells: Vec<HexCell>,
}

impl HexMap {
    pub fn total(&self) -> f64 {
        self.cells.iter().map(|c| c.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Agrega un indicador sobre una tabla ya filtrada.
pub fn aggregate_filtered(
    filtered: &[PointRecord],
    indicator: Indicator,
    resolution: Resolution,
    agg: AggFn,
) -> HexMap {
    let mut out = HexMap {
        indicator,
        resolution,
        agg,
        columns: None,
        n_points: filtered.len(),
        cells: Vec::new(),
    };
    if filtered.is_empty() {
        info!("{}: sin datos en el rango de profundidad", indicator.field());
        return out;
    }

    let opts = HexbinOpts { agg, ..HexbinOpts::default() };
    out.columns = compute_column_count(filtered, resolution.meters() as f64);
    out.cells = match out.columns {
        Some(nx) => hexbin_aggregate(filtered, nx, indicator, opts),
        None => {
            debug!("{}: extensión en longitud nula, una sola columna", indicator.field());
            hexbin_aggregate(filtered, 1, indicator, opts)
        }
    };
    debug!(
        "{}: {} puntos -> {} celdas (columnas={:?}, res={} m)",
        indicator.field(),
        out.n_points,
        out.cells.len(),
        out.columns,
        resolution.meters()
    );
    out
}

pub fn recompute(store: &PointStore, q: &MapQuery) -> HexMap {
    let filtered = store.filter_by_depth(q.depth());
    aggregate_filtered(&filtered, q.indicator, q.resolution, q.agg)
}

/// Los dos mapas (densidad y COS) sobre el mismo subconjunto filtrado.
/// Se ignora `q.indicator`.
pub fn recompute_views(store: &PointStore, q: &MapQuery) -> [HexMap; 2] {
    let filtered = store.filter_by_depth(q.depth());
    Indicator::ALL.map(|ind| aggregate_filtered(&filtered, ind, q.resolution, q.agg))
}

// -------------------------------
// GeoJSON para UI
// -------------------------------

pub fn to_geojson(map: &HexMap, colormap: Colormap, view: &MapView) -> FeatureCollection {
    let (vmin, vmax) = map
        .cells
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c.value), hi.max(c.value)));
    let label = map.indicator.label();
    let hover = map.indicator.hover_label();

    let features = map
        .cells
        .iter()
        .map(|c| {
            let norm = if vmax > vmin { (c.value - vmin) / (vmax - vmin) } else { 1.0 };
            let col = colormap.color(norm);
            let mut props = JsonObject::new();
            props.insert("id".into(), json!(c.key.id()));
            props.insert("value".into(), json!(c.value));
            props.insert("count".into(), json!(c.count));
            props.insert("center".into(), json!([c.center.x(), c.center.y()]));
            props.insert("hover".into(), json!(format!("{hover} = {:.0}", c.value)));
            props.insert(
                "style".into(),
                json!({
                    "fill": true, "fill-color": col, "fill-opacity": view.opacity,
                    "stroke": col, "stroke-width": 1, "stroke-opacity": 1.0
                }),
            );
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&c.poly))),
                id: None,
                properties: Some(props),
                foreign_members: None,
            }
        })
        .collect();

    let mut meta = JsonObject::new();
    meta.insert("name".into(), json!(format!("hex_{}", map.indicator.field().to_lowercase())));
    meta.insert("crs".into(), json!({ "type": "name", "properties": { "name": "EPSG:4326" } }));
    meta.insert("indicator".into(), json!(map.indicator));
    meta.insert("label".into(), json!(label));
    meta.insert("resolution_m".into(), json!(map.resolution.meters()));
    meta.insert("agg".into(), json!(map.agg));
    meta.insert("columns".into(), json!(map.columns));
    meta.insert("points".into(), json!(map.n_points));
    meta.insert("total".into(), json!(map.total()));
    meta.insert("colormap".into(), json!(colormap));
    meta.insert("view".into(), json!(view));
    meta.insert("ts_utc".into(), json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)));

    FeatureCollection { bbox: None, features, foreign_members: Some(meta) }
}
