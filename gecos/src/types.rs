//! types.rs
//! Modelos compartidos por el servicio: registro de punto del CSV, filtros
//! enumerados que llegan desde la UI, metadatos fijos del mapa y configuración

use serde::{Deserialize, Serialize};

use crate::colormap::Colormap;

/// Una fila de `cos.csv`. Las columnas extra del fichero se ignoran.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(rename = "X")]
    pub lon: f64,
    #[serde(rename = "Y")]
    pub lat: f64,
    #[serde(rename = "TARGET DEP")]
    pub target_depth: f64,
    #[serde(rename = "SCORE")]
    pub score: f64,
    #[serde(rename = "COS")]
    pub cos: f64,
}

/// Intervalo cerrado de profundidad objetivo, en metros.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: f64,
    pub max: f64,
}

impl DepthRange {
    pub const SLIDER_MIN: f64 = 0.0;
    pub const SLIDER_MAX: f64 = 4000.0;
    pub const SLIDER_STEP: f64 = 20.0;

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusivo en ambos extremos; con `min > max` no contiene nada.
    #[inline]
    pub fn contains(&self, depth: f64) -> bool {
        self.min <= depth && depth <= self.max
    }

    pub fn contains_range(&self, other: &DepthRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::new(Self::SLIDER_MIN, Self::SLIDER_MAX)
    }
}

/// Tamaño del hexágono en metros (valores del desplegable).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Resolution {
    M300,
    #[default]
    M500,
    M750,
    M1000,
    M2000,
}

impl Resolution {
    pub const ALL: [Resolution; 5] = [
        Resolution::M300,
        Resolution::M500,
        Resolution::M750,
        Resolution::M1000,
        Resolution::M2000,
    ];

    pub fn meters(self) -> u32 {
        match self {
            Resolution::M300 => 300,
            Resolution::M500 => 500,
            Resolution::M750 => 750,
            Resolution::M1000 => 1000,
            Resolution::M2000 => 2000,
        }
    }

    pub fn label(self) -> String {
        format!("{} m", self.meters())
    }
}

impl TryFrom<u32> for Resolution {
    type Error = String;

    fn try_from(m: u32) -> Result<Self, Self::Error> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.meters() == m)
            .ok_or_else(|| format!("resolución no soportada: {m} m (300, 500, 750, 1000, 2000)"))
    }
}

impl From<Resolution> for u32 {
    fn from(r: Resolution) -> u32 {
        r.meters()
    }
}

/// Indicador agregado en cada mapa.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    #[default]
    Density,
    ChanceOfSuccess,
}

impl Indicator {
    pub const ALL: [Indicator; 2] = [Indicator::Density, Indicator::ChanceOfSuccess];

    /// Columna del CSV de la que sale el valor.
    pub fn field(self) -> &'static str {
        match self {
            Indicator::Density => "SCORE",
            Indicator::ChanceOfSuccess => "COS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Density => "Density index",
            Indicator::ChanceOfSuccess => "COS index",
        }
    }

    /// Texto del tooltip de cada celda.
    pub fn hover_label(self) -> &'static str {
        match self {
            Indicator::Density => "Data density index",
            Indicator::ChanceOfSuccess => "COS index",
        }
    }

    #[inline]
    pub fn value(self, p: &PointRecord) -> f64 {
        match self {
            Indicator::Density => p.score,
            Indicator::ChanceOfSuccess => p.cos,
        }
    }
}

/// Función de agregación por celda. Los dos mapas usan `Sum`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    #[default]
    Sum,
    Mean,
    Count,
    Max,
}

/// Parámetros de una petición de mapa (query string de `/map/hex` y `/map/views`).
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct MapQuery {
    #[serde(default)]
    pub indicator: Indicator,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_min_depth")]
    pub min_depth: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: f64,
    #[serde(default)]
    pub colormap: Colormap,
    #[serde(default)]
    pub agg: AggFn,
}

fn default_min_depth() -> f64 { DepthRange::SLIDER_MIN }
fn default_max_depth() -> f64 { DepthRange::SLIDER_MAX }

impl MapQuery {
    pub fn depth(&self) -> DepthRange {
        DepthRange::new(self.min_depth, self.max_depth)
    }
}

impl Default for MapQuery {
    fn default() -> Self {
        Self {
            indicator: Indicator::default(),
            resolution: Resolution::default(),
            min_depth: default_min_depth(),
            max_depth: default_max_depth(),
            colormap: Colormap::default(),
            agg: AggFn::default(),
        }
    }
}

/// Metadatos fijos de render: basemap, opacidad y encuadre sobre la zona de estudio.
#[derive(Clone, Debug, Serialize)]
pub struct MapView {
    pub mapbox_style: String,
    pub opacity: f64,
    pub zoom: f64,
    pub center: [f64; 2], // (lon, lat)
    pub show_scale: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            mapbox_style: "carto-positron".into(),
            opacity: 0.5,
            zoom: 10.5,
            center: [6.13, 46.22],
            show_scale: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppCfg {
    /// Dirección/puerto del servidor HTTP (Axum)
    pub bind: String,
    /// CSV estático con los puntos
    pub csv_path: String,
    /// Directorio de estáticos servido como fallback
    pub web_dir: String,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8050".into(),
            csv_path: "static/cos.csv".into(),
            web_dir: "web".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_only_accepts_dropdown_values() {
        assert_eq!(Resolution::try_from(750), Ok(Resolution::M750));
        assert!(Resolution::try_from(600).is_err());
        assert_eq!(u32::from(Resolution::M2000), 2000);
    }

    #[test]
    fn map_query_defaults_match_initial_controls() {
        let q: MapQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.resolution.meters(), 500);
        assert_eq!(q.indicator, Indicator::Density);
        assert_eq!(q.colormap, Colormap::IceFire);
        assert_eq!(q.depth(), DepthRange::new(0.0, 4000.0));
    }

    #[test]
    fn indicator_names_are_kebab_case() {
        let i: Indicator = serde_json::from_str("\"chance-of-success\"").unwrap();
        assert_eq!(i, Indicator::ChanceOfSuccess);
        assert_eq!(i.field(), "COS");
    }

    #[test]
    fn inverted_range_contains_nothing() {
        let r = DepthRange::new(200.0, 100.0);
        assert!(!r.contains(150.0));
        assert!(!r.contains(100.0));
    }
}
