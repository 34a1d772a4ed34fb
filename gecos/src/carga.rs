//! carga.rs
//!
//! Carga del dataset estático de puntos (`cos.csv`).
//!
//! - Se lee una sola vez al arrancar; si falta el fichero o una fila está
//!   mal formada se devuelve error y el proceso no arranca.
//! - Después el `PointStore` es inmutable y se comparte con `Arc`.

use std::{fs::File, io::Read, path::Path};

use anyhow::{bail, Context, Result};
use geo::{BoundingRect, MultiPoint, Point};
use serde::Serialize;
use tracing::{info, warn};

use crate::types::{DepthRange, PointRecord};

#[derive(Clone, Debug, Default)]
pub struct PointStore {
    points: Vec<PointRecord>,
}

/// Resumen servido en `/dataset`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub points: usize,
    pub depth_min: Option<f64>,
    pub depth_max: Option<f64>,
    /// [min_lon, min_lat, max_lon, max_lat]
    pub bbox: Option<[f64; 4]>,
    pub mean_lat: Option<f64>,
}

impl PointStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("No se pudo abrir {}", path.display()))?;
        let store = Self::from_reader(file).with_context(|| format!("CSV inválido: {}", path.display()))?;
        info!("Dataset cargado: {} puntos desde {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_reader<R: Read>(raw: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(raw);
        let mut points = Vec::new();
        for (i, rec) in rdr.deserialize::<PointRecord>().enumerate() {
            // +2: cabecera y numeración desde 1
            let row = i + 2;
            let p = rec.with_context(|| format!("fila {row}"))?;
            validate(&p).with_context(|| format!("fila {row}"))?;
            points.push(p);
        }
        if points.is_empty() {
            warn!("El CSV no contiene puntos");
        }
        Ok(Self { points })
    }

    pub fn from_records(points: Vec<PointRecord>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PointRecord] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Copia de los puntos con profundidad dentro de `range`.
    pub fn filter_by_depth(&self, range: DepthRange) -> Vec<PointRecord> {
        filter_by_depth(&self.points, range)
    }

    pub fn summary(&self) -> DatasetSummary {
        let depths = self.points.iter().map(|p| p.target_depth);
        let depth_min = depths.clone().reduce(f64::min);
        let depth_max = depths.reduce(f64::max);

        let mp: MultiPoint<f64> = self.points.iter().map(|p| Point::new(p.lon, p.lat)).collect();
        let bbox = mp
            .bounding_rect()
            .map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]);

        let mean_lat = (!self.points.is_empty())
            .then(|| self.points.iter().map(|p| p.lat).sum::<f64>() / self.points.len() as f64);

        DatasetSummary { points: self.points.len(), depth_min, depth_max, bbox, mean_lat }
    }
}

pub fn filter_by_depth(points: &[PointRecord], range: DepthRange) -> Vec<PointRecord> {
    points.iter().filter(|p| range.contains(p.target_depth)).copied().collect()
}

fn validate(p: &PointRecord) -> Result<()> {
    if !p.lon.is_finite() || !(-180.0..=180.0).contains(&p.lon) {
        bail!("longitud fuera de rango: {}", p.lon);
    }
    if !p.lat.is_finite() || !(-90.0..=90.0).contains(&p.lat) {
        bail!("latitud fuera de rango: {}", p.lat);
    }
    if !p.target_depth.is_finite() || p.target_depth < 0.0 {
        bail!("profundidad inválida: {}", p.target_depth);
    }
    if !p.score.is_finite() || p.score < 0.0 {
        bail!("SCORE inválido: {}", p.score);
    }
    if !p.cos.is_finite() || p.cos < 0.0 {
        bail!("COS inválido: {}", p.cos);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
X,Y,TARGET DEP,SCORE,COS,NAME
6.10,46.20,100,10,0.5,a
6.15,46.22,900,5,0.25,b
6.20,46.25,2500,1,0.75,c
";

    #[test]
    fn parses_named_columns_and_ignores_extras() {
        let store = PointStore::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.points()[1].target_depth, 900.0);
        assert_eq!(store.points()[2].cos, 0.75);
    }

    #[test]
    fn missing_column_is_an_error() {
        let raw = "X,Y,SCORE,COS\n6.1,46.2,1,1\n";
        assert!(PointStore::from_reader(raw.as_bytes()).is_err());
    }

    #[test]
    fn negative_depth_is_rejected_with_row_number() {
        let raw = "X,Y,TARGET DEP,SCORE,COS\n6.1,46.2,10,1,1\n6.1,46.2,-5,1,1\n";
        let err = PointStore::from_reader(raw.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("fila 3"));
    }

    #[test]
    fn missing_file_fails() {
        assert!(PointStore::load("/nonexistent/cos.csv").is_err());
    }

    #[test]
    fn filter_is_inclusive_on_both_ends() {
        let store = PointStore::from_reader(CSV.as_bytes()).unwrap();
        let f = store.filter_by_depth(DepthRange::new(100.0, 900.0));
        assert_eq!(f.len(), 2);
        assert!(store.filter_by_depth(DepthRange::new(5000.0, 6000.0)).is_empty());
    }

    #[test]
    fn summary_reports_extent() {
        let s = PointStore::from_reader(CSV.as_bytes()).unwrap().summary();
        assert_eq!(s.points, 3);
        assert_eq!(s.depth_min, Some(100.0));
        assert_eq!(s.depth_max, Some(2500.0));
        assert_eq!(s.bbox, Some([6.10, 46.20, 6.20, 46.25]));
        assert!(PointStore::default().summary().bbox.is_none());
    }
}
