//! gen_cos.rs
//! Genera un `static/cos.csv` sintético alrededor de Ginebra para pruebas locales.
//! Columnas: X,Y,TARGET DEP,SCORE,COS
//! Uso: cargo run --bin gen_cos [n_puntos]

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fs;

// lon_min, lat_min, lon_max, lat_max (cuenca ginebrina aprox)
const BBOX: (f64, f64, f64, f64) = (5.95, 46.12, 6.31, 46.36);
const OUT_CSV: &str = "static/cos.csv";

fn main() -> Result<()> {
    let n: usize = std::env::args()
        .nth(1)
        .map(|s| s.parse().context("n_puntos debe ser un entero"))
        .transpose()?
        .unwrap_or(5000);

    // semilla fija: mismo CSV en cada ejecución
    let mut rng = StdRng::seed_from_u64(46_22);

    fs::create_dir_all("static").context("No se pudo crear static/")?;
    let mut w = csv::Writer::from_path(OUT_CSV).context("No se pudo crear el CSV de salida")?;
    w.write_record(["X", "Y", "TARGET DEP", "SCORE", "COS"])?;

    let (x0, y0, x1, y1) = BBOX;
    for _ in 0..n {
        let lon = rng.random_range(x0..x1);
        let lat = rng.random_range(y0..y1);
        // profundidad en pasos de 20 m, como el slider
        let depth = (rng.random_range(0..=200u32) * 20) as f64;
        // más datos hacia el centro de la cuenca, COS decrece con la profundidad
        let d_center = ((lon - 6.13).powi(2) + (lat - 46.22).powi(2)).sqrt();
        let score = (10.0 * (-d_center * 12.0).exp() + rng.random_range(0.0..2.0)).max(0.0);
        let cos = ((1.0 - depth / 4000.0) * rng.random_range(0.2..1.0)).clamp(0.0, 1.0);
        w.write_record(&[
            format!("{lon:.6}"),
            format!("{lat:.6}"),
            format!("{depth:.0}"),
            format!("{score:.3}"),
            format!("{cos:.3}"),
        ])?;
    }
    w.flush()?;
    println!("OK -> {OUT_CSV} ({n} puntos)");
    Ok(())
}
