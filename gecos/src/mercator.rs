//! mercator.rs
//!
//! Conversión WGS84 (lat/lon en grados) ↔ mercator esférico (radianes).
//!
//! - Los hexágonos se construyen regulares en el plano mercator, que es
//!   el plano del basemap; en lon/lat saldrían achatados.
//! - `x` es lineal en la longitud, `y` sólo es monótona en la latitud.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

#[inline]
pub fn to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians();
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Devuelve (lon, lat) en grados.
#[inline]
pub fn from_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x.to_degrees();
    let lat = (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn round_trip_near_geneva() {
        let (x, y) = to_mercator(6.13, 46.22);
        let (lon, lat) = from_mercator(x, y);
        assert_abs_diff_eq!(lon, 6.13, epsilon = 1e-12);
        assert_abs_diff_eq!(lat, 46.22, epsilon = 1e-12);
    }

    #[test]
    fn origin_maps_to_origin() {
        let (x, y) = to_mercator(0.0, 0.0);
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn y_grows_with_latitude() {
        let (_, y1) = to_mercator(6.0, 46.0);
        let (_, y2) = to_mercator(6.0, 46.5);
        assert!(y2 > y1);
    }
}
