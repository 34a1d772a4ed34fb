//! GECOS: mapas hexbin de densidad de datos y chance of success (COS)
//! sobre un dataset estático de puntos de subsuelo.

pub mod api;
pub mod carga;
pub mod colormap;
pub mod grid;
pub mod mercator;
pub mod types;
