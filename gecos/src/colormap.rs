//! colormap.rs
//! Rampas de color para pintar las celdas (11 pasos por escala).
//! El motor de agregación no las usa; sólo intervienen al construir el GeoJSON.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Colormap {
    Greys,
    RdBu,
    Viridis,
    Magma,
    Jet,
    #[default]
    IceFire,
}

const GREYS: [&str; 11] = [
    "#ffffff", "#f4f4f4", "#e4e4e4", "#d0d0d0", "#b5b5b5",
    "#969696", "#7a7a7a", "#5f5f5f", "#404040", "#1f1f1f", "#000000",
];
const RDBU: [&str; 11] = [
    "#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7",
    "#f7f7f7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac", "#053061",
];
const VIRIDIS: [&str; 11] = [
    "#440154", "#482475", "#414487", "#355f8d", "#2a788e",
    "#21918c", "#22a884", "#44bf70", "#7ad151", "#bddf26", "#fde725",
];
const MAGMA: [&str; 11] = [
    "#000004", "#140e36", "#3b0f70", "#641a80", "#8c2981",
    "#b73779", "#de4968", "#f7705c", "#fe9f6d", "#fecf92", "#fcfdbf",
];
const JET: [&str; 11] = [
    "#000080", "#0000d5", "#0020ff", "#0080ff", "#00dfff",
    "#4dffaa", "#aaff4d", "#ffe600", "#ff8000", "#ff2200", "#800000",
];
const ICEFIRE: [&str; 11] = [
    "#000000", "#003786", "#217eb8", "#54c8df", "#e1e9d1",
    "#f3d573", "#e7b000", "#c65400", "#ac2301", "#820000", "#4c0000",
];

impl Colormap {
    pub const ALL: [Colormap; 6] = [
        Colormap::Greys,
        Colormap::RdBu,
        Colormap::Viridis,
        Colormap::Magma,
        Colormap::Jet,
        Colormap::IceFire,
    ];

    fn ramp(self) -> &'static [&'static str; 11] {
        match self {
            Colormap::Greys => &GREYS,
            Colormap::RdBu => &RDBU,
            Colormap::Viridis => &VIRIDIS,
            Colormap::Magma => &MAGMA,
            Colormap::Jet => &JET,
            Colormap::IceFire => &ICEFIRE,
        }
    }

    /// Color para un valor normalizado; fuera de [0, 1] se satura.
    pub fn color(self, norm: f64) -> &'static str {
        let r = self.ramp();
        let x = if norm.is_nan() { 0.0 } else { norm.clamp(0.0, 1.0) };
        let i = (x * (r.len() - 1) as f64).floor() as usize;
        r[i]
    }
}
