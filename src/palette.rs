// src/palette.rs
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::SignalKind;

/// Plain RGB triple. Converted to the egui / plotters colour types at the edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Colours handed to every transform and renderer at construction time.
#[derive(Clone, Debug)]
pub struct Palette {
    pub background: Rgb,
    pub foreground: Rgb,
    pub accent: Rgb,
    pub channels: Vec<Rgb>,
    pub density_stops: Vec<Rgb>,
}

impl Palette {
    pub fn for_kind(kind: SignalKind) -> &'static Palette {
        match kind {
            SignalKind::Ecg => &ECG_PALETTE,
            SignalKind::Eeg => &EEG_PALETTE,
            SignalKind::Generic => &GENERIC_PALETTE,
        }
    }

    pub fn channel_color(&self, index: usize) -> Rgb {
        if self.channels.is_empty() {
            return self.foreground;
        }
        self.channels[index % self.channels.len()]
    }
}

// Density stops run from dark to hot; the first stop must stay distinguishable
// from the background so single hits are still visible.
const DENSITY_STOPS: [Rgb; 5] = [
    Rgb(30, 40, 110),
    Rgb(20, 140, 180),
    Rgb(80, 200, 100),
    Rgb(250, 210, 50),
    Rgb(240, 60, 40),
];

static ECG_PALETTE: Lazy<Palette> = Lazy::new(|| Palette {
    background: Rgb(10, 10, 15),
    foreground: Rgb(220, 220, 220),
    accent: Rgb(255, 80, 80),
    channels: vec![
        Rgb(0, 255, 160),
        Rgb(255, 95, 95),
        Rgb(90, 160, 255),
        Rgb(255, 200, 60),
        Rgb(200, 120, 255),
        Rgb(0, 220, 255),
        Rgb(255, 140, 0),
        Rgb(160, 255, 90),
        Rgb(255, 110, 200),
        Rgb(140, 140, 255),
        Rgb(255, 255, 140),
        Rgb(120, 255, 220),
    ],
    density_stops: DENSITY_STOPS.to_vec(),
});

static EEG_PALETTE: Lazy<Palette> = Lazy::new(|| Palette {
    background: Rgb(10, 10, 15),
    foreground: Rgb(220, 220, 220),
    accent: Rgb(0, 255, 255),
    channels: vec![
        Rgb(0x5b, 0x8f, 0xff),
        Rgb(0xff, 0x8c, 0x42),
        Rgb(0x54, 0xc7, 0x6b),
        Rgb(0xd1, 0x5b, 0xff),
        Rgb(0xff, 0xd1, 0x4a),
        Rgb(0x4a, 0xe0, 0xe0),
        Rgb(0xff, 0x5b, 0x7a),
        Rgb(0xa0, 0xa0, 0xff),
    ],
    density_stops: DENSITY_STOPS.to_vec(),
});

static GENERIC_PALETTE: Lazy<Palette> = Lazy::new(|| Palette {
    background: Rgb(10, 10, 10),
    foreground: Rgb(230, 230, 230),
    accent: Rgb(255, 255, 0),
    channels: vec![
        Rgb(0, 0, 255),
        Rgb(255, 0, 0),
        Rgb(0, 255, 0),
        Rgb(0, 255, 255),
        Rgb(255, 0, 255),
        Rgb(255, 255, 0),
        Rgb(255, 255, 255),
    ],
    density_stops: DENSITY_STOPS.to_vec(),
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DensityScale {
    Linear,
    #[default]
    Log,
}

/// Maps a density cell count to a colour, normalised against a fixed maximum.
#[derive(Clone, Debug)]
pub struct DensityColorMap {
    stops: Vec<Rgb>,
    scale: DensityScale,
}

impl DensityColorMap {
    pub fn new(palette: &Palette, scale: DensityScale) -> Self {
        let mut stops = palette.density_stops.clone();
        if stops.is_empty() {
            stops.push(palette.foreground);
        }
        Self { stops, scale }
    }

    /// Compressed intensity in `[0, 1]`.
    pub fn intensity(&self, count: u32, max_count: u32) -> f64 {
        if count == 0 || max_count == 0 {
            return 0.0;
        }
        let norm = (count as f64 / max_count as f64).min(1.0);
        match self.scale {
            DensityScale::Linear => norm,
            DensityScale::Log => (1.0 + 9.0 * norm).ln() / 10f64.ln(),
        }
    }

    /// `None` for empty cells, which render as background.
    pub fn color(&self, count: u32, max_count: u32) -> Option<Rgb> {
        if count == 0 || max_count == 0 {
            return None;
        }
        let t = self.intensity(count, max_count);
        if self.stops.len() == 1 {
            return Some(self.stops[0]);
        }
        let span = (self.stops.len() - 1) as f64;
        let pos = t * span;
        let lower = (pos.floor() as usize).min(self.stops.len() - 2);
        Some(self.stops[lower].lerp(self.stops[lower + 1], pos - lower as f64))
    }
}
