// src/views/mod.rs
// 四种互斥视图的变换 + 快照导出
pub mod continuous;
pub mod error;
pub mod plot;
pub mod polar;
pub mod recurrence;
pub mod spectrum;
pub mod xor;
// 公开导出常用类型
pub use continuous::{ContinuousFrame, ContinuousView};
pub use error::ViewerError;
pub use plot::{
    render_continuous_png, render_density_png, render_polar_png, render_xor_png, PlotStyle,
};
pub use polar::{PolarFrame, PolarMode, PolarView};
pub use recurrence::{DensityFrame, RecurrenceView};
pub use spectrum::{FrequencySpectrum, SpectrumBuilder};
pub use xor::{XorFrame, XorView};

/// Why a view has nothing to draw. Never an error, just a waiting state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    SelectChannels,
    SelectChannel,
    SelectTwoChannels,
    NoData,
    WaitingForData,
    PressPlay,
}

impl Placeholder {
    pub fn message(self) -> &'static str {
        match self {
            Placeholder::SelectChannels => "Select channels to display",
            Placeholder::SelectChannel => "Select a channel to compare",
            Placeholder::SelectTwoChannels => "Select 2 channels (X then Y)",
            Placeholder::NoData => "No data in the selected channels",
            Placeholder::WaitingForData => "Waiting for data...",
            Placeholder::PressPlay => "Press play to start the comparison",
        }
    }
}

#[derive(Clone, Debug)]
pub enum ViewOutput<T> {
    Ready(T),
    Waiting(Placeholder),
}

impl<T> ViewOutput<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewOutput::Ready(frame) => Some(frame),
            ViewOutput::Waiting(_) => None,
        }
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            ViewOutput::Ready(_) => None,
            ViewOutput::Waiting(p) => Some(*p),
        }
    }
}

/// `(v - min) / (max - min)` over the finite values; 0.5 everywhere for a flat range.
pub(crate) fn range_normalize(values: &[f64]) -> Vec<f64> {
    let (min, max) = finite_min_max(values).unwrap_or((0.0, 0.0));
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() || range <= f64::EPSILON {
                0.5
            } else {
                (v - min) / range
            }
        })
        .collect()
}

pub(crate) fn finite_min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
