use std::f64::consts::TAU;
use std::ops::Range;

use crate::config::TimeWindow;
use crate::palette::{Palette, Rgb};
use crate::recording::Recording;
use crate::views::{range_normalize, Placeholder, ViewOutput};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PolarMode {
    /// Sliding window of the last `window` seconds; one revolution == one window.
    #[default]
    LatestFixed,
    /// Everything from 0 to the current time on a single revolution.
    Cumulative,
}

impl PolarMode {
    pub fn label(self) -> &'static str {
        match self {
            PolarMode::LatestFixed => "Latest 10 s",
            PolarMode::Cumulative => "Cumulative",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarPoint {
    pub theta: f64,
    pub r: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug)]
pub struct PolarTrace {
    pub channel_id: String,
    pub label: String,
    pub color: Rgb,
    pub points: Vec<PolarPoint>,
    /// Points from here on are the highlighted recent segment (cumulative mode).
    pub highlight_start: usize,
}

#[derive(Clone, Debug)]
pub struct PolarFrame {
    pub mode: PolarMode,
    pub window_start_secs: f64,
    pub window_end_secs: f64,
    pub traces: Vec<PolarTrace>,
}

/// Sample range feeding the transform at `current_time`.
pub fn polar_window(
    len: usize,
    sample_rate_hz: f64,
    current_time: f64,
    mode: PolarMode,
    window: TimeWindow,
) -> Range<usize> {
    let end = ((current_time.max(0.0) * sample_rate_hz).floor() as usize).min(len);
    match mode {
        PolarMode::LatestFixed => end.saturating_sub(window.samples(sample_rate_hz))..end,
        PolarMode::Cumulative => 0..end,
    }
}

/// `theta_i = i / revolution * 2pi`, `r_i` range-normalised to `[0, 1]`.
pub fn to_polar(samples: &[f64], revolution: usize) -> Vec<PolarPoint> {
    let revolution = revolution.max(1) as f64;
    range_normalize(samples)
        .into_iter()
        .zip(samples)
        .enumerate()
        .filter(|(_, (_, raw))| raw.is_finite())
        .map(|(i, (r, _))| {
            let theta = i as f64 / revolution * TAU;
            PolarPoint {
                theta,
                r,
                x: r * theta.cos(),
                y: r * theta.sin(),
            }
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct PolarView {
    mode: PolarMode,
    window: TimeWindow,
    highlight_points: usize,
}

impl PolarView {
    pub fn new(window: TimeWindow, highlight_points: usize) -> Self {
        Self {
            mode: PolarMode::default(),
            window,
            highlight_points,
        }
    }

    pub fn mode(&self) -> PolarMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PolarMode) {
        self.mode = mode;
    }

    pub fn frame(
        &self,
        recording: &Recording,
        selected: &[String],
        current_time: f64,
        palette: &Palette,
    ) -> ViewOutput<PolarFrame> {
        if selected.is_empty() {
            return ViewOutput::Waiting(Placeholder::SelectChannels);
        }
        let channels: Vec<_> = selected
            .iter()
            .filter_map(|id| recording.channel(id))
            .filter(|c| !c.is_empty())
            .collect();
        if channels.is_empty() {
            return ViewOutput::Waiting(Placeholder::NoData);
        }
        let rate = recording.sampling_rate();
        let mut window_range = 0..0;
        let traces: Vec<PolarTrace> = channels
            .iter()
            .map(|channel| {
                let range = polar_window(channel.len(), rate, current_time, self.mode, self.window);
                // Latest-fixed keeps one revolution == one full window, so a trace
                // shorter than the window sweeps only part of the circle.
                let revolution = match self.mode {
                    PolarMode::LatestFixed => self.window.samples(rate),
                    PolarMode::Cumulative => range.len(),
                };
                let points = to_polar(&channel.samples[range.clone()], revolution);
                let highlight_start = match self.mode {
                    PolarMode::LatestFixed => 0,
                    PolarMode::Cumulative => points.len().saturating_sub(self.highlight_points),
                };
                if range.len() > window_range.len() {
                    window_range = range;
                }
                let channel_index = recording.channel_index(&channel.id).unwrap_or(0);
                PolarTrace {
                    channel_id: channel.id.clone(),
                    label: channel.label.clone(),
                    color: palette.channel_color(channel_index),
                    points,
                    highlight_start,
                }
            })
            .collect();
        if traces.iter().all(|t| t.points.is_empty()) {
            return ViewOutput::Waiting(Placeholder::WaitingForData);
        }
        ViewOutput::Ready(PolarFrame {
            mode: self.mode,
            window_start_secs: window_range.start as f64 / rate,
            window_end_secs: window_range.end as f64 / rate,
            traces,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;

    #[test]
    fn latest_window_spans_ten_seconds_after_warmup() {
        let window = TimeWindow::new(10.0);
        let rate = 100.0;
        let len = 10_000;
        for step in 0..=1_000 {
            let t = step as f64 * 0.1;
            let range = polar_window(len, rate, t, PolarMode::LatestFixed, window);
            let end = (t * rate).floor() as usize;
            if t >= 10.0 {
                assert_eq!(range.len(), 1_000, "t = {t}");
            } else {
                assert_eq!(range, 0..end, "t = {t}");
            }
        }
    }

    #[test]
    fn cumulative_window_starts_at_zero() {
        let range = polar_window(5_000, 250.0, 12.0, PolarMode::Cumulative, TimeWindow::default());
        assert_eq!(range, 0..3_000);
    }

    #[test]
    fn polar_points_lie_on_unit_disk() {
        let samples: Vec<f64> = (0..400).map(|i| (i as f64 * 0.05).sin() * 30.0).collect();
        let points = to_polar(&samples, samples.len());
        assert_eq!(points.len(), 400);
        for p in &points {
            assert!(p.r >= 0.0 && p.r <= 1.0);
            assert!((p.x * p.x + p.y * p.y).sqrt() <= 1.0 + 1e-9);
        }
        assert_eq!(points[0].theta, 0.0);
        assert!((points[100].theta - TAU / 4.0).abs() < 1e-12);
    }

    #[test]
    fn flat_signal_sits_on_half_radius() {
        let points = to_polar(&[3.0; 8], 8);
        assert!(points.iter().all(|p| p.r == 0.5));
    }

    #[test]
    fn partial_latest_window_sweeps_partial_arc() {
        let rec = Recording::new(
            vec![("ch1".into(), (0..2_000).map(|i| i as f64).collect())],
            100.0,
            SignalKind::Generic,
        )
        .unwrap();
        let view = PolarView::new(TimeWindow::new(10.0), 500);
        let palette = Palette::for_kind(SignalKind::Generic);
        let out = view.frame(&rec, &["ch1".to_owned()], 5.0, palette);
        let frame = out.ready().unwrap();
        let last = frame.traces[0].points.last().unwrap();
        assert!(last.theta < std::f64::consts::PI);
        assert_eq!(frame.window_end_secs, 5.0);
    }

    #[test]
    fn cumulative_highlights_recent_points() {
        let rec = Recording::new(
            vec![("ch1".into(), (0..2_000).map(|i| (i as f64).cos()).collect())],
            100.0,
            SignalKind::Generic,
        )
        .unwrap();
        let mut view = PolarView::new(TimeWindow::new(10.0), 500);
        view.set_mode(PolarMode::Cumulative);
        let palette = Palette::for_kind(SignalKind::Generic);
        let out = view.frame(&rec, &["ch1".to_owned()], 15.0, palette);
        let trace = &out.ready().unwrap().traces[0];
        assert_eq!(trace.points.len(), 1_500);
        assert_eq!(trace.highlight_start, 1_000);
    }

    #[test]
    fn placeholders() {
        let rec = Recording::new(
            vec![("ch1".into(), vec![1.0; 100]), ("ch2".into(), vec![])],
            100.0,
            SignalKind::Generic,
        )
        .unwrap();
        let view = PolarView::new(TimeWindow::default(), 500);
        let palette = Palette::for_kind(SignalKind::Generic);
        assert_eq!(
            view.frame(&rec, &[], 0.5, palette).placeholder(),
            Some(Placeholder::SelectChannels)
        );
        assert_eq!(
            view.frame(&rec, &["ch2".to_owned()], 0.5, palette).placeholder(),
            Some(Placeholder::NoData)
        );
        assert_eq!(
            view.frame(&rec, &["ch1".to_owned()], 0.0, palette).placeholder(),
            Some(Placeholder::WaitingForData)
        );
    }
}
