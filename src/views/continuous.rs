use std::collections::VecDeque;

use crate::config::TimeWindow;
use crate::palette::{Palette, Rgb};
use crate::recording::Recording;
use crate::views::{range_normalize, Placeholder, ViewOutput};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
// Fraction of a band the trace may use at zoom 1.0.
const BAND_FILL: f64 = 0.9;

/// One channel's stripe in the scrolling display.
#[derive(Clone, Debug)]
pub struct TraceBand {
    pub channel_id: String,
    pub label: String,
    pub color: Rgb,
    pub band_index: usize,
    /// `[seconds, y]`, x in `[0, viewport]` with the newest sample at the right edge,
    /// y in band-space where band 0 is on top of `[0, 1]`.
    pub points: Vec<[f64; 2]>,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug)]
pub struct ContinuousFrame {
    pub viewport_seconds: f64,
    pub sweep_x: f64,
    pub zoom: f64,
    pub bands: Vec<TraceBand>,
}

/// Rolling FIFO with a hard capacity.
#[derive(Clone, Debug)]
struct ChannelBuffer {
    channel_id: String,
    samples: VecDeque<f64>,
}

impl ChannelBuffer {
    fn new(channel_id: String, capacity: usize) -> Self {
        Self {
            channel_id,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: f64, capacity: usize) {
        while self.samples.len() >= capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }
}

/// Simulated real-time recorder: streams samples from the recording into
/// one circular buffer per selected channel.
#[derive(Clone, Debug)]
pub struct ContinuousView {
    window: TimeWindow,
    buffers: Vec<ChannelBuffer>,
    read_cursor: usize,
    // Fractional samples owed from previous ticks.
    carry: f64,
    zoom: f64,
}

impl ContinuousView {
    pub fn new(window: TimeWindow, zoom: f64) -> Self {
        Self {
            window,
            buffers: Vec::new(),
            read_cursor: 0,
            carry: 0.0,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn capacity(&self, sample_rate_hz: f64) -> usize {
        self.window.samples(sample_rate_hz)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
        self.read_cursor = 0;
        self.carry = 0.0;
    }

    pub fn buffer_len(&self, channel_id: &str) -> usize {
        self.buffer(channel_id).map_or(0, |b| b.samples.len())
    }

    /// Oldest to newest.
    pub fn buffer_samples(&self, channel_id: &str) -> Vec<f64> {
        self.buffer(channel_id)
            .map(|b| b.samples.iter().copied().collect())
            .unwrap_or_default()
    }

    fn buffer(&self, channel_id: &str) -> Option<&ChannelBuffer> {
        self.buffers.iter().find(|b| b.channel_id == channel_id)
    }

    /// Keeps buffers of still-selected channels, opens empty ones for new picks.
    fn sync_channels(&mut self, selected: &[String], capacity: usize) {
        let mut previous = std::mem::take(&mut self.buffers);
        self.buffers = selected
            .iter()
            .map(|id| match previous.iter().position(|b| &b.channel_id == id) {
                Some(pos) => previous.swap_remove(pos),
                None => ChannelBuffer::new(id.clone(), capacity),
            })
            .collect();
    }

    /// Streams `floor(elapsed * rate)` new samples (plus carried fractions) into
    /// every selected buffer. Returns how many samples were advanced.
    pub fn advance(
        &mut self,
        recording: &Recording,
        selected: &[String],
        elapsed_secs: f64,
    ) -> usize {
        if selected.is_empty() || recording.sample_count() == 0 {
            return 0;
        }
        let rate = recording.sampling_rate();
        let capacity = self.capacity(rate);
        self.sync_channels(selected, capacity);
        if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
            return 0;
        }
        let exact = elapsed_secs * rate + self.carry;
        let to_advance = exact.floor() as usize;
        self.carry = exact - to_advance as f64;
        if to_advance == 0 {
            return 0;
        }
        // Anything older than one buffer length would be evicted right away.
        let skip = to_advance.saturating_sub(capacity);
        for buffer in &mut self.buffers {
            let Some(channel) = recording.channel(&buffer.channel_id) else {
                continue;
            };
            if channel.is_empty() {
                continue;
            }
            for step in skip..to_advance {
                let idx = (self.read_cursor + step) % channel.len();
                buffer.push(channel.samples[idx], capacity);
            }
        }
        self.read_cursor = (self.read_cursor + to_advance) % recording.sample_count();
        to_advance
    }

    pub fn snapshot(
        &self,
        recording: &Recording,
        selected: &[String],
        palette: &Palette,
    ) -> ViewOutput<ContinuousFrame> {
        if selected.is_empty() {
            return ViewOutput::Waiting(Placeholder::SelectChannels);
        }
        if selected
            .iter()
            .all(|id| recording.channel(id).map_or(true, |c| c.is_empty()))
        {
            return ViewOutput::Waiting(Placeholder::NoData);
        }
        let rate = recording.sampling_rate();
        let viewport = self.window.seconds;
        let band_height = 1.0 / selected.len() as f64;
        let bands = selected
            .iter()
            .enumerate()
            .map(|(band_index, id)| {
                let samples = self.buffer_samples(id);
                let (min, max) = super::finite_min_max(&samples).unwrap_or((0.0, 0.0));
                let center = 1.0 - (band_index as f64 + 0.5) * band_height;
                let len = samples.len();
                let points = range_normalize(&samples)
                    .into_iter()
                    .enumerate()
                    .map(|(i, norm)| {
                        let x = viewport - (len - 1 - i) as f64 / rate;
                        let y = center + (norm - 0.5) * band_height * BAND_FILL * self.zoom;
                        [x, y]
                    })
                    .collect();
                let channel_index = recording.channel_index(id).unwrap_or(band_index);
                TraceBand {
                    channel_id: id.clone(),
                    label: recording
                        .channel(id)
                        .map(|c| c.label.clone())
                        .unwrap_or_else(|| id.clone()),
                    color: palette.channel_color(channel_index),
                    band_index,
                    points,
                    min,
                    max,
                }
            })
            .collect();
        ViewOutput::Ready(ContinuousFrame {
            viewport_seconds: viewport,
            sweep_x: viewport,
            zoom: self.zoom,
            bands,
        })
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ramp_recording(len: usize, rate: f64) -> Recording {
        let ramp: Vec<f64> = (0..len).map(|i| i as f64).collect();
        Recording::new(
            vec![("ch1".into(), ramp.clone()), ("ch2".into(), ramp)],
            rate,
            SignalKind::Generic,
        )
        .unwrap()
    }

    #[test]
    fn buffers_never_exceed_capacity() {
        let rec = ramp_recording(3_000, 100.0);
        let mut view = ContinuousView::new(TimeWindow::new(10.0), 1.0);
        let selected = vec!["ch1".to_owned(), "ch2".to_owned()];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..2_000 {
            view.advance(&rec, &selected, rng.gen_range(0.0..0.5));
            assert!(view.buffer_len("ch1") <= 1_000);
            assert!(view.buffer_len("ch2") <= 1_000);
        }
        assert_eq!(view.buffer_len("ch1"), 1_000);
    }

    #[test]
    fn cursor_wraps_to_start() {
        let rec = ramp_recording(10, 10.0);
        let mut view = ContinuousView::new(TimeWindow::new(10.0), 1.0);
        let selected = vec!["ch1".to_owned()];
        assert_eq!(view.advance(&rec, &selected, 1.25), 12);
        let samples = view.buffer_samples("ch1");
        assert_eq!(&samples[8..], &[8.0, 9.0, 0.0, 1.0]);
        assert_eq!(view.read_cursor(), 2);
    }

    #[test]
    fn fractional_samples_are_carried() {
        let rec = ramp_recording(1_000, 250.0);
        let mut view = ContinuousView::new(TimeWindow::new(10.0), 1.0);
        let selected = vec!["ch1".to_owned()];
        let mut total = 0;
        for _ in 0..60 {
            total += view.advance(&rec, &selected, 1.0 / 60.0);
        }
        assert!((249..=250).contains(&total));
    }

    #[test]
    fn no_selection_does_no_work() {
        let rec = ramp_recording(100, 10.0);
        let mut view = ContinuousView::new(TimeWindow::new(10.0), 1.0);
        assert_eq!(view.advance(&rec, &[], 5.0), 0);
        assert_eq!(view.read_cursor(), 0);
        let palette = Palette::for_kind(SignalKind::Generic);
        let out = view.snapshot(&rec, &[], palette);
        assert_eq!(out.placeholder(), Some(Placeholder::SelectChannels));
    }

    #[test]
    fn deselected_channel_drops_its_buffer() {
        let rec = ramp_recording(100, 10.0);
        let mut view = ContinuousView::new(TimeWindow::new(10.0), 1.0);
        view.advance(&rec, &["ch1".to_owned(), "ch2".to_owned()], 1.0);
        view.advance(&rec, &["ch2".to_owned()], 1.0);
        assert_eq!(view.buffer_len("ch1"), 0);
        assert_eq!(view.buffer_len("ch2"), 20);
    }

    #[test]
    fn snapshot_stacks_bands_and_right_aligns() {
        let rec = ramp_recording(100, 10.0);
        let mut view = ContinuousView::new(TimeWindow::new(10.0), 1.0);
        let selected = vec!["ch1".to_owned(), "ch2".to_owned()];
        view.advance(&rec, &selected, 1.0);
        let palette = Palette::for_kind(SignalKind::Generic);
        let out = view.snapshot(&rec, &selected, palette);
        let frame = out.ready().unwrap();
        assert_eq!(frame.bands.len(), 2);
        let top = &frame.bands[0];
        let last = top.points.last().unwrap();
        assert!((last[0] - 10.0).abs() < 1e-9);
        for [_, y] in &top.points {
            assert!(*y >= 0.5 && *y <= 1.0);
        }
        for [_, y] in &frame.bands[1].points {
            assert!(*y >= 0.0 && *y <= 0.5);
        }
        assert_eq!(top.min, 0.0);
        assert_eq!(top.max, 9.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = ContinuousView::new(TimeWindow::default(), 50.0);
        assert_eq!(view.zoom(), MAX_ZOOM);
        view.set_zoom(f64::NAN);
        assert_eq!(view.zoom(), 1.0);
    }
}
