// src/session.rs
// 会话: 录音 + 时钟 + 选择 + 各视图状态, GUI 只通过命令驱动它
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::ViewerConfig;
use crate::palette::{DensityColorMap, Palette};
use crate::playback::{PlaybackClock, PlaybackState};
use crate::recording::Recording;
use crate::selection::{ChannelSelection, SelectionBook};
use crate::types::{SignalKind, ViewMode, ViewerCommand};
use crate::views::{
    render_continuous_png, render_density_png, render_polar_png, render_xor_png,
    ContinuousFrame, ContinuousView, DensityFrame, FrequencySpectrum, Placeholder, PlotStyle,
    PolarFrame, PolarMode, PolarView, RecurrenceView, SpectrumBuilder, ViewOutput, ViewerError,
    XorFrame, XorView,
};

/// Render-ready output of whichever mode is active.
#[derive(Clone, Debug)]
pub enum ViewFrame {
    Continuous(ViewOutput<ContinuousFrame>),
    Xor(ViewOutput<XorFrame>),
    Polar(ViewOutput<PolarFrame>),
    Recurrence(ViewOutput<DensityFrame>),
}

impl ViewFrame {
    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            ViewFrame::Continuous(out) => out.placeholder(),
            ViewFrame::Xor(out) => out.placeholder(),
            ViewFrame::Polar(out) => out.placeholder(),
            ViewFrame::Recurrence(out) => out.placeholder(),
        }
    }
}

pub struct ViewerSession {
    recording: Option<Recording>,
    kind: SignalKind,
    palette: &'static Palette,
    clock: PlaybackClock,
    selections: SelectionBook,
    mode: ViewMode,
    continuous: ContinuousView,
    xor: XorView,
    polar: PolarView,
    recurrence: RecurrenceView,
    spectrum: SpectrumBuilder,
    density_colors: DensityColorMap,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        let kind = config.signal_kind;
        let palette = Palette::for_kind(kind);
        Self {
            recording: None,
            kind,
            palette,
            clock: PlaybackClock::new(0.0),
            selections: SelectionBook::empty(),
            mode: ViewMode::Continuous,
            continuous: ContinuousView::new(config.viewport(), config.default_zoom),
            xor: XorView::new(config.default_chunk_seconds),
            polar: PolarView::new(config.polar_window(), config.polar_highlight_points),
            recurrence: RecurrenceView::new(config.progressive_density),
            spectrum: SpectrumBuilder::new(),
            density_colors: DensityColorMap::new(palette, config.density_scale),
        }
    }

    pub fn with_recording(config: ViewerConfig, recording: Recording) -> Self {
        let mut session = Self::new(config);
        session.load(recording);
        session
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn palette(&self) -> &'static Palette {
        self.palette
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn playback(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn duration(&self) -> f64 {
        self.clock.duration()
    }

    pub fn progress(&self) -> f64 {
        self.clock.progress()
    }

    pub fn selection(&self, mode: ViewMode) -> &ChannelSelection {
        self.selections.for_mode(mode)
    }

    pub fn zoom(&self) -> f64 {
        self.continuous.zoom()
    }

    pub fn chunk_seconds(&self) -> f64 {
        self.xor.chunk_seconds()
    }

    pub fn polar_mode(&self) -> PolarMode {
        self.polar.mode()
    }

    pub fn progressive_density(&self) -> bool {
        self.recurrence.progressive()
    }

    pub fn density_colors(&self) -> &DensityColorMap {
        &self.density_colors
    }

    pub fn continuous(&self) -> &ContinuousView {
        &self.continuous
    }

    pub fn xor(&self) -> &XorView {
        &self.xor
    }

    /// Applies one user command. The returned text goes to the activity log.
    pub fn apply(&mut self, command: ViewerCommand) -> Option<String> {
        match command {
            ViewerCommand::Play => {
                if self.recording.is_none() {
                    return Some("No recording loaded".into());
                }
                if self.clock.is_playing() {
                    return None;
                }
                self.clock.play();
                info!("play at {:.2}s", self.clock.current_time());
                Some(format!("Playing at {}", self.clock.speed().label()))
            }
            ViewerCommand::Pause => {
                if !self.clock.is_playing() {
                    return None;
                }
                self.clock.pause();
                info!("pause at {:.2}s", self.clock.current_time());
                Some(format!("Paused at {:.1}s", self.clock.current_time()))
            }
            ViewerCommand::Stop => {
                self.clock.stop();
                self.clear_mode_state(self.mode);
                info!("stop");
                Some("Stopped".into())
            }
            ViewerCommand::Seek(t) => {
                self.clock.seek(t);
                debug!("seek to {:.2}s", self.clock.current_time());
                None
            }
            ViewerCommand::SetSpeed(speed) => {
                if speed == self.clock.speed() {
                    return None;
                }
                self.clock.set_speed(speed);
                info!("speed {}", speed.label());
                Some(format!("Speed {}", speed.label()))
            }
            ViewerCommand::SetMode(mode) => {
                if mode == self.mode {
                    return None;
                }
                self.clear_mode_state(self.mode);
                self.clock.reset();
                self.mode = mode;
                info!("mode -> {}", mode.label());
                Some(format!("{} view", mode.label()))
            }
            ViewerCommand::ToggleChannel(mode, id) => {
                let changed = self.selections.for_mode_mut(mode).toggle(&id);
                if !changed {
                    return None;
                }
                self.on_selection_changed(mode);
                let state = if self.selections.for_mode(mode).is_selected(&id) {
                    "on"
                } else {
                    "off"
                };
                let label = self.channel_label(&id);
                Some(format!("{label} {state}"))
            }
            ViewerCommand::ToggleSelectAll(select) => {
                let mode = self.mode;
                let selection = self.selections.for_mode_mut(mode);
                let changed = if select {
                    selection.select_all()
                } else {
                    selection.deselect_all()
                };
                if !changed {
                    return None;
                }
                self.on_selection_changed(mode);
                Some(if select {
                    "All channels selected".into()
                } else {
                    "Selection cleared".into()
                })
            }
            ViewerCommand::SetChunkSize(seconds) => {
                let before = self.xor.chunk_seconds();
                self.xor.set_chunk_seconds(seconds);
                let after = self.xor.chunk_seconds();
                (after != before).then(|| format!("Chunk size {after:.2}s"))
            }
            ViewerCommand::SetPolarMode(mode) => {
                if mode == self.polar.mode() {
                    return None;
                }
                self.polar.set_mode(mode);
                Some(format!("Polar: {}", mode.label()))
            }
            ViewerCommand::SetZoom(zoom) => {
                self.continuous.set_zoom(zoom);
                None
            }
            ViewerCommand::SetProgressiveDensity(progressive) => {
                if progressive == self.recurrence.progressive() {
                    return None;
                }
                self.recurrence.set_progressive(progressive);
                Some(if progressive {
                    "Progressive density on".into()
                } else {
                    "Progressive density off".into()
                })
            }
            ViewerCommand::LoadRecording(recording) => {
                let message = format!(
                    "Loaded {} channels, {:.1}s at {} Hz",
                    recording.channels().len(),
                    recording.duration(),
                    recording.sampling_rate()
                );
                self.load(recording);
                Some(message)
            }
        }
    }

    /// Per-frame entry point. Ticks the clock and advances only the active view.
    pub fn on_frame(&mut self, real_elapsed_secs: f64) {
        // Buffer intake follows wall time; speed only moves the clock.
        let intake = if self.clock.is_playing() {
            real_elapsed_secs
        } else {
            0.0
        };
        self.clock.tick(real_elapsed_secs);
        let Some(recording) = &self.recording else {
            return;
        };
        let t = self.clock.current_time();
        match self.mode {
            ViewMode::Continuous => {
                let selected = self
                    .selections
                    .for_mode(ViewMode::Continuous)
                    .selected_in_channel_order();
                self.continuous.advance(recording, &selected, intake);
            }
            ViewMode::Xor => {
                let channel = self.selections.for_mode(ViewMode::Xor).order().first();
                self.xor.update(recording, channel.map(String::as_str), t);
            }
            // Stateless: recomputed from the clock in `frame`.
            ViewMode::Polar => {}
            ViewMode::Recurrence => {
                let axes = self.selections.for_mode(ViewMode::Recurrence).axes();
                self.recurrence
                    .update(recording, axes, t, self.clock.duration());
            }
        }
    }

    pub fn frame(&self) -> ViewFrame {
        let Some(recording) = &self.recording else {
            let waiting = Placeholder::NoData;
            return match self.mode {
                ViewMode::Continuous => ViewFrame::Continuous(ViewOutput::Waiting(waiting)),
                ViewMode::Xor => ViewFrame::Xor(ViewOutput::Waiting(waiting)),
                ViewMode::Polar => ViewFrame::Polar(ViewOutput::Waiting(waiting)),
                ViewMode::Recurrence => ViewFrame::Recurrence(ViewOutput::Waiting(waiting)),
            };
        };
        let t = self.clock.current_time();
        let selection = self.selections.for_mode(self.mode);
        match self.mode {
            ViewMode::Continuous => ViewFrame::Continuous(self.continuous.snapshot(
                recording,
                &selection.selected_in_channel_order(),
                self.palette,
            )),
            ViewMode::Xor => ViewFrame::Xor(self.xor.frame(
                recording,
                selection.order().first().map(String::as_str),
                t,
                self.clock.is_playing(),
            )),
            ViewMode::Polar => ViewFrame::Polar(self.polar.frame(
                recording,
                &selection.selected_in_channel_order(),
                t,
                self.palette,
            )),
            ViewMode::Recurrence => ViewFrame::Recurrence(self.recurrence.frame(
                recording,
                selection.axes(),
                t,
                self.clock.is_playing(),
            )),
        }
    }

    /// Spectra of the continuous buffers, one per selected channel with data.
    pub fn spectra(&mut self) -> Vec<FrequencySpectrum> {
        let Some(recording) = &self.recording else {
            return Vec::new();
        };
        let rate = recording.sampling_rate();
        self.selections
            .for_mode(ViewMode::Continuous)
            .selected_in_channel_order()
            .iter()
            .filter_map(|id| {
                let samples = self.continuous.buffer_samples(id);
                self.spectrum.compute(id, &samples, rate)
            })
            .collect()
    }

    pub fn snapshot_png(&self, style: &PlotStyle) -> Result<Vec<u8>, ViewerError> {
        let waiting = |p: Placeholder| ViewerError::Plot(p.message().to_owned());
        match self.frame() {
            ViewFrame::Continuous(out) => match out {
                ViewOutput::Ready(frame) => render_continuous_png(&frame, style),
                ViewOutput::Waiting(p) => Err(waiting(p)),
            },
            ViewFrame::Xor(out) => match out {
                ViewOutput::Ready(frame) => render_xor_png(&frame, style),
                ViewOutput::Waiting(p) => Err(waiting(p)),
            },
            ViewFrame::Polar(out) => match out {
                ViewOutput::Ready(frame) => render_polar_png(&frame, style),
                ViewOutput::Waiting(p) => Err(waiting(p)),
            },
            ViewFrame::Recurrence(out) => match out {
                ViewOutput::Ready(frame) => {
                    render_density_png(&frame, &self.density_colors, style)
                }
                ViewOutput::Waiting(p) => Err(waiting(p)),
            },
        }
    }

    /// Writes `snapshot-<mode>.png` into `dir`.
    pub fn save_snapshot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ViewerError> {
        let png = self.snapshot_png(&PlotStyle::from_palette(self.palette))?;
        let path = dir
            .as_ref()
            .join(format!("snapshot-{}.png", self.mode.slug()));
        std::fs::write(&path, png)?;
        info!("snapshot written to {}", path.display());
        Ok(path)
    }

    fn load(&mut self, recording: Recording) {
        info!(
            "recording: {} channels, {} samples @ {} Hz",
            recording.channels().len(),
            recording.sample_count(),
            recording.sampling_rate()
        );
        self.clock.set_duration(recording.duration());
        self.selections = SelectionBook::new(recording.channel_ids());
        self.continuous.reset();
        self.xor.reset();
        self.recurrence.reset();
        self.recording = Some(recording);
    }

    fn clear_mode_state(&mut self, mode: ViewMode) {
        match mode {
            ViewMode::Continuous => self.continuous.reset(),
            ViewMode::Xor => self.xor.reset(),
            ViewMode::Polar => {}
            ViewMode::Recurrence => self.recurrence.reset(),
        }
    }

    fn on_selection_changed(&mut self, mode: ViewMode) {
        match mode {
            ViewMode::Xor => self.xor.reset(),
            ViewMode::Recurrence => self.recurrence.reset(),
            // Continuous buffers follow the selection on the next advance.
            ViewMode::Continuous | ViewMode::Polar => {}
        }
    }

    fn channel_label(&self, id: &str) -> String {
        self.recording
            .as_ref()
            .and_then(|r| r.channel(id))
            .map(|c| c.label.clone())
            .unwrap_or_else(|| id.to_owned())
    }
}
