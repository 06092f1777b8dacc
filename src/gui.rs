// src/gui.rs
use eframe::egui;
use egui::{Color32, Pos2, Rect, Rounding, Stroke, Vec2};
use egui_plot::{Legend, Line, Plot, PlotPoints, VLine};
use log::warn;

use crate::palette::Rgb;
use crate::playback::PlaybackSpeed;
use crate::selection::SelectionLimit;
use crate::session::{ViewFrame, ViewerSession};
use crate::types::{ViewMode, ViewerCommand};
use crate::views::{
    ContinuousFrame, DensityFrame, FrequencySpectrum, PolarFrame, PolarMode, ViewOutput, XorFrame,
};

const LOG_LINES: usize = 8;

pub struct SignalScopeApp {
    session: ViewerSession,
    show_spectrum: bool,
    // 界面日志
    log_messages: Vec<String>,
}

impl SignalScopeApp {
    pub fn new(session: ViewerSession) -> Self {
        let mut app = Self {
            session,
            show_spectrum: false,
            log_messages: Vec::new(),
        };
        app.log(&format!("{} viewer ready.", app.session.kind().title()));
        app
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn color(&self, c: Rgb) -> Color32 {
        Color32::from_rgb(c.0, c.1, c.2)
    }

    fn side_panel(&self, ui: &mut egui::Ui, commands: &mut Vec<ViewerCommand>, save: &mut bool) {
        let session = &self.session;
        let mode = session.mode();
        ui.add_space(10.0);
        ui.heading("Signal Scope");
        ui.label(format!("{} recording", session.kind().title()));
        ui.separator();

        // 视图模式
        ui.horizontal_wrapped(|ui| {
            for m in ViewMode::ALL {
                if ui.selectable_label(mode == m, m.label()).clicked() {
                    commands.push(ViewerCommand::SetMode(m));
                }
            }
        });
        ui.separator();

        // 播放控制
        let state = session.playback();
        ui.horizontal(|ui| {
            let play_txt = if state.is_playing { "⏸ Pause" } else { "▶ Play" };
            if ui.button(play_txt).clicked() {
                commands.push(if state.is_playing {
                    ViewerCommand::Pause
                } else {
                    ViewerCommand::Play
                });
            }
            if ui.button("⏹ Stop").clicked() {
                commands.push(ViewerCommand::Stop);
            }
        });
        let mut speed = state.speed;
        egui::ComboBox::from_label("Speed")
            .selected_text(speed.label())
            .show_ui(ui, |ui| {
                for s in PlaybackSpeed::ALL {
                    ui.selectable_value(&mut speed, s, s.label());
                }
            });
        if speed != state.speed {
            commands.push(ViewerCommand::SetSpeed(speed));
        }
        let mut t = state.current_time;
        let duration = session.duration();
        let seek = ui.add(
            egui::Slider::new(&mut t, 0.0..=duration.max(0.001))
                .suffix(" s")
                .fixed_decimals(1),
        );
        if seek.changed() {
            commands.push(ViewerCommand::Seek(t));
        }
        ui.label(format!(
            "{:.1} / {:.1} s ({:.0}%)",
            state.current_time,
            duration,
            session.progress() * 100.0
        ));
        ui.separator();

        // 通道选择
        let selection = session.selection(mode);
        let heading = match selection.limit() {
            SelectionLimit::Pair => "CHANNELS (X then Y)",
            _ => "CHANNELS",
        };
        match selection.limit().max() {
            Some(max) => ui.label(format!("{heading}  {}/{max}", selection.selected_count())),
            None => ui.label(heading),
        };
        if let Some(recording) = session.recording() {
            egui::ScrollArea::vertical()
                .id_source("channels")
                .max_height(180.0)
                .show(ui, |ui| {
                    for (idx, channel) in recording.channels().iter().enumerate() {
                        let mut on = selection.is_selected(&channel.id);
                        let text = egui::RichText::new(&channel.label)
                            .color(self.color(session.palette().channel_color(idx)));
                        if ui.checkbox(&mut on, text).changed() {
                            commands.push(ViewerCommand::ToggleChannel(mode, channel.id.clone()));
                        }
                    }
                });
            if selection.limit() == SelectionLimit::Unbounded {
                ui.horizontal(|ui| {
                    if ui.button("All").clicked() {
                        commands.push(ViewerCommand::ToggleSelectAll(true));
                    }
                    if ui.button("None").clicked() {
                        commands.push(ViewerCommand::ToggleSelectAll(false));
                    }
                });
            }
        } else {
            ui.label("No recording loaded.");
        }
        ui.separator();

        // 模式参数
        match mode {
            ViewMode::Continuous => {
                let mut zoom = session.zoom();
                if ui
                    .add(egui::Slider::new(&mut zoom, 0.1..=10.0).text("Zoom").logarithmic(true))
                    .changed()
                {
                    commands.push(ViewerCommand::SetZoom(zoom));
                }
            }
            ViewMode::Xor => {
                let mut chunk = session.chunk_seconds();
                if ui
                    .add(
                        egui::Slider::new(&mut chunk, 0.05..=60.0)
                            .text("Chunk (s)")
                            .logarithmic(true),
                    )
                    .changed()
                {
                    commands.push(ViewerCommand::SetChunkSize(chunk));
                }
            }
            ViewMode::Polar => {
                let current = session.polar_mode();
                ui.horizontal(|ui| {
                    for m in [PolarMode::LatestFixed, PolarMode::Cumulative] {
                        if ui.selectable_label(current == m, m.label()).clicked() {
                            commands.push(ViewerCommand::SetPolarMode(m));
                        }
                    }
                });
            }
            ViewMode::Recurrence => {
                let mut progressive = session.progressive_density();
                if ui.checkbox(&mut progressive, "Progressive density").changed() {
                    commands.push(ViewerCommand::SetProgressiveDensity(progressive));
                }
            }
        }

        ui.add_space(10.0);
        if ui.button("💾 Save PNG").clicked() {
            *save = true;
        }

        ui.add_space(10.0);
        egui::ScrollArea::vertical()
            .id_source("log")
            .max_height(120.0)
            .show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
    }

    fn draw_continuous(
        &self,
        ui: &mut egui::Ui,
        frame: &ContinuousFrame,
        spectra: &[FrequencySpectrum],
    ) {
        let accent = self.color(self.session.palette().accent);
        let height = if spectra.is_empty() {
            ui.available_height()
        } else {
            ui.available_height() * 0.65
        };
        Plot::new("continuous")
            .height(height)
            .include_x(0.0)
            .include_x(frame.viewport_seconds)
            .include_y(0.0)
            .include_y(1.0)
            .allow_drag(false)
            .allow_zoom(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for band in &frame.bands {
                    if band.points.is_empty() {
                        continue;
                    }
                    plot_ui.line(
                        Line::new(PlotPoints::new(band.points.clone()))
                            .name(&band.label)
                            .color(self.color(band.color)),
                    );
                }
                // 扫描线
                plot_ui.vline(VLine::new(frame.sweep_x).color(accent).width(2.0));
            });
        if !spectra.is_empty() {
            Plot::new("spectrum")
                .include_y(0.0)
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    for spectrum in spectra {
                        let points: Vec<[f64; 2]> = spectrum
                            .frequencies_hz
                            .iter()
                            .zip(&spectrum.magnitudes)
                            .map(|(f, m)| [*f, *m])
                            .collect();
                        let color = self
                            .session
                            .recording()
                            .and_then(|r| r.channel_index(&spectrum.channel_id))
                            .map_or(Color32::WHITE, |i| {
                                self.color(self.session.palette().channel_color(i))
                            });
                        plot_ui.line(
                            Line::new(PlotPoints::new(points))
                                .name(&spectrum.channel_id)
                                .color(color),
                        );
                    }
                });
        }
    }

    fn draw_xor(&self, ui: &mut egui::Ui, frame: &XorFrame) {
        let palette = self.session.palette();
        ui.label(
            egui::RichText::new(format!(
                "{}  {}  ({}/{})",
                frame.label,
                frame.comparison_label,
                frame.active_index + 1,
                frame.comparison_count
            ))
            .strong(),
        );
        let series = |values: &[f64]| -> Vec<[f64; 2]> {
            values
                .iter()
                .enumerate()
                .map(|(i, v)| [i as f64 / frame.sample_rate_hz, *v])
                .collect()
        };
        let faded = self.color(palette.foreground).gamma_multiply(0.35);
        Plot::new("xor")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::new(series(&frame.first)))
                        .name("first")
                        .color(faded),
                );
                plot_ui.line(
                    Line::new(PlotPoints::new(series(&frame.second)))
                        .name("second")
                        .color(faded),
                );
                plot_ui.line(
                    Line::new(PlotPoints::new(series(&frame.difference)))
                        .name("|a - b|")
                        .color(self.color(palette.accent))
                        .width(2.0),
                );
            });
    }

    fn draw_polar(&self, ui: &mut egui::Ui, frame: &PolarFrame) {
        ui.label(format!(
            "{}  {:.1}s .. {:.1}s",
            frame.mode.label(),
            frame.window_start_secs,
            frame.window_end_secs
        ));
        let grid = self.color(self.session.palette().foreground).gamma_multiply(0.15);
        Plot::new("polar")
            .data_aspect(1.0)
            .include_x(-1.1)
            .include_x(1.1)
            .include_y(-1.1)
            .include_y(1.1)
            .allow_drag(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for radius in [0.25, 0.5, 0.75, 1.0] {
                    let ring: Vec<[f64; 2]> = (0..=128)
                        .map(|i| {
                            let theta = i as f64 / 128.0 * std::f64::consts::TAU;
                            [radius * theta.cos(), radius * theta.sin()]
                        })
                        .collect();
                    plot_ui.line(Line::new(PlotPoints::new(ring)).color(grid));
                }
                for trace in &frame.traces {
                    let color = self.color(trace.color);
                    let split = trace.highlight_start.min(trace.points.len());
                    if split > 0 {
                        let history: Vec<[f64; 2]> =
                            trace.points[..split].iter().map(|p| [p.x, p.y]).collect();
                        plot_ui.line(
                            Line::new(PlotPoints::new(history)).color(color.gamma_multiply(0.3)),
                        );
                    }
                    let recent: Vec<[f64; 2]> =
                        trace.points[split..].iter().map(|p| [p.x, p.y]).collect();
                    plot_ui.line(
                        Line::new(PlotPoints::new(recent))
                            .name(&trace.label)
                            .color(color)
                            .width(1.5),
                    );
                }
            });
    }

    // 密度热图用 painter 直接画, 比 Plot 快
    fn draw_density(&self, ui: &mut egui::Ui, frame: &DensityFrame) {
        ui.label(format!(
            "Y: {}  X: {}  ({} / {} points)",
            frame.y_label, frame.x_label, frame.points_used, frame.total_points
        ));
        let available = ui.available_size();
        let side = available.x.min(available.y).max(50.0);
        let (response, painter) = ui.allocate_painter(Vec2::splat(side), egui::Sense::hover());
        let rect = response.rect;
        let palette = self.session.palette();
        painter.rect_filled(rect, Rounding::same(0.0), self.color(palette.background));
        let size = frame.grid.size();
        let cell = side / size as f32;
        let colors = self.session.density_colors();
        for ((row, col), &count) in frame.grid.counts().indexed_iter() {
            let Some(c) = colors.color(count, frame.normalizer) else {
                continue;
            };
            // row 0 is the lowest Y bin
            let min = Pos2::new(
                rect.left() + col as f32 * cell,
                rect.bottom() - (row + 1) as f32 * cell,
            );
            painter.rect_filled(
                Rect::from_min_size(min, Vec2::splat(cell)),
                Rounding::same(0.0),
                self.color(c),
            );
        }
        let border = Stroke::new(1.0, Color32::from_rgb(60, 60, 60));
        painter.rect_stroke(rect, Rounding::same(0.0), border);
    }
}

impl eframe::App for SignalScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 推进时钟与当前视图
        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.session.on_frame(dt);
        let spectra = if self.show_spectrum && self.session.mode() == ViewMode::Continuous {
            self.session.spectra()
        } else {
            Vec::new()
        };
        let view = self.session.frame();

        // 2. UI 绘制
        let mut visuals = egui::Visuals::dark();
        visuals.widgets.noninteractive.bg_fill = self.color(self.session.palette().background);
        ctx.set_visuals(visuals);

        let mut commands = Vec::new();
        let mut save = false;
        let mut show_spectrum = self.show_spectrum;
        egui::SidePanel::left("controls").min_width(280.0).show(ctx, |ui| {
            self.side_panel(ui, &mut commands, &mut save);
            if self.session.mode() == ViewMode::Continuous {
                ui.checkbox(&mut show_spectrum, "Show spectrum");
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| match &view {
            ViewFrame::Continuous(ViewOutput::Ready(frame)) => {
                self.draw_continuous(ui, frame, &spectra)
            }
            ViewFrame::Xor(ViewOutput::Ready(frame)) => self.draw_xor(ui, frame),
            ViewFrame::Polar(ViewOutput::Ready(frame)) => self.draw_polar(ui, frame),
            ViewFrame::Recurrence(ViewOutput::Ready(frame)) => self.draw_density(ui, frame),
            _ => {
                let message = view.placeholder().map_or("", |p| p.message());
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new(message).color(Color32::GRAY));
                });
            }
        });

        // 3. 处理命令
        self.show_spectrum = show_spectrum;
        for command in commands {
            if let Some(msg) = self.session.apply(command) {
                self.log(&msg);
            }
        }
        if save {
            match self.session.save_snapshot(".") {
                Ok(path) => self.log(&format!("Saved {}", path.display())),
                Err(err) => {
                    warn!("snapshot failed: {err}");
                    self.log(&format!("Snapshot failed: {err}"));
                }
            }
        }

        if self.session.playback().is_playing {
            ctx.request_repaint();
        }
    }
}
