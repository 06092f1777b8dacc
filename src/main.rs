// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod demo;
mod gui;
mod palette;
mod playback;
mod recording;
mod selection;
mod session;
mod types;
mod views;
use anyhow::Context;
use eframe::egui;
use log::info;

use crate::config::ViewerConfig;
use crate::recording::Recording;
use crate::session::ViewerSession;

// 入口函数: 可选参数为录音 JSON 路径, 否则生成演示数据
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ViewerConfig::discover();
    let kind = config.signal_kind;
    let recording = match std::env::args().nth(1) {
        Some(path) => Recording::load_json(&path, kind)
            .with_context(|| format!("failed to load recording {path}"))?,
        None => {
            info!("no recording given, generating {} demo", kind.title());
            demo::generate(kind, &config.demo).context("failed to build demo recording")?
        }
    };
    let session = ViewerSession::with_recording(config, recording);
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 800.0])
        .with_min_inner_size([960.0, 600.0])
        .with_title("Signal Scope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Signal Scope",
        options,
        Box::new(|_cc| Box::new(gui::SignalScopeApp::new(session))),
    )
    .map_err(|err| anyhow::anyhow!("viewer exited with error: {err}"))
}
