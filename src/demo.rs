// src/demo.rs
// 演示数据: 没有上传文件时用固定种子生成 ECG / EEG 风格的录音
use std::f64::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::DemoConfig;
use crate::recording::Recording;
use crate::types::SignalKind;
use crate::views::ViewerError;

const HEART_RATE_BPM: f64 = 72.0;

/// (centre within the beat, width, amplitude) of the P, Q, R, S and T waves.
const PQRST: [(f64, f64, f64); 5] = [
    (0.20, 0.025, 0.12),
    (0.36, 0.010, -0.15),
    (0.40, 0.012, 1.00),
    (0.44, 0.010, -0.25),
    (0.65, 0.045, 0.30),
];

pub fn generate(kind: SignalKind, config: &DemoConfig) -> Result<Recording, ViewerError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let rate = config.sampling_rate;
    let len = (config.duration_seconds.max(0.0) * rate).floor() as usize;
    let channels = (0..config.channels.max(1))
        .map(|idx| {
            let samples = match kind {
                SignalKind::Ecg => ecg_lead(&mut rng, len, rate),
                SignalKind::Eeg => eeg_channel(&mut rng, len, rate),
                SignalKind::Generic => mixed_tones(&mut rng, len, rate),
            };
            (format!("ch{}", idx + 1), samples)
        })
        .collect();
    Recording::new(channels, rate, kind)
}

fn gaussian(x: f64, centre: f64, width: f64) -> f64 {
    let d = (x - centre) / width;
    (-0.5 * d * d).exp()
}

fn ecg_lead(rng: &mut StdRng, len: usize, rate: f64) -> Vec<f64> {
    let beat = 60.0 / HEART_RATE_BPM;
    let gain = rng.gen_range(0.6..1.4) * if rng.gen_bool(0.2) { -1.0 } else { 1.0 };
    let wander_phase = rng.gen_range(0.0..TAU);
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            let phase = (t % beat) / beat;
            let wave: f64 = PQRST
                .iter()
                .map(|&(centre, width, amp)| amp * gaussian(phase, centre, width))
                .sum();
            let wander = 0.05 * (TAU * 0.3 * t + wander_phase).sin();
            gain * wave + wander + rng.gen_range(-0.01..0.01)
        })
        .collect()
}

fn eeg_channel(rng: &mut StdRng, len: usize, rate: f64) -> Vec<f64> {
    let alpha_hz = rng.gen_range(8.5..11.5);
    let beta_hz = rng.gen_range(16.0..24.0);
    let alpha_amp = rng.gen_range(15.0..30.0);
    let beta_amp = rng.gen_range(3.0..8.0);
    let (alpha_phase, beta_phase) = (rng.gen_range(0.0..TAU), rng.gen_range(0.0..TAU));
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            alpha_amp * (TAU * alpha_hz * t + alpha_phase).sin()
                + beta_amp * (TAU * beta_hz * t + beta_phase).sin()
                + rng.gen_range(-5.0..5.0)
        })
        .collect()
}

fn mixed_tones(rng: &mut StdRng, len: usize, rate: f64) -> Vec<f64> {
    let base_hz = rng.gen_range(0.5..3.0);
    let phase = rng.gen_range(0.0..TAU);
    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            (TAU * base_hz * t + phase).sin()
                + 0.3 * (TAU * base_hz * 3.0 * t).sin()
                + rng.gen_range(-0.05..0.05)
        })
        .collect()
}
