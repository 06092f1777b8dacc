// src/types.rs
use serde::{Deserialize, Serialize};

use crate::playback::PlaybackSpeed;
use crate::recording::Recording;
use crate::views::PolarMode;

// 视图模式 (互斥, 共享同一个 Recording 和时钟)
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum ViewMode {
    Continuous,
    Xor,
    Polar,
    Recurrence,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Continuous,
        ViewMode::Xor,
        ViewMode::Polar,
        ViewMode::Recurrence,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Continuous => "Continuous",
            ViewMode::Xor => "XOR",
            ViewMode::Polar => "Polar",
            ViewMode::Recurrence => "Recurrence",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ViewMode::Continuous => "continuous",
            ViewMode::Xor => "xor",
            ViewMode::Polar => "polar",
            ViewMode::Recurrence => "recurrence",
        }
    }
}

const ECG_LEADS: [&str; 12] = [
    "I", "II", "III", "aVR", "aVL", "aVF", "V1", "V2", "V3", "V4", "V5", "V6",
];

const EEG_10_20: [&str; 19] = [
    "Fp1", "Fp2", "F3", "F4", "C3", "C4", "P3", "P4", "O1", "O2", "F7", "F8", "T3", "T4", "T5",
    "T6", "Fz", "Cz", "Pz",
];

/// Channel naming and colouring strategy; one engine serves every recording type.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Ecg,
    Eeg,
    #[default]
    Generic,
}

impl SignalKind {
    pub fn channel_label(self, index: usize) -> String {
        let named = match self {
            SignalKind::Ecg => ECG_LEADS.get(index).copied(),
            SignalKind::Eeg => EEG_10_20.get(index).copied(),
            SignalKind::Generic => None,
        };
        named
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Ch {}", index + 1))
    }

    pub fn title(self) -> &'static str {
        match self {
            SignalKind::Ecg => "ECG",
            SignalKind::Eeg => "EEG",
            SignalKind::Generic => "Signal",
        }
    }
}

// GUI 发给会话的命令
#[derive(Clone, Debug)]
pub enum ViewerCommand {
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetSpeed(PlaybackSpeed),
    SetMode(ViewMode),
    ToggleChannel(ViewMode, String),
    ToggleSelectAll(bool),
    SetChunkSize(f64),
    SetPolarMode(PolarMode),
    SetZoom(f64),
    SetProgressiveDensity(bool),
    LoadRecording(Recording),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecg_labels_fall_back_after_twelve_leads() {
        assert_eq!(SignalKind::Ecg.channel_label(0), "I");
        assert_eq!(SignalKind::Ecg.channel_label(11), "V6");
        assert_eq!(SignalKind::Ecg.channel_label(12), "Ch 13");
    }

    #[test]
    fn eeg_and_generic_labels() {
        assert_eq!(SignalKind::Eeg.channel_label(17), "Cz");
        assert_eq!(SignalKind::Generic.channel_label(2), "Ch 3");
    }
}
