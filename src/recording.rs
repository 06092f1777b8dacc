// src/recording.rs
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::SignalKind;
use crate::views::ViewerError;

/// One named, immutable time series.
#[derive(Clone, Debug)]
pub struct Channel {
    pub id: String,
    pub label: String,
    pub samples: Vec<f64>,
}

impl Channel {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub sample_count: usize,
    pub sampling_rate: f64,
    pub duration: f64,
    #[serde(default)]
    pub channel_names: Vec<String>,
}

/// Wire shape handed over by the loader: `{ channels: {id: [..]}, metadata: {..} }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordingPayload {
    pub channels: HashMap<String, Vec<f64>>,
    pub metadata: RecordingMetadata,
}

/// Full multi-channel dataset for one upload. Replaced wholesale, never patched.
#[derive(Clone, Debug)]
pub struct Recording {
    channels: Vec<Channel>,
    sampling_rate: f64,
    sample_count: usize,
}

impl Recording {
    /// Channels keep the given order; labels come from `kind`.
    pub fn new(
        channels: Vec<(String, Vec<f64>)>,
        sampling_rate: f64,
        kind: SignalKind,
    ) -> Result<Self, ViewerError> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(ViewerError::InvalidSampleRate);
        }
        if channels.is_empty() {
            return Err(ViewerError::EmptyRecording);
        }
        let mut seen = HashSet::new();
        for (id, _) in &channels {
            if id.is_empty() {
                return Err(ViewerError::EmptyChannelId);
            }
            if !seen.insert(id.clone()) {
                return Err(ViewerError::DuplicateChannel(id.clone()));
            }
        }
        let channels: Vec<Channel> = channels
            .into_iter()
            .enumerate()
            .map(|(idx, (id, samples))| Channel {
                id,
                label: kind.channel_label(idx),
                samples,
            })
            .collect();
        let sample_count = channels.iter().map(Channel::len).max().unwrap_or(0);
        Ok(Self {
            channels,
            sampling_rate,
            sample_count,
        })
    }

    pub fn from_payload(payload: RecordingPayload, kind: SignalKind) -> Result<Self, ViewerError> {
        let RecordingPayload {
            mut channels,
            metadata,
        } = payload;
        let mut ordered = Vec::with_capacity(channels.len());
        for name in &metadata.channel_names {
            if let Some(samples) = channels.remove(name) {
                ordered.push((name.clone(), samples));
            }
        }
        let mut rest: Vec<(String, Vec<f64>)> = channels.into_iter().collect();
        rest.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        ordered.extend(rest);
        Self::new(ordered, metadata.sampling_rate, kind)
    }

    pub fn from_json_str(json: &str, kind: SignalKind) -> Result<Self, ViewerError> {
        let payload: RecordingPayload = serde_json::from_str(json)?;
        Self::from_payload(payload, kind)
    }

    pub fn load_json(path: impl AsRef<Path>, kind: SignalKind) -> Result<Self, ViewerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text, kind)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn channel_index(&self, id: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.id == id)
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn duration(&self) -> f64 {
        self.sample_count as f64 / self.sampling_rate
    }
}

/// Orders `ch2` before `ch10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let split = |s: &str| {
        let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (head, tail) = s.split_at(s.len() - digits);
        (head.to_owned(), tail.parse::<u64>().ok())
    };
    let (head_a, num_a) = split(a);
    let (head_b, num_b) = split(b);
    head_a
        .cmp(&head_b)
        .then_with(|| num_a.cmp(&num_b))
        .then_with(|| a.cmp(b))
}
