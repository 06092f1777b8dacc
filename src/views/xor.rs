//! Chunk alternation ("XOR") comparison of one channel against itself.
//!
//! The channel, cut off at the playback time, is sliced into fixed-length
//! chunks. Even-indexed chunks and odd-indexed chunks form two sequences and
//! the comparison walks them alternately:
//! `odd[0]^even[0]`, `even[0]^odd[1]`, `odd[1]^even[1]`, `even[1]^odd[2]`, ...
//!
//! The "XOR" is a sample-wise absolute difference, not a bitwise operation on
//! the float bits: near zero means the chunks agree, large means they diverge.
use log::debug;

use crate::recording::Recording;
use crate::views::{Placeholder, ViewOutput};

pub const MIN_CHUNK_SECONDS: f64 = 0.05;
pub const MAX_CHUNK_SECONDS: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonKind {
    /// `odd[k] ^ even[k]`
    OddEven,
    /// `even[k] ^ odd[k + 1]`
    EvenOdd,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkComparison {
    pub kind: ComparisonKind,
    pub odd_index: usize,
    pub even_index: usize,
    pub label: String,
    pub result: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkPairSet {
    pub samples_per_chunk: usize,
    pub even_chunks: Vec<Vec<f64>>,
    pub odd_chunks: Vec<Vec<f64>>,
    pub comparisons: Vec<ChunkComparison>,
}

impl ChunkPairSet {
    /// Pure function of its inputs; rebuilt from scratch on every change.
    pub fn build(
        samples: &[f64],
        sample_rate_hz: f64,
        chunk_seconds: f64,
        cutoff_secs: f64,
    ) -> Self {
        let samples_per_chunk = (chunk_seconds * sample_rate_hz).floor().max(0.0) as usize;
        if samples_per_chunk == 0 {
            return Self::default();
        }
        let cutoff = ((cutoff_secs.max(0.0) * sample_rate_hz).floor() as usize).min(samples.len());
        let mut even_chunks = Vec::new();
        let mut odd_chunks = Vec::new();
        // chunks_exact drops the trailing partial chunk.
        for (idx, chunk) in samples[..cutoff].chunks_exact(samples_per_chunk).enumerate() {
            if idx % 2 == 0 {
                even_chunks.push(chunk.to_vec());
            } else {
                odd_chunks.push(chunk.to_vec());
            }
        }
        let comparisons = alternate(&odd_chunks, &even_chunks);
        Self {
            samples_per_chunk,
            even_chunks,
            odd_chunks,
            comparisons,
        }
    }

    pub fn total_chunks(&self) -> usize {
        self.even_chunks.len() + self.odd_chunks.len()
    }

    /// Comparison shown at `current_time`: `floor(t / chunk)` clamped to the last one.
    pub fn active_index(&self, current_time: f64, chunk_seconds: f64) -> Option<usize> {
        if self.comparisons.is_empty() || chunk_seconds <= 0.0 {
            return None;
        }
        let raw = (current_time.max(0.0) / chunk_seconds).floor() as usize;
        Some(raw.min(self.comparisons.len() - 1))
    }
}

fn alternate(odd: &[Vec<f64>], even: &[Vec<f64>]) -> Vec<ChunkComparison> {
    let mut out = Vec::new();
    let mut step = 0usize;
    loop {
        let k = step / 2;
        let (kind, odd_index, even_index) = if step % 2 == 0 {
            (ComparisonKind::OddEven, k, k)
        } else {
            (ComparisonKind::EvenOdd, k + 1, k)
        };
        let (Some(a), Some(b)) = (odd.get(odd_index), even.get(even_index)) else {
            break;
        };
        let (result, label) = match kind {
            ComparisonKind::OddEven => (
                xor_like(a, b),
                format!("odd[{odd_index}] ^ even[{even_index}]"),
            ),
            ComparisonKind::EvenOdd => (
                xor_like(b, a),
                format!("even[{even_index}] ^ odd[{odd_index}]"),
            ),
        };
        out.push(ChunkComparison {
            kind,
            odd_index,
            even_index,
            label,
            result,
        });
        step += 1;
    }
    out
}

/// `|a[i] - b[i]|`, the shorter side padded with zeros.
pub fn xor_like(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0);
            let y = b.get(i).copied().unwrap_or(0.0);
            (x - y).abs()
        })
        .collect()
}

/// Render-ready comparison: both source chunks and their difference.
#[derive(Clone, Debug)]
pub struct XorFrame {
    pub channel_id: String,
    pub label: String,
    pub active_index: usize,
    pub comparison_count: usize,
    pub comparison_label: String,
    pub sample_rate_hz: f64,
    pub first: Vec<f64>,
    pub second: Vec<f64>,
    pub difference: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
struct CacheKey {
    channel_id: String,
    samples_per_chunk: usize,
    complete_chunks: usize,
}

#[derive(Clone, Debug)]
pub struct XorView {
    chunk_seconds: f64,
    cache: Option<(CacheKey, ChunkPairSet)>,
}

impl XorView {
    pub fn new(chunk_seconds: f64) -> Self {
        Self {
            chunk_seconds: clamp_chunk(chunk_seconds),
            cache: None,
        }
    }

    pub fn chunk_seconds(&self) -> f64 {
        self.chunk_seconds
    }

    pub fn set_chunk_seconds(&mut self, seconds: f64) {
        let seconds = clamp_chunk(seconds);
        if seconds != self.chunk_seconds {
            self.chunk_seconds = seconds;
            self.cache = None;
        }
    }

    pub fn reset(&mut self) {
        self.cache = None;
    }

    pub fn pairs(&self) -> Option<&ChunkPairSet> {
        self.cache.as_ref().map(|(_, pairs)| pairs)
    }

    /// Rebuilds the pair set when the channel, chunk size or the number of
    /// complete chunks before `current_time` changed.
    pub fn update(&mut self, recording: &Recording, channel_id: Option<&str>, current_time: f64) {
        let Some(channel) = channel_id.and_then(|id| recording.channel(id)) else {
            self.cache = None;
            return;
        };
        let rate = recording.sampling_rate();
        let samples_per_chunk = (self.chunk_seconds * rate).floor() as usize;
        let cutoff = ((current_time.max(0.0) * rate).floor() as usize).min(channel.len());
        let key = CacheKey {
            channel_id: channel.id.clone(),
            samples_per_chunk,
            complete_chunks: cutoff.checked_div(samples_per_chunk).unwrap_or(0),
        };
        if matches!(&self.cache, Some((cached, _)) if *cached == key) {
            return;
        }
        let pairs = ChunkPairSet::build(&channel.samples, rate, self.chunk_seconds, current_time);
        debug!(
            "xor rebuild: channel={} chunks={} comparisons={}",
            key.channel_id,
            pairs.total_chunks(),
            pairs.comparisons.len()
        );
        self.cache = Some((key, pairs));
    }

    pub fn frame(
        &self,
        recording: &Recording,
        channel_id: Option<&str>,
        current_time: f64,
        is_playing: bool,
    ) -> ViewOutput<XorFrame> {
        let Some(channel) = channel_id.and_then(|id| recording.channel(id)) else {
            return ViewOutput::Waiting(Placeholder::SelectChannel);
        };
        if channel.is_empty() {
            return ViewOutput::Waiting(Placeholder::NoData);
        }
        if !is_playing {
            return ViewOutput::Waiting(Placeholder::PressPlay);
        }
        let Some((key, pairs)) = &self.cache else {
            return ViewOutput::Waiting(Placeholder::WaitingForData);
        };
        if key.channel_id != channel.id {
            return ViewOutput::Waiting(Placeholder::WaitingForData);
        }
        let Some(active) = pairs.active_index(current_time, self.chunk_seconds) else {
            return ViewOutput::Waiting(Placeholder::WaitingForData);
        };
        let comparison = &pairs.comparisons[active];
        let odd = pairs.odd_chunks[comparison.odd_index].clone();
        let even = pairs.even_chunks[comparison.even_index].clone();
        let (first, second) = match comparison.kind {
            ComparisonKind::OddEven => (odd, even),
            ComparisonKind::EvenOdd => (even, odd),
        };
        ViewOutput::Ready(XorFrame {
            channel_id: channel.id.clone(),
            label: channel.label.clone(),
            active_index: active,
            comparison_count: pairs.comparisons.len(),
            comparison_label: comparison.label.clone(),
            sample_rate_hz: recording.sampling_rate(),
            first,
            second,
            difference: comparison.result.clone(),
        })
    }
}

fn clamp_chunk(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.clamp(MIN_CHUNK_SECONDS, MAX_CHUNK_SECONDS)
    } else {
        1.0
    }
}
