use rustfft::{num_complex::Complex64, FftPlanner};

pub const MAX_FFT_SIZE: usize = 2048;

/// Magnitude spectrum for one channel window.
#[derive(Clone, Debug)]
pub struct FrequencySpectrum {
    pub channel_id: String,
    pub sample_rate_hz: f64,
    pub frequencies_hz: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl FrequencySpectrum {
    /// Frequency of the strongest non-DC bin.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| self.frequencies_hz[idx])
    }
}

/// Helper that computes FFTs over the newest samples of a buffer.
pub struct SpectrumBuilder {
    planner: FftPlanner<f64>,
}

impl Default for SpectrumBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumBuilder {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Largest power of two not above `len`, capped at [`MAX_FFT_SIZE`].
    pub fn fft_size_for(len: usize) -> usize {
        if len < 2 {
            return 0;
        }
        let pow = 1usize << (usize::BITS - 1 - len.leading_zeros());
        pow.min(MAX_FFT_SIZE)
    }

    pub fn compute(
        &mut self,
        channel_id: &str,
        samples: &[f64],
        sample_rate_hz: f64,
    ) -> Option<FrequencySpectrum> {
        let fft_size = Self::fft_size_for(samples.len());
        if fft_size == 0 {
            return None;
        }
        let fft = self.planner.plan_fft_forward(fft_size);
        let window = &samples[samples.len() - fft_size..];
        let (sum, finite) = window
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        let mean = if finite == 0 { 0.0 } else { sum / finite as f64 };
        let mut buffer: Vec<Complex64> = window
            .iter()
            .map(|&v| Complex64::new(if v.is_finite() { v - mean } else { 0.0 }, 0.0))
            .collect();
        fft.process(&mut buffer);
        let frequencies_hz = (0..fft_size / 2)
            .map(|k| k as f64 * sample_rate_hz / fft_size as f64)
            .collect();
        let magnitudes = buffer
            .iter()
            .take(fft_size / 2)
            .map(|c| c.norm() / fft_size as f64)
            .collect();
        Some(FrequencySpectrum {
            channel_id: channel_id.to_owned(),
            sample_rate_hz,
            frequencies_hz,
            magnitudes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_size_is_power_of_two() {
        assert_eq!(SpectrumBuilder::fft_size_for(1), 0);
        assert_eq!(SpectrumBuilder::fft_size_for(2), 2);
        assert_eq!(SpectrumBuilder::fft_size_for(1_000), 512);
        assert_eq!(SpectrumBuilder::fft_size_for(1_024), 1_024);
        assert_eq!(SpectrumBuilder::fft_size_for(100_000), MAX_FFT_SIZE);
    }

    #[test]
    fn finds_the_dominant_tone() {
        let rate = 256.0;
        let samples: Vec<f64> = (0..512)
            .map(|i| (2.0 * std::f64::consts::PI * 10.0 * i as f64 / rate).sin())
            .collect();
        let mut builder = SpectrumBuilder::new();
        let spectrum = builder.compute("ch1", &samples, rate).unwrap();
        assert_eq!(spectrum.frequencies_hz.len(), 256);
        assert_eq!(spectrum.peak_frequency(), Some(10.0));
    }

    #[test]
    fn non_finite_samples_do_not_poison_the_spectrum() {
        let rate = 256.0;
        let mut samples: Vec<f64> = (0..512)
            .map(|i| (2.0 * std::f64::consts::PI * 10.0 * i as f64 / rate).sin())
            .collect();
        samples[3] = f64::NAN;
        samples[100] = f64::INFINITY;
        let mut builder = SpectrumBuilder::new();
        let spectrum = builder.compute("ch1", &samples, rate).unwrap();
        assert!(spectrum.magnitudes.iter().all(|m| m.is_finite()));
        assert_eq!(spectrum.peak_frequency(), Some(10.0));
    }
}
