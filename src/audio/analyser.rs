//! Frequency analysis tap: windowed FFT with temporal smoothing and
//! byte-magnitude output.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::params::AnalyserConfig;

/// Analysis tap over the post-EQ signal.
///
/// Keeps the most recent `fft_size` samples, and on each refresh produces one
/// byte magnitude per frequency bin: windowed FFT, magnitude normalized by
/// the FFT length, exponential smoothing against the previous refresh, then
/// a linear map of the configured decibel window onto 0..=255.
///
/// The snapshot is overwritten in place every refresh; it is telemetry, not
/// history.
pub struct Analyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    recent: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl Analyser {
    pub fn new(config: AnalyserConfig) -> Result<Self, String> {
        config.validate()?;

        let fft = FftPlanner::new().plan_fft_forward(config.fft_size);
        let window = hann_window(config.fft_size);
        let bins = config.bin_count();

        Ok(Self {
            fft,
            window,
            recent: vec![0.0; config.fft_size],
            scratch: vec![Complex::new(0.0, 0.0); config.fft_size],
            smoothed: vec![0.0; bins],
            bytes: vec![0; bins],
            config,
        })
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Latest snapshot without refreshing (all zeros before the first feed)
    pub fn bins(&self) -> &[u8] {
        &self.bytes
    }

    /// Feed new post-EQ samples and refresh the snapshot.
    ///
    /// Only the most recent `fft_size` samples matter; older input slides
    /// out of the window.
    pub fn process(&mut self, incoming: &[f32]) -> &[u8] {
        self.feed(incoming);
        self.refresh();
        &self.bytes
    }

    fn feed(&mut self, incoming: &[f32]) {
        let n = self.config.fft_size;
        if incoming.len() >= n {
            self.recent.copy_from_slice(&incoming[incoming.len() - n..]);
        } else if !incoming.is_empty() {
            self.recent.rotate_left(incoming.len());
            let tail = n - incoming.len();
            self.recent[tail..].copy_from_slice(incoming);
        }
    }

    fn refresh(&mut self) {
        let n = self.config.fft_size;

        for i in 0..n {
            self.scratch[i] = Complex::new(self.recent[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let tau = self.config.smoothing;
        let db_span = self.config.max_db - self.config.min_db;

        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() / n as f32;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            let db = 20.0 * smoothed.max(f32::MIN_POSITIVE).log10();
            let scaled = (db - self.config.min_db) / db_span;
            self.bytes[k] = (scaled.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
}

/// Hann window coefficients
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (size as f32 - 1.0)).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A sine completing `cycles` full periods per FFT window, so its energy
    /// lands in bin `cycles`
    fn bin_aligned_sine(cycles: usize, len: usize, fft_size: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (i as f32 * cycles as f32 / fft_size as f32 * 2.0 * PI).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn test_silence_yields_zero_bins() {
        let mut analyser = Analyser::new(AnalyserConfig::default()).unwrap();
        let bins = analyser.process(&vec![0.0; 512]);
        assert_eq!(bins.len(), 64);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_snapshot_is_zero_before_first_feed() {
        let analyser = Analyser::new(AnalyserConfig::default()).unwrap();
        assert!(analyser.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let config = AnalyserConfig::default();
        let fft_size = config.fft_size;
        let mut analyser = Analyser::new(config).unwrap();

        let chunk = bin_aligned_sine(8, fft_size, fft_size);
        // Let the temporal smoothing converge
        for _ in 0..16 {
            analyser.process(&chunk);
        }

        let bins = analyser.bins();
        assert_eq!(bins[8], 255, "aligned sine should saturate its bin");
        assert!(bins[40] < 64, "distant bin {} should stay quiet", bins[40]);
    }

    #[test]
    fn test_bins_decay_after_signal_stops() {
        let config = AnalyserConfig::default();
        let fft_size = config.fft_size;
        let mut analyser = Analyser::new(config).unwrap();

        let chunk = bin_aligned_sine(8, fft_size, fft_size);
        for _ in 0..16 {
            analyser.process(&chunk);
        }
        let loud = analyser.bins()[8];

        for _ in 0..8 {
            analyser.process(&vec![0.0; fft_size]);
        }
        let faded = analyser.bins()[8];

        assert!(faded < loud, "expected decay, got {loud} -> {faded}");

        for _ in 0..200 {
            analyser.process(&vec![0.0; fft_size]);
        }
        assert_eq!(analyser.bins()[8], 0, "smoothing should drain to zero");
    }

    #[test]
    fn test_short_feed_slides_window() {
        let config = AnalyserConfig::default();
        let fft_size = config.fft_size;
        let mut analyser = Analyser::new(config).unwrap();

        // Fill with signal, then push a partial chunk of silence; the window
        // still holds mostly signal, so bins stay warm
        let chunk = bin_aligned_sine(8, fft_size, fft_size);
        for _ in 0..16 {
            analyser.process(&chunk);
        }
        analyser.process(&vec![0.0; fft_size / 4]);
        assert!(analyser.bins()[8] > 0);
    }
}
