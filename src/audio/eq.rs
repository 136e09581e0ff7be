//! Three-band equalizer: low shelf, peaking mid, high shelf in series.

use anyhow::{anyhow, Result};
use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F32};

use crate::params::EqParams;

/// Equalizer band selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Bass,
    Mid,
    Treble,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Bass, Band::Mid, Band::Treble];

    fn index(self) -> usize {
        match self {
            Band::Bass => 0,
            Band::Mid => 1,
            Band::Treble => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::Bass => "BASS",
            Band::Mid => "MID",
            Band::Treble => "TREBLE",
        }
    }
}

/// Three cascaded stereo filter stages with adjustable dB gains.
///
/// Gains are graph configuration, not playback state: they survive track
/// loads and play/pause cycles. At 0 dB every stage is unity.
pub struct Equalizer {
    params: EqParams,
    sample_rate_hz: f32,
    gains_db: [f32; 3],
    /// stages[band][channel]
    stages: [[DirectForm1<f32>; 2]; 3],
}

impl Equalizer {
    /// Build the chain with all bands at neutral (0 dB)
    pub fn new(sample_rate_hz: f32, params: EqParams) -> Result<Self> {
        let mut stages = Vec::with_capacity(3);
        for band in Band::ALL {
            let coeffs = stage_coefficients(&params, sample_rate_hz, band, 0.0)?;
            stages.push([DirectForm1::<f32>::new(coeffs), DirectForm1::<f32>::new(coeffs)]);
        }
        let stages: [[DirectForm1<f32>; 2]; 3] = stages
            .try_into()
            .map_err(|_| anyhow!("equalizer stage construction failed"))?;

        Ok(Self {
            params,
            sample_rate_hz,
            gains_db: [0.0; 3],
            stages,
        })
    }

    /// Set one band's gain; out-of-range values are clamped, never rejected.
    /// Returns the effective gain.
    pub fn set_gain(&mut self, band: Band, gain_db: f32) -> f32 {
        let clamped = self.params.clamp_gain(gain_db);
        self.gains_db[band.index()] = clamped;

        // Coefficient validity depends only on the frequencies and Q proven
        // good in `new`; gain cannot invalidate them
        if let Ok(coeffs) = stage_coefficients(&self.params, self.sample_rate_hz, band, clamped) {
            for channel in &mut self.stages[band.index()] {
                channel.update_coefficients(coeffs);
            }
        }
        clamped
    }

    /// Return all bands to neutral
    pub fn reset(&mut self) {
        for band in Band::ALL {
            self.set_gain(band, 0.0);
        }
    }

    pub fn gain_db(&self, band: Band) -> f32 {
        self.gains_db[band.index()]
    }

    pub fn gains_db(&self) -> [f32; 3] {
        self.gains_db
    }

    /// Run one stereo frame through bass -> mid -> treble
    pub fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut l = left;
        let mut r = right;
        for stage in &mut self.stages {
            l = stage[0].run(l);
            r = stage[1].run(r);
        }
        (l, r)
    }
}

fn stage_coefficients(
    params: &EqParams,
    sample_rate_hz: f32,
    band: Band,
    gain_db: f32,
) -> Result<Coefficients<f32>> {
    let (kind, f0_hz, q) = match band {
        Band::Bass => (Type::LowShelf(gain_db), params.bass_hz, Q_BUTTERWORTH_F32),
        Band::Mid => (Type::PeakingEQ(gain_db), params.mid_hz, params.mid_q),
        Band::Treble => (Type::HighShelf(gain_db), params.treble_hz, Q_BUTTERWORTH_F32),
    };

    Coefficients::<f32>::from_params(kind, sample_rate_hz.hz(), f0_hz.hz(), q)
        .map_err(|e| anyhow!("invalid {} filter parameters: {e:?}", band.label()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn sine(freq_hz: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (i as f32 / SAMPLE_RATE * freq_hz * 2.0 * std::f32::consts::PI).sin() * 0.5)
            .collect()
    }

    /// RMS of the filtered signal, skipping the transient head
    fn filtered_rms(eq: &mut Equalizer, input: &[f32]) -> f32 {
        let settled: Vec<f32> = input
            .iter()
            .map(|&s| eq.process_frame(s, s).0)
            .skip(1000)
            .collect();
        (settled.iter().map(|s| s * s).sum::<f32>() / settled.len() as f32).sqrt()
    }

    #[test]
    fn test_gain_is_clamped() {
        let mut eq = Equalizer::new(SAMPLE_RATE, EqParams::default()).unwrap();
        assert_eq!(eq.set_gain(Band::Bass, 6.0), 6.0);
        assert_eq!(eq.set_gain(Band::Mid, 100.0), 12.0);
        assert_eq!(eq.set_gain(Band::Treble, -100.0), -12.0);
        assert_eq!(eq.gains_db(), [6.0, 12.0, -12.0]);
    }

    #[test]
    fn test_reset_returns_to_neutral() {
        let mut eq = Equalizer::new(SAMPLE_RATE, EqParams::default()).unwrap();
        eq.set_gain(Band::Bass, 9.0);
        eq.set_gain(Band::Mid, -3.0);
        eq.set_gain(Band::Treble, 4.5);
        eq.reset();
        assert_eq!(eq.gains_db(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_neutral_chain_is_transparent() {
        let mut eq = Equalizer::new(SAMPLE_RATE, EqParams::default()).unwrap();
        for &s in &sine(440.0, 2048) {
            let (l, r) = eq.process_frame(s, s);
            assert!((l - s).abs() < 1e-4, "left {l} drifted from {s}");
            assert!((r - s).abs() < 1e-4);
        }
    }

    #[test]
    fn test_bass_boost_lifts_low_frequencies() {
        let input = sine(50.0, 9600);
        let input_rms =
            (input.iter().map(|s| s * s).sum::<f32>() / input.len() as f32).sqrt();

        let mut eq = Equalizer::new(SAMPLE_RATE, EqParams::default()).unwrap();
        eq.set_gain(Band::Bass, 12.0);
        let boosted = filtered_rms(&mut eq, &input);

        // +12 dB is x3.98 in amplitude; allow for shelf rolloff
        assert!(boosted / input_rms > 2.0, "boost ratio {}", boosted / input_rms);
    }

    #[test]
    fn test_treble_cut_drops_high_frequencies() {
        let input = sine(10_000.0, 9600);
        let input_rms =
            (input.iter().map(|s| s * s).sum::<f32>() / input.len() as f32).sqrt();

        let mut eq = Equalizer::new(SAMPLE_RATE, EqParams::default()).unwrap();
        eq.set_gain(Band::Treble, -12.0);
        let cut = filtered_rms(&mut eq, &input);

        assert!(cut / input_rms < 0.7, "cut ratio {}", cut / input_rms);
    }
}
