//! Analysis and equalizer configuration.

/// Frequency analyser configuration.
///
/// Mirrors the classic analyser-node contract: a small FFT over the most
/// recent samples, heavy temporal smoothing, and byte magnitudes mapped from
/// a fixed decibel window.
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window length (samples). Must be a power of two.
    /// 128 keeps the bar count low enough to read at a glance.
    pub fft_size: usize,

    /// Temporal smoothing constant (0..1).
    /// 0.0 = raw per-frame magnitudes, 0.8 = slow, readable decay.
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_db: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 128,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins exposed per snapshot (half the FFT size)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(format!(
                "fft_size must be a power of two >= 32, got {}",
                self.fft_size
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!("smoothing must be in [0, 1), got {}", self.smoothing));
        }
        if self.min_db >= self.max_db {
            return Err(format!(
                "decibel window is empty: [{}, {}]",
                self.min_db, self.max_db
            ));
        }
        Ok(())
    }
}

/// Three-band equalizer parameters.
#[derive(Debug, Clone)]
pub struct EqParams {
    /// Low-shelf corner frequency (Hz)
    pub bass_hz: f32,

    /// Peaking-band center frequency (Hz)
    pub mid_hz: f32,

    /// Peaking-band quality factor (dimensionless)
    pub mid_q: f32,

    /// High-shelf corner frequency (Hz)
    pub treble_hz: f32,

    /// Gain bound per band (dB). Requested gains are clamped to
    /// [-gain_limit_db, +gain_limit_db], never rejected.
    pub gain_limit_db: f32,
}

impl Default for EqParams {
    fn default() -> Self {
        Self {
            bass_hz: 200.0,
            mid_hz: 1000.0,
            mid_q: 1.0,
            treble_hz: 5000.0,
            gain_limit_db: 12.0, // Conventional trim-EQ range
        }
    }
}

impl EqParams {
    /// Clamp a requested gain to the supported range
    pub fn clamp_gain(&self, gain_db: f32) -> f32 {
        gain_db.clamp(-self.gain_limit_db, self.gain_limit_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyser_config_default_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 64);
    }

    #[test]
    fn test_analyser_config_rejects_bad_fft_size() {
        let mut config = AnalyserConfig::default();
        config.fft_size = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gain_clamp() {
        let params = EqParams::default();
        assert_eq!(params.clamp_gain(4.0), 4.0);
        assert_eq!(params.clamp_gain(99.0), params.gain_limit_db);
        assert_eq!(params.clamp_gain(-99.0), -params.gain_limit_db);
    }
}
