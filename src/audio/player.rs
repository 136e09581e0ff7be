//! Playback controller: output stream, shared audio-graph state, transport.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::params::{AnalyserConfig, EqParams};

use super::{decode_bytes, Analyser, Band, Equalizer, LoadError, Track, Transport};

/// Upper bound on buffered tap samples if the renderer stalls
const TAP_CAP: usize = 8192;

/// Live connection between a track and the output device: a fractional frame
/// cursor stepped at the track-rate/device-rate ratio, with linear
/// interpolation between adjacent frames.
struct Source {
    track: Arc<Track>,
    cursor: f64,
    step: f64,
}

impl Source {
    /// Next resampled stereo frame, or `None` once the track is exhausted
    fn next_frame(&mut self) -> Option<(f32, f32)> {
        let base = self.cursor as usize;
        if base + 1 >= self.track.frames() {
            return None;
        }
        let frac = (self.cursor - base as f64) as f32;
        let (l0, r0) = self.track.frame(base);
        let (l1, r1) = self.track.frame(base + 1);
        self.cursor += self.step;
        Some((l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac))
    }
}

/// State shared with the audio callback
struct Shared {
    eq: Equalizer,
    source: Option<Source>,
    /// Output frames delivered since the stream opened (the audio clock)
    clock_frames: u64,
    /// Raised by the callback when the live source ran off the end
    ended: bool,
}

/// Playback controller.
///
/// Owns the audio graph (equalizer stages + analysis tap), the output
/// stream, and the play/pause state machine. The stream runs for the whole
/// process lifetime; without a live source it emits silence, which keeps
/// the audio clock advancing and lets the analyser decay naturally.
pub struct Player {
    shared: Arc<Mutex<Shared>>,
    tap: Arc<Mutex<Vec<f32>>>,
    analyser: Analyser,
    transport: Transport,
    track: Option<Arc<Track>>,
    out_rate: u32,

    /// Audio output stream; runs for the process lifetime
    stream: cpal::Stream,
}

impl Player {
    /// Open the default output device and start the (silent) stream
    pub fn new(analyser_config: AnalyserConfig, eq_params: EqParams) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no audio output device found")?;
        let config = device
            .default_output_config()
            .context("failed to query audio output config")?;

        let out_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        log::info!(
            "Audio output: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            out_rate,
            channels
        );

        let analyser =
            Analyser::new(analyser_config).map_err(|e| anyhow!("invalid analyser config: {e}"))?;
        let eq = Equalizer::new(out_rate as f32, eq_params)?;

        let shared = Arc::new(Mutex::new(Shared {
            eq,
            source: None,
            clock_frames: 0,
            ended: false,
        }));
        let tap = Arc::new(Mutex::new(Vec::<f32>::new()));

        let shared_cb = Arc::clone(&shared);
        let tap_cb = Arc::clone(&tap);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut guard = shared_cb.lock().unwrap();
                    let shared = &mut *guard;
                    let mut tap = tap_cb.lock().unwrap();

                    let frames = data.len() / channels;

                    for frame in data.chunks_mut(channels) {
                        let mut ended = false;
                        let pulled = match shared.source.as_mut() {
                            Some(source) => match source.next_frame() {
                                Some(f) => Some(f),
                                None => {
                                    ended = true;
                                    None
                                }
                            },
                            None => None,
                        };
                        if ended {
                            shared.source = None;
                            shared.ended = true;
                        }

                        let (l, r) = pulled.unwrap_or((0.0, 0.0));
                        let (l, r) = shared.eq.process_frame(l, r);

                        for (ch, sample) in frame.iter_mut().enumerate() {
                            *sample = if ch % 2 == 0 { l } else { r };
                        }

                        // Post-EQ mono mix for the analysis tap
                        tap.push(0.5 * (l + r));
                    }

                    shared.clock_frames += frames as u64;

                    if tap.len() > TAP_CAP {
                        let excess = tap.len() - TAP_CAP;
                        tap.drain(..excess);
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .context("failed to build audio output stream")?;

        stream.play().context("failed to start audio stream")?;

        Ok(Self {
            shared,
            tap,
            analyser,
            transport: Transport::new(),
            track: None,
            out_rate,
            stream,
        })
    }

    /// Decode bytes and install the track, paused at the start.
    ///
    /// On failure nothing changes: the previous track keeps playing and the
    /// transport and EQ are untouched.
    pub fn load(&mut self, bytes: &[u8], ext_hint: Option<&str>) -> Result<(), LoadError> {
        let track = Arc::new(decode_bytes(bytes, ext_hint)?);

        {
            let mut shared = self.shared.lock().unwrap();
            shared.source = None;
            shared.ended = false;
        }
        self.track = Some(track);
        self.transport.load();
        Ok(())
    }

    /// Read a file and load it
    pub fn load_path(&mut self, path: &std::path::Path) -> Result<(), LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Fetch {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path.extension().and_then(|e| e.to_str());
        self.load(&bytes, ext)
    }

    /// Start or resume playback from the stored offset. No-op when empty or
    /// already playing.
    pub fn play(&mut self) -> Result<()> {
        // The device may have been suspended; resuming an already-running
        // stream is a no-op
        self.stream
            .play()
            .context("failed to resume audio stream")?;

        let now = self.clock_s();
        if let (Some(track), Some(offset_s)) = (self.track.clone(), self.transport.play(now)) {
            let mut shared = self.shared.lock().unwrap();
            shared.ended = false;
            shared.source = Some(Source {
                cursor: offset_s * track.sample_rate as f64,
                step: track.sample_rate as f64 / self.out_rate as f64,
                track,
            });
        }
        Ok(())
    }

    /// Stop the live run, recording the elapsed position for the next play.
    /// No-op unless playing.
    pub fn pause(&mut self) {
        let now = self.clock_s();
        if self.transport.pause(now).is_some() {
            self.shared.lock().unwrap().source = None;
        }
    }

    /// Apply the callback's end-of-track signal, if any.
    /// Returns true when the track just finished.
    pub fn poll_ended(&mut self) -> bool {
        let finished = {
            let mut shared = self.shared.lock().unwrap();
            std::mem::take(&mut shared.ended)
        };
        if finished {
            self.transport.finish();
        }
        finished
    }

    /// Set one equalizer band, returning the effective (clamped) gain.
    /// Independent of playback state.
    pub fn set_gain(&mut self, band: Band, gain_db: f32) -> f32 {
        self.shared.lock().unwrap().eq.set_gain(band, gain_db)
    }

    /// Return all bands to neutral
    pub fn reset_gains(&mut self) {
        self.shared.lock().unwrap().eq.reset();
    }

    pub fn gain_db(&self, band: Band) -> f32 {
        self.shared.lock().unwrap().eq.gain_db(band)
    }

    /// Drain the tap and refresh the frequency snapshot. Valid in every
    /// state; before any audio has flowed the bins are all zero.
    pub fn snapshot(&mut self) -> &[u8] {
        let drained = {
            let mut tap = self.tap.lock().unwrap();
            std::mem::take(&mut *tap)
        };
        self.analyser.process(&drained)
    }

    pub fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    /// Current position within the track (seconds)
    pub fn position_s(&self) -> f64 {
        self.transport.position_s(self.clock_s())
    }

    /// Loaded track length (seconds), 0 when empty
    pub fn duration_s(&self) -> f64 {
        self.track.as_ref().map_or(0.0, |t| t.duration_s())
    }

    /// Audio-clock reading: output frames delivered so far, in seconds
    fn clock_s(&self) -> f64 {
        let frames = self.shared.lock().unwrap().clock_frames;
        frames as f64 / self.out_rate as f64
    }
}
