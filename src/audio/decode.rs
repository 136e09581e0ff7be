//! Track decoding via symphonia, entirely in memory.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::LoadError;

/// A fully decoded track: interleaved stereo f32 frames.
///
/// Replaced wholesale on every load; never mutated in place.
#[derive(Debug)]
pub struct Track {
    /// Interleaved [L, R, L, R, ...] samples
    pub samples: Vec<f32>,
    /// Source sample rate (Hz)
    pub sample_rate: u32,
}

impl Track {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Track length in seconds
    pub fn duration_s(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Stereo frame at `index`, or silence past the end
    pub fn frame(&self, index: usize) -> (f32, f32) {
        if index >= self.frames() {
            return (0.0, 0.0);
        }
        (self.samples[index * 2], self.samples[index * 2 + 1])
    }
}

/// Decode raw audio bytes into a stereo [`Track`].
///
/// `ext_hint` is the file extension when known; it narrows the container
/// probe but is not required. Mono input is duplicated to both channels,
/// wider layouts are folded down to stereo.
pub fn decode_bytes(bytes: &[u8], ext_hint: Option<&str>) -> Result<Track, LoadError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SymphoniaError::Unsupported("no audio tracks found"))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(SymphoniaError::Unsupported("unknown sample rate"))?;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // A corrupt packet mid-stream is skippable; a broken stream is not
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // Fold every layout to interleaved stereo
        for frame in sample_buf.samples().chunks(channels) {
            match channels {
                1 => {
                    samples.push(frame[0]);
                    samples.push(frame[0]);
                }
                2 => samples.extend_from_slice(frame),
                n => {
                    let mixed: f32 = frame.iter().sum::<f32>() / n as f32;
                    samples.push(mixed);
                    samples.push(mixed);
                }
            }
        }
    }

    if samples.is_empty() {
        return Err(SymphoniaError::Unsupported("stream contained no audio frames").into());
    }

    let track = Track {
        samples,
        sample_rate,
    };

    log::info!(
        "Decoded track: {} frames, {}Hz, {:.1}s",
        track.frames(),
        track.sample_rate,
        track.duration_s()
    );

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an in-memory mono WAV fixture with a 440 Hz sine
    fn wav_fixture(sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                let t = i as f32 / sample_rate as f32;
                let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
                writer.write_sample((sample * i16::MAX as f32 * 0.5) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav_fixture() {
        let bytes = wav_fixture(44_100, 4410);
        let track = decode_bytes(&bytes, Some("wav")).unwrap();

        assert_eq!(track.sample_rate, 44_100);
        assert_eq!(track.frames(), 4410);
        assert!((track.duration_s() - 0.1).abs() < 1e-6);

        // Mono source upmixed: both channels identical
        let (l, r) = track.frame(100);
        assert_eq!(l, r);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_bytes(b"definitely not an audio container", None).unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn test_frame_past_end_is_silence() {
        let bytes = wav_fixture(44_100, 64);
        let track = decode_bytes(&bytes, Some("wav")).unwrap();
        assert_eq!(track.frame(1_000_000), (0.0, 0.0));
    }
}
