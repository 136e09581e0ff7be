//! Audio pipeline: decoding, equalization, playback, and frequency analysis.
//!
//! Samples flow one way: track buffer -> equalizer stages -> analysis tap ->
//! output device. The renderer only ever reads the tap's snapshot.

mod analyser;
mod decode;
mod eq;
mod player;
mod transport;

pub use analyser::Analyser;
pub use decode::{decode_bytes, Track};
pub use eq::{Band, Equalizer};
pub use player::Player;
pub use transport::Transport;

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while bringing a track in.
///
/// Both variants recover at the triggering action: the previous track,
/// playback state, and EQ settings are left untouched.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The bytes were fetched but are not decodable audio
    #[error("could not decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// The source could not be read at all
    #[error("could not read {path}: {source}")]
    Fetch {
        path: PathBuf,
        source: std::io::Error,
    },
}
