//! Spectrum visualization: the bar field driven by analyser snapshots.

mod bars;

pub use bars::{BarField, BarInstance};
