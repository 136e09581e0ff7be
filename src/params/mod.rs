//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (Hz, dB, seconds, pixels, world units)
//! - Documented ranges and meanings

mod audio;
mod render;
mod viz;

// Re-export all types
pub use audio::{AnalyserConfig, EqParams};
pub use render::RenderConfig;
pub use viz::BarLayout;
