//! Bar field: one 3D bar per frequency bin.

use bytemuck::{Pod, Zeroable};

use crate::params::BarLayout;

/// Per-bar GPU instance data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BarInstance {
    /// World translation of the bar's center
    pub offset: [f32; 3],
    /// Nonuniform scale applied to the unit box (width, height, depth)
    pub scale: [f32; 3],
    /// Base color (linear RGB)
    pub color: [f32; 3],
}

/// Ordered row of bars, one per frequency bin, symmetric about x = 0.
///
/// Rebuilt wholesale whenever the viewport width changes (spacing and camera
/// framing depend on it); per-frame updates only touch heights.
pub struct BarField {
    layout: BarLayout,
    instances: Vec<BarInstance>,
    spacing: f32,
}

impl BarField {
    pub fn new(layout: BarLayout) -> Self {
        Self {
            layout,
            instances: Vec::new(),
            spacing: 1.0,
        }
    }

    /// Discard every bar and lay out `bin_count` fresh ones for the given
    /// viewport width. Hues sweep across the row so neighboring bars stay
    /// distinguishable at a glance.
    pub fn rebuild(&mut self, bin_count: usize, viewport_width_px: f32) {
        self.spacing = self.layout.spacing_for(viewport_width_px);
        self.instances.clear();

        for i in 0..bin_count {
            let x = (i as f32 - (bin_count as f32 - 1.0) / 2.0) * self.spacing;
            let hue = (i as f32 / bin_count as f32) * self.layout.hue_sweep_deg;
            let height = self.layout.min_height;

            self.instances.push(BarInstance {
                offset: [x, height / 2.0, 0.0],
                scale: [self.layout.bar_width, height, self.layout.bar_depth],
                color: hsl_to_rgb(hue, 1.0, 0.5),
            });
        }
    }

    /// Write the latest snapshot into bar heights. Bars grow upward from the
    /// baseline: scale to the floored height, recenter at half of it.
    pub fn update_frame(&mut self, snapshot: &[u8]) {
        for (bar, &magnitude) in self.instances.iter_mut().zip(snapshot) {
            let height = self.layout.height_for(magnitude);
            bar.scale[1] = height;
            bar.offset[1] = height / 2.0;
        }
    }

    pub fn instances(&self) -> &[BarInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Current bar spacing (world units)
    pub fn spacing(&self) -> f32 {
        self.spacing
    }
}

/// HSL to linear-ish RGB, h in degrees, s and l in 0..1
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_produces_one_bar_per_bin() {
        let mut field = BarField::new(BarLayout::default());
        field.rebuild(64, 1280.0);
        assert_eq!(field.len(), 64);

        field.rebuild(32, 640.0);
        assert_eq!(field.len(), 32);
    }

    #[test]
    fn test_row_is_symmetric_about_center() {
        let mut field = BarField::new(BarLayout::default());
        field.rebuild(64, 1280.0);

        let xs: Vec<f32> = field.instances().iter().map(|b| b.offset[0]).collect();
        let sum: f32 = xs.iter().sum();
        assert!(sum.abs() < 1e-3, "row centroid drifted: {sum}");

        // Mirrored pairs
        let n = xs.len();
        for i in 0..n / 2 {
            assert!((xs[i] + xs[n - 1 - i]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_spacing_stays_within_bounds() {
        let layout = BarLayout::default();
        let mut field = BarField::new(layout.clone());

        for width in [1.0, 320.0, 1200.0, 1920.0, 100_000.0] {
            field.rebuild(64, width);
            assert!(field.spacing() >= layout.spacing_min);
            assert!(field.spacing() <= layout.spacing_max);
        }
    }

    #[test]
    fn test_update_never_drops_below_floor() {
        let layout = BarLayout::default();
        let mut field = BarField::new(layout.clone());
        field.rebuild(64, 1280.0);

        field.update_frame(&[0u8; 64]);
        for bar in field.instances() {
            assert_eq!(bar.scale[1], layout.min_height);
            assert_eq!(bar.offset[1], layout.min_height / 2.0);
        }
    }

    #[test]
    fn test_bars_grow_from_common_baseline() {
        let mut field = BarField::new(BarLayout::default());
        field.rebuild(4, 1280.0);

        field.update_frame(&[0, 60, 120, 255]);
        for bar in field.instances() {
            // Bottom face sits on y = 0 regardless of height
            let bottom = bar.offset[1] - bar.scale[1] / 2.0;
            assert!(bottom.abs() < 1e-6);
        }
    }

    #[test]
    fn test_update_ignores_extra_snapshot_bins() {
        let mut field = BarField::new(BarLayout::default());
        field.rebuild(4, 1280.0);
        field.update_frame(&[255u8; 64]);
        assert_eq!(field.len(), 4);
    }

    #[test]
    fn test_hue_sweep_assigns_distinct_colors() {
        let mut field = BarField::new(BarLayout::default());
        field.rebuild(64, 1280.0);

        let first = field.instances()[0].color;
        let mid = field.instances()[32].color;
        assert_ne!(first, mid);
    }

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6);

        let green = hsl_to_rgb(120.0, 1.0, 0.5);
        assert!((green[1] - 1.0).abs() < 1e-6);
    }
}
