//! Fixed camera framing the bar row from above and behind.

use glam::{Mat4, Vec3};

use crate::params::{BarLayout, RenderConfig};

/// Camera that pulls back just far enough to frame the whole row.
pub struct CameraRig {
    fov_degrees: f32,
    near_plane: f32,
    far_plane: f32,
    aspect: f32,
    height: f32,
    min_distance: f32,
}

impl CameraRig {
    pub fn new(render: &RenderConfig, layout: &BarLayout) -> Self {
        Self {
            fov_degrees: render.fov_degrees,
            near_plane: render.near_plane,
            far_plane: render.far_plane,
            aspect: render.aspect_ratio(),
            height: layout.camera_height,
            min_distance: layout.camera_min_distance,
        }
    }

    /// Track the window aspect across resizes
    pub fn set_viewport(&mut self, width_px: u32, height_px: u32) {
        if height_px > 0 {
            self.aspect = width_px as f32 / height_px as f32;
        }
    }

    /// Pull-back distance for a row of `bar_count` bars at `spacing`
    pub fn distance_for(&self, bar_count: usize, spacing: f32) -> f32 {
        (bar_count as f32 * spacing).max(self.min_distance)
    }

    /// View-projection matrix framing the row, eye looking at the origin
    pub fn view_proj(&self, bar_count: usize, spacing: f32) -> Mat4 {
        let eye = Vec3::new(0.0, self.height, self.distance_for(bar_count, spacing));
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near_plane,
            self.far_plane,
        );
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(&RenderConfig::default(), &BarLayout::default())
    }

    #[test]
    fn test_distance_never_closer_than_minimum() {
        let rig = rig();
        assert_eq!(rig.distance_for(4, 0.6), 45.0);
        assert_eq!(rig.distance_for(64, 1.4), 64.0 * 1.4);
    }

    #[test]
    fn test_wider_rows_push_the_camera_back() {
        let rig = rig();
        assert!(rig.distance_for(64, 1.4) > rig.distance_for(64, 0.8));
    }

    #[test]
    fn test_view_proj_is_finite_and_nontrivial() {
        let rig = rig();
        let vp = rig.view_proj(64, 1.0);
        assert_ne!(vp, Mat4::IDENTITY);
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
