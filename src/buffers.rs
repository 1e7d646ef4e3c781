//! CPU-side render output, rebuilt every frame.
//!
//! Two fixed-capacity vertex streams are exposed:
//!
//! - **points**: one position and color per visible particle
//! - **segments**: trail line segments, two vertices per segment, packed
//!   contiguously across particles
//!
//! Each stream has a valid count; data past it is stale and must not be
//! drawn. Slices can be viewed as flat `f32` or raw bytes for upload.

use crate::constants::MAX_TRAIL_SEGMENTS;
use crate::trail::{write_trail_segments, Trail};
use glam::Vec3;

/// Packed point and trail-segment vertex data.
#[derive(Clone, Debug)]
pub struct RenderBuffers {
    point_positions: Vec<[f32; 3]>,
    point_colors: Vec<[f32; 3]>,
    point_count: usize,
    segment_positions: Vec<[f32; 3]>,
    segment_colors: Vec<[f32; 3]>,
    segment_count: usize,
}

impl RenderBuffers {
    /// Buffers sized for `max_particles` particles with full-length trails.
    pub fn new(max_particles: usize) -> Self {
        let segment_vertices = max_particles * MAX_TRAIL_SEGMENTS * 2;
        Self {
            point_positions: vec![[0.0; 3]; max_particles],
            point_colors: vec![[0.0; 3]; max_particles],
            point_count: 0,
            segment_positions: vec![[0.0; 3]; segment_vertices],
            segment_colors: vec![[0.0; 3]; segment_vertices],
            segment_count: 0,
        }
    }

    /// Reset both valid counts. Old data stays in place.
    #[inline]
    pub fn begin_frame(&mut self) {
        self.point_count = 0;
        self.segment_count = 0;
    }

    /// Append one point. Returns `false` once the point buffer is full.
    pub fn push_point(&mut self, position: Vec3, color: Vec3) -> bool {
        if self.point_count >= self.point_positions.len() {
            return false;
        }
        self.point_positions[self.point_count] = position.to_array();
        self.point_colors[self.point_count] = color.to_array();
        self.point_count += 1;
        true
    }

    /// Append every segment of `trail`, fading toward `color` at its head.
    /// Returns the number of segments written.
    pub fn push_trail(&mut self, trail: &Trail, color: Vec3) -> usize {
        let before = self.segment_count;
        self.segment_count = write_trail_segments(
            trail,
            color,
            &mut self.segment_positions,
            &mut self.segment_colors,
            self.segment_count,
        );
        self.segment_count - before
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Number of valid trail segments (two vertices each).
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Maximum number of segments the buffer can hold.
    #[inline]
    pub fn segment_capacity(&self) -> usize {
        self.segment_positions.len() / 2
    }

    #[inline]
    pub fn point_positions(&self) -> &[[f32; 3]] {
        &self.point_positions[..self.point_count]
    }

    #[inline]
    pub fn point_colors(&self) -> &[[f32; 3]] {
        &self.point_colors[..self.point_count]
    }

    /// Valid segment vertices; segment `k` is vertices `2k` and `2k + 1`.
    #[inline]
    pub fn segment_positions(&self) -> &[[f32; 3]] {
        &self.segment_positions[..self.segment_count * 2]
    }

    #[inline]
    pub fn segment_colors(&self) -> &[[f32; 3]] {
        &self.segment_colors[..self.segment_count * 2]
    }

    /// Segment positions as a flat `x, y, z, x, y, z, ...` slice.
    pub fn segment_positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(self.segment_positions())
    }

    pub fn segment_colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(self.segment_colors())
    }

    pub fn point_positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(self.point_positions())
    }

    pub fn point_colors_flat(&self) -> &[f32] {
        bytemuck::cast_slice(self.point_colors())
    }

    /// Raw bytes of the valid segment positions, ready for a vertex upload.
    pub fn segment_position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.segment_positions())
    }

    pub fn segment_color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.segment_colors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail_of(n: usize) -> Trail {
        let mut trail = Trail::new();
        trail.reset(Vec3::ZERO);
        for i in 1..n {
            trail.push(Vec3::new(i as f32, 0.0, 0.0), 60);
        }
        trail
    }

    #[test]
    fn test_capacity() {
        let buffers = RenderBuffers::new(10);
        assert_eq!(buffers.segment_capacity(), 10 * MAX_TRAIL_SEGMENTS);
        assert_eq!(buffers.point_count(), 0);
        assert!(buffers.segment_positions().is_empty());
    }

    #[test]
    fn test_push_and_views() {
        let mut buffers = RenderBuffers::new(4);
        assert!(buffers.push_point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE));
        assert_eq!(buffers.push_trail(&trail_of(4), Vec3::ONE), 3);
        assert_eq!(buffers.push_trail(&trail_of(3), Vec3::ONE), 2);

        assert_eq!(buffers.point_positions_flat(), &[1.0, 2.0, 3.0]);
        assert_eq!(buffers.segment_count(), 5);
        assert_eq!(buffers.segment_positions().len(), 10);
        assert_eq!(buffers.segment_positions_flat().len(), 30);
        assert_eq!(buffers.segment_position_bytes().len(), 120);
        // Second trail starts right after the first.
        assert_eq!(buffers.segment_positions()[6], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_begin_frame_resets_counts() {
        let mut buffers = RenderBuffers::new(2);
        buffers.push_point(Vec3::ZERO, Vec3::ONE);
        buffers.push_trail(&trail_of(5), Vec3::ONE);
        buffers.begin_frame();
        assert_eq!(buffers.point_count(), 0);
        assert_eq!(buffers.segment_count(), 0);
    }

    #[test]
    fn test_points_stop_at_capacity() {
        let mut buffers = RenderBuffers::new(1);
        assert!(buffers.push_point(Vec3::ZERO, Vec3::ONE));
        assert!(!buffers.push_point(Vec3::ONE, Vec3::ONE));
        assert_eq!(buffers.point_count(), 1);
    }
}
