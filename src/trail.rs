//! Per-particle trail history and its conversion to line segments.
//!
//! A [`Trail`] is a fixed-capacity history of recent positions, oldest first.
//! When full, appending shifts every sample left by one slot and writes the
//! new sample at the end. The shift is O(n) per insert, which is fine at
//! [`MAX_TRAIL_POINTS`] samples.

use crate::constants::{MAX_TRAIL_POINTS, MIN_TRAIL_POINTS};
use glam::Vec3;

/// Fixed-capacity position history, oldest sample first.
#[derive(Clone, Debug)]
pub struct Trail {
    points: [Vec3; MAX_TRAIL_POINTS],
    len: usize,
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}

impl Trail {
    pub fn new() -> Self {
        Self {
            points: [Vec3::ZERO; MAX_TRAIL_POINTS],
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recorded samples, oldest first.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points[..self.len]
    }

    /// Newest sample, if any.
    #[inline]
    pub fn head(&self) -> Option<Vec3> {
        self.points().last().copied()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Restart the history with `position` as its only sample.
    #[inline]
    pub fn reset(&mut self, position: Vec3) {
        self.points[0] = position;
        self.len = 1;
    }

    /// Append `position`, keeping at most `limit` samples.
    ///
    /// `limit` is clamped to `[MIN_TRAIL_POINTS, MAX_TRAIL_POINTS]`. If the
    /// limit shrank below the current length, the oldest samples go first.
    pub fn push(&mut self, position: Vec3, limit: usize) {
        let limit = limit.clamp(MIN_TRAIL_POINTS, MAX_TRAIL_POINTS);

        if self.len > limit {
            self.points.copy_within(self.len - limit..self.len, 0);
            self.len = limit;
        }

        if self.len < limit {
            self.points[self.len] = position;
            self.len += 1;
        } else {
            self.points.copy_within(1..limit, 0);
            self.points[limit - 1] = position;
        }
    }
}

/// Emit one line segment per consecutive pair of samples.
///
/// Segment `k` of the output occupies vertices `2k` and `2k + 1` of
/// `positions` and `colors`. Colors fade linearly from black at the oldest
/// sample to `color` at the newest. Writing starts at segment `cursor` and the
/// updated cursor is returned, so trails from many particles pack
/// contiguously. Segments that would not fit the buffers are dropped.
pub fn write_trail_segments(
    trail: &Trail,
    color: Vec3,
    positions: &mut [[f32; 3]],
    colors: &mut [[f32; 3]],
    cursor: usize,
) -> usize {
    let len = trail.len();
    if len < 2 {
        return cursor;
    }

    let capacity = positions.len().min(colors.len()) / 2;
    let points = trail.points();
    let span = (len - 1) as f32;
    let mut cursor = cursor;

    for j in 1..len {
        if cursor >= capacity {
            break;
        }
        let base = cursor * 2;
        let fade_prev = (j - 1) as f32 / span;
        let fade_curr = j as f32 / span;

        positions[base] = points[j - 1].to_array();
        positions[base + 1] = points[j].to_array();
        colors[base] = (color * fade_prev).to_array();
        colors[base + 1] = (color * fade_curr).to_array();

        cursor += 1;
    }

    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> Vec3 {
        Vec3::new(i as f32, 0.0, 0.0)
    }

    #[test]
    fn test_push_grows_until_limit() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        for i in 1..5 {
            trail.push(sample(i), 10);
        }
        assert_eq!(trail.len(), 5);
        assert_eq!(trail.head(), Some(sample(4)));
    }

    #[test]
    fn test_push_evicts_oldest_when_full() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        for i in 1..8 {
            trail.push(sample(i), 4);
        }
        assert_eq!(trail.len(), 4);
        let xs: Vec<f32> = trail.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_shrinking_limit_drops_oldest() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        for i in 1..40 {
            trail.push(sample(i), 40);
        }
        assert_eq!(trail.len(), 40);

        trail.push(sample(40), 10);
        assert_eq!(trail.len(), 10);
        let xs: Vec<f32> = trail.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, (31..=40).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_limit_is_clamped() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        for i in 1..200 {
            trail.push(sample(i), 1000);
        }
        assert_eq!(trail.len(), MAX_TRAIL_POINTS);

        let mut short = Trail::new();
        short.reset(sample(0));
        for i in 1..5 {
            short.push(sample(i), 0);
        }
        assert_eq!(short.len(), MIN_TRAIL_POINTS);
    }

    #[test]
    fn test_write_segments_fade_and_cursor() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        trail.push(sample(1), 10);
        trail.push(sample(2), 10);

        let mut positions = vec![[0.0f32; 3]; 16];
        let mut colors = vec![[0.0f32; 3]; 16];
        let color = Vec3::new(1.0, 0.5, 0.25);

        let cursor = write_trail_segments(&trail, color, &mut positions, &mut colors, 1);
        assert_eq!(cursor, 3);

        // Segment 1: samples 0 -> 1
        assert_eq!(positions[2], [0.0, 0.0, 0.0]);
        assert_eq!(positions[3], [1.0, 0.0, 0.0]);
        assert_eq!(colors[2], [0.0, 0.0, 0.0]);
        assert_eq!(colors[3], [0.5, 0.25, 0.125]);
        // Segment 2: samples 1 -> 2, newest end at full color
        assert_eq!(positions[5], [2.0, 0.0, 0.0]);
        assert_eq!(colors[5], [1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_write_segments_respects_capacity() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        for i in 1..10 {
            trail.push(sample(i), 10);
        }
        let mut positions = vec![[0.0f32; 3]; 6];
        let mut colors = vec![[0.0f32; 3]; 6];
        let cursor = write_trail_segments(&trail, Vec3::ONE, &mut positions, &mut colors, 0);
        assert_eq!(cursor, 3);
    }

    #[test]
    fn test_single_sample_emits_nothing() {
        let mut trail = Trail::new();
        trail.reset(sample(0));
        let mut positions = vec![[0.0f32; 3]; 4];
        let mut colors = vec![[0.0f32; 3]; 4];
        assert_eq!(
            write_trail_segments(&trail, Vec3::ONE, &mut positions, &mut colors, 0),
            0
        );
    }
}
