//! Particle coloring.
//!
//! Visible particles are colored by sampling a piecewise-linear [`ColorRamp`]
//! at their normalized speed, nudged toward the warm end by swirl exposure.
//!
//! ```ignore
//! let ramp = ColorRamp::default();
//! let color = ramp.color_for_particle(speed, wind_speed, vorticity);
//! ```

use crate::constants::{COLOR_SPEED_RANGE, COLOR_VORTICITY_CAP, COLOR_VORTICITY_GAIN};
use glam::Vec3;

/// A ramp control point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorStop {
    /// Position on the ramp, 0.0 to 1.0.
    pub t: f32,
    /// RGB, 0.0 to 1.0 per channel.
    pub color: Vec3,
}

impl ColorStop {
    pub fn new(t: f32, color: Vec3) -> Self {
        Self { t, color }
    }

    /// Stop from a packed `0xRRGGBB` color.
    pub fn hex(t: f32, rgb: u32) -> Self {
        Self::new(t, hex_to_rgb(rgb))
    }
}

/// Unpack `0xRRGGBB` into RGB floats.
pub fn hex_to_rgb(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

/// Piecewise-linear color gradient over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl Default for ColorRamp {
    /// Deep blue through cyan, teal, yellow and orange to white.
    fn default() -> Self {
        Self::new(vec![
            ColorStop::hex(0.0, 0x0b1aff),
            ColorStop::hex(0.2, 0x00c2ff),
            ColorStop::hex(0.4, 0x00ffc8),
            ColorStop::hex(0.6, 0xf8ff4b),
            ColorStop::hex(0.8, 0xff8c37),
            ColorStop::hex(1.0, 0xffffff),
        ])
    }
}

impl ColorRamp {
    /// Build a ramp. Stops are sorted by `t`; an empty list yields white.
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.retain(|s| s.t.is_finite());
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        if stops.is_empty() {
            stops.push(ColorStop::new(0.0, Vec3::ONE));
        }
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at `t`, clamped to `[0, 1]`. Positions outside the stop range
    /// take the nearest end color.
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let first = self.stops[0];
        if t <= first.t {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if t <= next.t {
                let span = next.t - prev.t;
                let local = if span > 0.0 { ((t - prev.t) / span).clamp(0.0, 1.0) } else { 1.0 };
                return prev.color.lerp(next.color, local);
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// Color for a particle moving at `speed` with swirl exposure `vorticity`,
    /// relative to the freestream `wind_speed`.
    pub fn color_for_particle(&self, speed: f32, wind_speed: f32, vorticity: f32) -> Vec3 {
        let normalized = (speed / (wind_speed * COLOR_SPEED_RANGE + 1e-6)).clamp(0.0, 1.0);
        let swirl = (vorticity.abs() * COLOR_VORTICITY_GAIN).clamp(0.0, COLOR_VORTICITY_CAP);
        self.sample(normalized + swirl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb(0xffffff), Vec3::ONE);
        assert_eq!(hex_to_rgb(0x000000), Vec3::ZERO);
        assert_eq!(hex_to_rgb(0xff0000), Vec3::X);
    }

    #[test]
    fn test_sample_endpoints_and_clamp() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.sample(0.0), hex_to_rgb(0x0b1aff));
        assert!((ramp.sample(1.0) - Vec3::ONE).length() < 1e-6);
        assert_eq!(ramp.sample(-5.0), ramp.sample(0.0));
        assert_eq!(ramp.sample(7.0), ramp.sample(1.0));
        assert_eq!(ramp.sample(f32::NAN), ramp.sample(0.0));
    }

    #[test]
    fn test_sample_hits_stops_and_interpolates() {
        let ramp = ColorRamp::default();
        assert!((ramp.sample(0.4) - hex_to_rgb(0x00ffc8)).length() < 1e-5);
        let mid = ramp.sample(0.3);
        let expected = hex_to_rgb(0x00c2ff).lerp(hex_to_rgb(0x00ffc8), 0.5);
        assert!((mid - expected).length() < 1e-5);
    }

    #[test]
    fn test_sample_is_continuous() {
        let ramp = ColorRamp::default();
        let mut prev = ramp.sample(0.0);
        for i in 1..=1000 {
            let c = ramp.sample(i as f32 / 1000.0);
            assert!((c - prev).length() < 0.05);
            prev = c;
        }
    }

    #[test]
    fn test_color_for_particle() {
        let ramp = ColorRamp::default();
        // Stationary, no swirl: coldest color.
        assert_eq!(ramp.color_for_particle(0.0, 10.0, 0.0), ramp.sample(0.0));
        // Freestream speed maps to 1 / 1.2 of the ramp.
        let c = ramp.color_for_particle(10.0, 10.0, 0.0);
        assert!((c - ramp.sample(10.0 / 12.0)).length() < 1e-4);
        // Swirl adds at most half the ramp.
        let swirly = ramp.color_for_particle(0.0, 10.0, -100.0);
        assert!((swirly - ramp.sample(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_custom_ramp_sorted() {
        let ramp = ColorRamp::new(vec![
            ColorStop::new(1.0, Vec3::ONE),
            ColorStop::new(0.0, Vec3::ZERO),
        ]);
        assert_eq!(ramp.stops()[0].t, 0.0);
        assert!((ramp.sample(0.25) - Vec3::splat(0.25)).length() < 1e-6);
        assert_eq!(ColorRamp::new(Vec::new()).sample(0.5), Vec3::ONE);
    }
}
