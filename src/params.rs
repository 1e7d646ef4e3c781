//! Per-frame simulation parameters and duct geometry.
//!
//! [`FlowParams`] carries the five scalars an external control surface hands
//! the simulation every frame. Out-of-range values are clamped rather than
//! rejected, so a slider can never put the simulation in an invalid state.
//!
//! [`Duct`] is the fixed box the air flows through. The freestream runs along
//! +X, Y is up and Z is lateral.

use crate::constants::{
    GROUND_CLEARANCE, INLET_THICKNESS, MAX_TRAIL_POINTS, MIN_TRAIL_POINTS, SPAWN_MARGIN,
    WALL_INSET,
};
use glam::Vec3;

/// Scalars sampled once per frame.
///
/// # Example
///
/// ```ignore
/// let params = FlowParams::default()
///     .with_wind_speed(12.0)
///     .with_particle_count(3000)
///     .with_trail_length(40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowParams {
    /// Freestream speed along +X.
    pub wind_speed: f32,
    /// Number of particles that should be simulated.
    pub particle_count: usize,
    /// Strength of the sinusoidal wake perturbations.
    pub turbulence: f32,
    /// Score a particle must exceed to become deflected.
    pub deflection_threshold: f32,
    /// Samples kept per trail.
    pub trail_length: usize,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            wind_speed: 10.0,
            particle_count: 2000,
            turbulence: 1.0,
            deflection_threshold: 0.35,
            trail_length: MAX_TRAIL_POINTS / 2,
        }
    }
}

impl FlowParams {
    const MIN_WIND_SPEED: f32 = 1e-3;
    const MIN_THRESHOLD: f32 = 1e-3;

    /// Set the freestream speed.
    pub fn with_wind_speed(mut self, speed: f32) -> Self {
        self.wind_speed = speed;
        self
    }

    /// Set the target particle count.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the turbulence intensity.
    pub fn with_turbulence(mut self, turbulence: f32) -> Self {
        self.turbulence = turbulence;
        self
    }

    /// Set the deflection threshold.
    pub fn with_deflection_threshold(mut self, threshold: f32) -> Self {
        self.deflection_threshold = threshold;
        self
    }

    /// Set the number of samples per trail.
    pub fn with_trail_length(mut self, length: usize) -> Self {
        self.trail_length = length;
        self
    }

    /// Return a copy with every field clamped into its valid range.
    ///
    /// `max_particles` is the pool capacity the count is clamped to.
    /// Non-finite floats fall back to the defaults.
    pub fn clamped(&self, max_particles: usize) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };

        Self {
            wind_speed: finite_or(self.wind_speed, defaults.wind_speed).max(Self::MIN_WIND_SPEED),
            particle_count: self.particle_count.min(max_particles),
            turbulence: finite_or(self.turbulence, defaults.turbulence).max(0.0),
            deflection_threshold: finite_or(self.deflection_threshold, defaults.deflection_threshold)
                .max(Self::MIN_THRESHOLD),
            trail_length: self.trail_length.clamp(MIN_TRAIL_POINTS, MAX_TRAIL_POINTS),
        }
    }
}

/// Geometry of the wind-tunnel duct, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duct {
    /// Extent along the flow axis (X).
    pub length: f32,
    /// Lateral extent (Z).
    pub width: f32,
    /// Vertical extent (Y).
    pub height: f32,
}

impl Default for Duct {
    fn default() -> Self {
        Self {
            length: 80.0,
            width: 30.0,
            height: 20.0,
        }
    }
}

impl Duct {
    /// Distance between the duct ends and the inlet/outlet planes.
    const PORT_INSET: f32 = 2.0;
    /// Distance a placed solid keeps from the inlet and outlet planes.
    const SOLID_PORT_CLEARANCE: f32 = 5.0;
    /// Distance a placed solid keeps from the side walls, floor and ceiling.
    const SOLID_WALL_CLEARANCE: f32 = 1.0;

    /// Create a duct with the given extents. Each extent is kept positive.
    pub fn new(length: f32, width: f32, height: f32) -> Self {
        Self {
            length: length.max(1.0),
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// X of the plane particles are spawned at.
    #[inline]
    pub fn inlet_x(&self) -> f32 {
        -self.length * 0.5 + Self::PORT_INSET
    }

    /// X past which particles are recycled.
    #[inline]
    pub fn outlet_x(&self) -> f32 {
        self.length * 0.5 - Self::PORT_INSET
    }

    /// Y of the plane the ground effect pushes away from.
    #[inline]
    pub fn floor_y(&self) -> f32 {
        -self.half_height() + WALL_INSET
    }

    /// Y of the plane the ceiling effect pushes away from.
    #[inline]
    pub fn ceiling_y(&self) -> f32 {
        self.half_height() - WALL_INSET
    }

    /// Y a fitted solid rests its lowest point on.
    #[inline]
    pub fn ground_level(&self) -> f32 {
        -self.half_height() + GROUND_CLEARANCE
    }

    /// Spawn volume at the inlet as `(min, max)` corners.
    pub fn inlet_volume(&self) -> (Vec3, Vec3) {
        let inlet = self.inlet_x();
        let hh = (self.half_height() - SPAWN_MARGIN).max(0.0);
        let hw = (self.half_width() - SPAWN_MARGIN).max(0.0);
        (
            Vec3::new(inlet, -hh, -hw),
            Vec3::new(inlet + INLET_THICKNESS, hh, hw),
        )
    }

    /// Whether a particle at `position` has left the simulated domain.
    ///
    /// The inlet side is open: only the outlet and the four walls recycle.
    /// A non-finite position always counts as exited.
    #[inline]
    pub fn has_exited(&self, position: Vec3) -> bool {
        !position.is_finite()
            || position.x > self.outlet_x()
            || position.y.abs() > self.half_height()
            || position.z.abs() > self.half_width()
    }

    /// Clamp an externally driven solid position to stay clear of the
    /// inlet, outlet and walls.
    pub fn clamp_solid_position(&self, position: Vec3) -> Vec3 {
        let x_min = self.inlet_x() + Self::SOLID_PORT_CLEARANCE;
        let x_max = (self.outlet_x() - Self::SOLID_PORT_CLEARANCE).max(x_min);
        let y_lim = (self.half_height() - Self::SOLID_WALL_CLEARANCE).max(0.0);
        let z_lim = (self.half_width() - Self::SOLID_WALL_CLEARANCE).max(0.0);
        Vec3::new(
            position.x.clamp(x_min, x_max),
            position.y.clamp(-y_lim, y_lim),
            position.z.clamp(-z_lim, z_lim),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_clamping() {
        let raw = FlowParams {
            wind_speed: -3.0,
            particle_count: 10_000,
            turbulence: -1.0,
            deflection_threshold: 0.0,
            trail_length: 500,
        };
        let p = raw.clamped(4000);
        assert!(p.wind_speed > 0.0);
        assert_eq!(p.particle_count, 4000);
        assert_eq!(p.turbulence, 0.0);
        assert!(p.deflection_threshold > 0.0);
        assert_eq!(p.trail_length, MAX_TRAIL_POINTS);

        let short = FlowParams::default().with_trail_length(0).clamped(4000);
        assert_eq!(short.trail_length, MIN_TRAIL_POINTS);
    }

    #[test]
    fn test_params_non_finite_falls_back() {
        let p = FlowParams::default()
            .with_wind_speed(f32::NAN)
            .with_turbulence(f32::INFINITY)
            .clamped(100);
        assert_eq!(p.wind_speed, FlowParams::default().wind_speed);
        assert_eq!(p.turbulence, FlowParams::default().turbulence);
    }

    #[test]
    fn test_duct_ports() {
        let duct = Duct::default();
        assert!((duct.inlet_x() - (-38.0)).abs() < 1e-6);
        assert!((duct.outlet_x() - 38.0).abs() < 1e-6);
        assert!((duct.floor_y() - (-9.8)).abs() < 1e-6);
        assert!((duct.ceiling_y() - 9.8).abs() < 1e-6);
    }

    #[test]
    fn test_duct_exit() {
        let duct = Duct::default();
        assert!(!duct.has_exited(Vec3::ZERO));
        assert!(!duct.has_exited(Vec3::new(-39.0, 0.0, 0.0)));
        assert!(duct.has_exited(Vec3::new(38.5, 0.0, 0.0)));
        assert!(duct.has_exited(Vec3::new(0.0, 10.5, 0.0)));
        assert!(duct.has_exited(Vec3::new(0.0, -10.5, 0.0)));
        assert!(duct.has_exited(Vec3::new(0.0, 0.0, 15.5)));
        assert!(duct.has_exited(Vec3::new(0.0, 0.0, -15.5)));
        assert!(duct.has_exited(Vec3::NAN));
        assert!(duct.has_exited(Vec3::new(0.0, f32::INFINITY, 0.0)));
    }

    #[test]
    fn test_clamp_solid_position() {
        let duct = Duct::default();
        let p = duct.clamp_solid_position(Vec3::new(-100.0, 100.0, -100.0));
        assert!((p.x - (-33.0)).abs() < 1e-6);
        assert!((p.y - 9.0).abs() < 1e-6);
        assert!((p.z - (-14.0)).abs() < 1e-6);
    }
}
