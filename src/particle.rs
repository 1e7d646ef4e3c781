//! Tracer particle state.
//!
//! Every particle is a two-state automaton:
//!
//! | State | Meaning |
//! |-------|---------|
//! | [`Deflection::Pristine`] | flowing freely, accumulating a deflection score |
//! | [`Deflection::Deflected`] | has interacted with the solid; trail recording on |
//!
//! The only transitions are `Pristine -> Deflected` (score above threshold, or
//! a near-wall event) and back to `Pristine` through a respawn. All of them go
//! through [`Particle::add_deflection_score`] and [`Particle::activate_trail`].

use crate::constants::SCORE_DECAY_RATE;
use crate::trail::Trail;
use glam::Vec3;

/// Whether a particle has interacted with the solid since it was spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deflection {
    /// Free flow. The deflection score is tracked and decays over time.
    #[default]
    Pristine,
    /// Sticky until the particle is recycled.
    Deflected,
}

/// A single tracer particle.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Accumulated by the force field, reset every sub-step.
    pub acceleration: Vec3,
    /// Smoothed swirl exposure.
    pub vorticity: f32,
    /// RGB color, refreshed every frame while visible.
    pub color: Vec3,
    /// Seconds since the last (re)spawn.
    pub age: f32,
    pub trail: Trail,
    deflection: Deflection,
    score: f32,
    visible: bool,
    active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self::new()
    }
}

impl Particle {
    /// An inactive particle with zeroed state.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            vorticity: 0.0,
            color: Vec3::ZERO,
            age: 0.0,
            trail: Trail::new(),
            deflection: Deflection::Pristine,
            score: 0.0,
            visible: false,
            active: false,
        }
    }

    /// An active, pristine particle at `position` moving with `velocity`.
    pub fn spawned(position: Vec3, velocity: Vec3) -> Self {
        let mut p = Self::new();
        p.respawn(position, velocity);
        p
    }

    /// Reinitialize at `position` with `velocity`, clearing every flag.
    pub fn respawn(&mut self, position: Vec3, velocity: Vec3) {
        self.position = position;
        self.velocity = velocity;
        self.acceleration = Vec3::ZERO;
        self.vorticity = 0.0;
        self.age = 0.0;
        self.deflection = Deflection::Pristine;
        self.score = 0.0;
        self.visible = false;
        self.reset_trail();
        self.active = true;
    }

    /// Take the particle out of the active window and zero its state.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.acceleration = Vec3::ZERO;
        self.vorticity = 0.0;
        self.deflection = Deflection::Pristine;
        self.score = 0.0;
        self.visible = false;
        self.trail.clear();
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn deflection(&self) -> Deflection {
        self.deflection
    }

    #[inline]
    pub fn is_deflected(&self) -> bool {
        self.deflection == Deflection::Deflected
    }

    /// Whether the trail holds renderable data.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn deflection_score(&self) -> f32 {
        self.score
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Add evidence of interaction and promote to deflected once the score
    /// exceeds `threshold`.
    #[inline]
    pub fn add_deflection_score(&mut self, amount: f32, threshold: f32) {
        self.score += amount;
        if self.deflection == Deflection::Pristine && self.score > threshold {
            self.activate_trail();
        }
    }

    /// Let the score relax toward zero while pristine.
    #[inline]
    pub fn decay_deflection_score(&mut self, dt: f32) {
        if self.deflection == Deflection::Pristine {
            self.score = (self.score - SCORE_DECAY_RATE * dt).max(0.0);
        }
    }

    /// Switch trail recording on. The first call marks the particle deflected
    /// and restarts its trail at the current position; later calls do nothing.
    pub fn activate_trail(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        self.deflection = Deflection::Deflected;
        self.reset_trail();
    }

    /// Restart the trail at the current position.
    #[inline]
    pub fn reset_trail(&mut self) {
        self.trail.reset(self.position);
    }

    /// Append the current position to the trail, keeping at most `limit`
    /// samples. Pristine particles keep an empty trail.
    pub fn record_trail(&mut self, limit: usize) {
        if !self.is_deflected() {
            self.trail.clear();
            return;
        }
        self.trail.push(self.position, limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_is_pristine() {
        let p = Particle::spawned(Vec3::X, Vec3::Y);
        assert!(p.is_active());
        assert!(!p.is_deflected());
        assert!(!p.is_visible());
        assert_eq!(p.trail.len(), 1);
        assert_eq!(p.deflection_score(), 0.0);
    }

    #[test]
    fn test_score_threshold_promotes() {
        let mut p = Particle::spawned(Vec3::ZERO, Vec3::X);
        p.add_deflection_score(0.2, 0.35);
        assert_eq!(p.deflection(), Deflection::Pristine);
        p.add_deflection_score(0.2, 0.35);
        assert_eq!(p.deflection(), Deflection::Deflected);
        assert!(p.is_visible());
    }

    #[test]
    fn test_deflection_is_sticky() {
        let mut p = Particle::spawned(Vec3::ZERO, Vec3::X);
        p.activate_trail();
        for _ in 0..1000 {
            p.decay_deflection_score(0.1);
            p.add_deflection_score(0.0, 1e9);
        }
        assert!(p.is_deflected());
    }

    #[test]
    fn test_score_decays_without_going_negative() {
        let mut p = Particle::spawned(Vec3::ZERO, Vec3::X);
        p.add_deflection_score(0.05, f32::INFINITY);
        let mut last = p.deflection_score();
        for _ in 0..10 {
            p.decay_deflection_score(0.1);
            let s = p.deflection_score();
            assert!(s < last || s == 0.0);
            assert!(s >= 0.0);
            last = s;
        }
        assert_eq!(p.deflection_score(), 0.0);
    }

    #[test]
    fn test_activate_discards_history() {
        let mut p = Particle::spawned(Vec3::ZERO, Vec3::X);
        p.position = Vec3::new(3.0, 0.0, 0.0);
        p.activate_trail();
        assert_eq!(p.trail.points(), &[Vec3::new(3.0, 0.0, 0.0)]);

        // Idempotent
        p.position = Vec3::new(4.0, 0.0, 0.0);
        p.record_trail(10);
        p.activate_trail();
        assert_eq!(p.trail.len(), 2);
    }

    #[test]
    fn test_record_requires_deflection() {
        let mut p = Particle::spawned(Vec3::ZERO, Vec3::X);
        p.record_trail(10);
        assert_eq!(p.trail.len(), 0);
    }

    #[test]
    fn test_deactivate_zeroes_state() {
        let mut p = Particle::spawned(Vec3::ZERO, Vec3::X);
        p.activate_trail();
        p.vorticity = 2.0;
        p.deactivate();
        assert!(!p.is_active());
        assert!(!p.is_deflected());
        assert!(!p.is_visible());
        assert_eq!(p.vorticity, 0.0);
        assert!(p.trail.is_empty());
    }
}
