//! Fixed-capacity particle pool and the sub-stepped integrator.
//!
//! Particles are allocated once and reused. The *active window* is the prefix
//! `[0, active_count)`: growing the window spawns at the inlet, shrinking
//! deactivates the tail in place. There is no compaction.

use crate::constants::{ADVECTION_SCALE, SUB_STEPS, VELOCITY_DAMPING};
use crate::forces::{apply_all, FieldContext};
use crate::params::Duct;
use crate::particle::Particle;
use crate::spawn::InletSpawner;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Advance one particle by `delta` seconds in [`SUB_STEPS`] equal sub-steps.
///
/// Each sub-step: decay the pristine score, rebuild acceleration from every
/// force rule, integrate velocity, damp the deviation from the freestream,
/// then advect position.
pub fn advance(p: &mut Particle, ctx: &FieldContext, delta: f32) {
    let sub_delta = delta / SUB_STEPS as f32;
    let freestream = ctx.freestream();

    for _ in 0..SUB_STEPS {
        p.decay_deflection_score(sub_delta);
        p.acceleration = glam::Vec3::ZERO;
        apply_all(p, ctx);

        p.velocity += p.acceleration * sub_delta;
        p.velocity = freestream + (p.velocity - freestream) * VELOCITY_DAMPING;
        p.position += p.velocity * (sub_delta * ADVECTION_SCALE);
    }

    p.age += delta;
}

/// Owns every particle slot and the active window.
#[derive(Clone, Debug)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    active_count: usize,
}

impl ParticlePool {
    /// Allocate `capacity` inactive particles.
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::new(); capacity],
            active_count: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// The active window.
    #[inline]
    pub fn active(&self) -> &[Particle] {
        &self.particles[..self.active_count]
    }

    #[inline]
    pub fn active_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.active_count]
    }

    /// Every slot, active or not.
    #[inline]
    pub fn all(&self) -> &[Particle] {
        &self.particles
    }

    /// Move the active window to `target` (clamped to capacity).
    ///
    /// New slots are spawned at the inlet; dropped slots are deactivated.
    pub fn resize(&mut self, target: usize, spawner: &mut InletSpawner, duct: &Duct, speed: f32) {
        let target = target.min(self.capacity());
        if target > self.active_count {
            for p in &mut self.particles[self.active_count..target] {
                spawner.respawn(p, duct, speed);
            }
            log::debug!("Spawned {} particles", target - self.active_count);
        } else if target < self.active_count {
            for p in &mut self.particles[target..self.active_count] {
                p.deactivate();
            }
            log::debug!("Deactivated {} particles", self.active_count - target);
        }
        self.active_count = target;
    }

    /// Deactivate everything.
    pub fn clear(&mut self) {
        for p in &mut self.particles {
            p.deactivate();
        }
        self.active_count = 0;
    }

    /// Integrate every active particle by `delta` seconds.
    ///
    /// Particles are independent within a frame, so with the `parallel`
    /// feature the work is spread over the rayon pool.
    pub fn integrate(&mut self, ctx: &FieldContext, delta: f32) {
        let active = &mut self.particles[..self.active_count];

        #[cfg(feature = "parallel")]
        active.par_iter_mut().for_each(|p| advance(p, ctx, delta));

        #[cfg(not(feature = "parallel"))]
        active.iter_mut().for_each(|p| advance(p, ctx, delta));
    }

    /// Respawn every active particle that has left `duct`. Returns how many.
    pub fn recycle_exited(&mut self, spawner: &mut InletSpawner, duct: &Duct, speed: f32) -> usize {
        let mut recycled = 0;
        for p in &mut self.particles[..self.active_count] {
            if duct.has_exited(p.position) {
                spawner.respawn(p, duct, speed);
                recycled += 1;
            }
        }
        recycled
    }
}
