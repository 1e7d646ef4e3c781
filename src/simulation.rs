//! Simulation builder and per-frame driver.

use crate::buffers::RenderBuffers;
use crate::constants::{DEFAULT_MAX_PARTICLES, MAX_FRAME_DELTA};
use crate::forces::FieldContext;
use crate::params::{Duct, FlowParams};
use crate::particle::Particle;
use crate::pool::ParticlePool;
use crate::spawn::InletSpawner;
use crate::surface::SolidSurface;
use crate::time::Time;
use crate::visuals::ColorRamp;
use glam::{Affine3A, Vec3};

/// Diagnostics snapshot, see [`FlowSimulation::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimStats {
    pub active_count: usize,
    /// Particles currently drawing a trail.
    pub visible_count: usize,
    pub surface_loaded: bool,
    /// Size of the solid's tight bound.
    pub surface_extent: Option<Vec3>,
    pub trail_segments: usize,
    /// Lowest world-space point of the solid.
    pub surface_min_y: Option<f32>,
}

/// Tracer particles advected through a duct around an optional solid.
///
/// Configure with the `with_*` builders, then drive it with
/// [`update`](Self::update) (explicit delta) or [`tick`](Self::tick)
/// (wall clock). Render output is in [`buffers`](Self::buffers).
///
/// ```ignore
/// let mesh = SurfaceMesh::cuboid(Vec3::new(2.0, 0.7, 0.9))?;
/// let mut sim = FlowSimulation::new()
///     .with_params(FlowParams::default().with_particle_count(3000))
///     .with_seed(7);
/// sim.set_surface(SolidSurface::fitted(mesh, sim.duct()));
/// sim.update(1.0 / 60.0, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FlowSimulation {
    params: FlowParams,
    duct: Duct,
    surface: Option<SolidSurface>,
    pool: ParticlePool,
    spawner: InletSpawner,
    ramp: ColorRamp,
    buffers: RenderBuffers,
    clock: Time,
    frame: u64,
}

impl Default for FlowSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowSimulation {
    /// Default duct and parameters, [`DEFAULT_MAX_PARTICLES`] slots, no solid.
    pub fn new() -> Self {
        Self {
            params: FlowParams::default().clamped(DEFAULT_MAX_PARTICLES),
            duct: Duct::default(),
            surface: None,
            pool: ParticlePool::new(DEFAULT_MAX_PARTICLES),
            spawner: InletSpawner::from_entropy(),
            ramp: ColorRamp::default(),
            buffers: RenderBuffers::new(DEFAULT_MAX_PARTICLES),
            clock: Time::new(),
            frame: 0,
        }
    }

    /// Set the pool capacity. Reallocates, so call it before the first frame.
    pub fn with_max_particles(mut self, max_particles: usize) -> Self {
        let max_particles = max_particles.max(1);
        self.pool = ParticlePool::new(max_particles);
        self.buffers = RenderBuffers::new(max_particles);
        self.params = self.params.clamped(max_particles);
        self
    }

    pub fn with_duct(mut self, duct: Duct) -> Self {
        self.duct = duct;
        self
    }

    pub fn with_params(mut self, params: FlowParams) -> Self {
        self.set_params(params);
        self
    }

    /// Make spawning deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.spawner = InletSpawner::from_seed(seed);
        self
    }

    pub fn with_surface(mut self, surface: SolidSurface) -> Self {
        self.set_surface(surface);
        self
    }

    pub fn with_color_ramp(mut self, ramp: ColorRamp) -> Self {
        self.ramp = ramp;
        self
    }

    /// Replace the per-frame parameters. Out-of-range values are clamped.
    pub fn set_params(&mut self, params: FlowParams) {
        self.params = params.clamped(self.pool.capacity());
    }

    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    pub fn duct(&self) -> &Duct {
        &self.duct
    }

    /// Attach a solid, replacing any previous one.
    pub fn set_surface(&mut self, surface: SolidSurface) {
        let bounds = surface.tight_bounds();
        log::info!(
            "Attached surface: {} triangles, extent {:?}, min y {:.3}",
            surface.mesh().triangles().len(),
            bounds.size(),
            bounds.min.y
        );
        self.surface = Some(surface);
    }

    /// Detach the solid. Surface-dependent forces switch off.
    pub fn clear_surface(&mut self) -> Option<SolidSurface> {
        let old = self.surface.take();
        if old.is_some() {
            log::info!("Detached surface");
        }
        old
    }

    pub fn surface(&self) -> Option<&SolidSurface> {
        self.surface.as_ref()
    }

    /// Replace the solid's world transform. Returns whether it changed.
    pub fn set_surface_transform(&mut self, transform: Affine3A) -> bool {
        match self.surface.as_mut() {
            Some(surface) => surface.set_transform(transform),
            None => false,
        }
    }

    /// Move the solid, keeping it clear of the inlet, outlet and walls.
    /// Returns whether the transform changed.
    pub fn set_surface_position(&mut self, position: Vec3) -> bool {
        let position = self.duct.clamp_solid_position(position);
        match self.surface.as_mut() {
            Some(surface) => surface.set_position(position),
            None => false,
        }
    }

    /// Advance one frame by `delta` seconds at simulation time `time`.
    ///
    /// `delta` is clamped to `[0, MAX_FRAME_DELTA]`. Does nothing while paused.
    pub fn update(&mut self, delta: f32, time: f32) {
        if self.clock.is_paused() {
            return;
        }
        let delta = if delta.is_finite() { delta.clamp(0.0, MAX_FRAME_DELTA) } else { 0.0 };
        let speed = self.params.wind_speed;

        self.pool
            .resize(self.params.particle_count, &mut self.spawner, &self.duct, speed);

        let ctx = FieldContext {
            wind_speed: speed,
            turbulence: self.params.turbulence,
            deflection_threshold: self.params.deflection_threshold,
            time,
            duct: &self.duct,
            surface: self.surface.as_ref(),
        };
        self.pool.integrate(&ctx, delta);
        self.pool.recycle_exited(&mut self.spawner, &self.duct, speed);

        self.buffers.begin_frame();
        let trail_length = self.params.trail_length;
        for p in self.pool.active_mut() {
            if !p.is_visible() {
                continue;
            }
            p.color = self.ramp.color_for_particle(p.speed(), speed, p.vorticity);
            p.record_trail(trail_length);
            self.buffers.push_trail(&p.trail, p.color);
            self.buffers.push_point(p.position, p.color);
        }

        self.frame += 1;
    }

    /// Advance one frame using the internal wall clock.
    pub fn tick(&mut self) {
        let (elapsed, delta) = self.clock.update();
        self.update(delta, elapsed);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// The frame clock driving [`tick`](Self::tick).
    pub fn clock(&self) -> &Time {
        &self.clock
    }

    /// Mutable frame clock, e.g. to fix the step or change the time scale.
    pub fn clock_mut(&mut self) -> &mut Time {
        &mut self.clock
    }

    /// Deactivate every particle and refill the active window at the inlet.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.buffers.begin_frame();
        self.clock.reset();
        self.frame = 0;
        self.pool.resize(
            self.params.particle_count,
            &mut self.spawner,
            &self.duct,
            self.params.wind_speed,
        );
        log::info!("Simulation reset, {} particles", self.pool.active_count());
    }

    /// Frames advanced since creation or the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The active particles.
    pub fn particles(&self) -> &[Particle] {
        self.pool.active()
    }

    /// Direct access to the active particles, e.g. to place probes in tests.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.pool.active_mut()
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn buffers(&self) -> &RenderBuffers {
        &self.buffers
    }

    pub fn stats(&self) -> SimStats {
        let bounds = self.surface.as_ref().map(|s| s.tight_bounds());
        SimStats {
            active_count: self.pool.active_count(),
            visible_count: self.pool.active().iter().filter(|p| p.is_visible()).count(),
            surface_loaded: self.surface.is_some(),
            surface_extent: bounds.map(|b| b.size()),
            trail_segments: self.buffers.segment_count(),
            surface_min_y: bounds.map(|b| b.min.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceMesh;

    fn small_sim() -> FlowSimulation {
        FlowSimulation::new()
            .with_max_particles(200)
            .with_params(FlowParams::default().with_particle_count(150))
            .with_seed(11)
    }

    #[test]
    fn test_first_update_fills_window() {
        let mut sim = small_sim();
        assert_eq!(sim.stats().active_count, 0);
        sim.update(1.0 / 60.0, 0.0);
        assert_eq!(sim.stats().active_count, 150);
        assert!(!sim.stats().surface_loaded);
        assert_eq!(sim.frame(), 1);
    }

    #[test]
    fn test_params_clamped_to_capacity() {
        let sim = small_sim().with_params(FlowParams::default().with_particle_count(10_000));
        assert_eq!(sim.params().particle_count, 200);
    }

    #[test]
    fn test_pause_freezes_frames() {
        let mut sim = small_sim();
        sim.update(1.0 / 60.0, 0.0);
        let before: Vec<Vec3> = sim.particles().iter().map(|p| p.position).collect();
        sim.pause();
        sim.update(1.0 / 60.0, 0.1);
        sim.tick();
        let after: Vec<Vec3> = sim.particles().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
        assert_eq!(sim.frame(), 1);

        sim.resume();
        sim.update(1.0 / 60.0, 0.2);
        assert_eq!(sim.frame(), 2);
    }

    #[test]
    fn test_tick_follows_clock_settings() {
        let mut sim = small_sim();
        sim.clock_mut().set_fixed_delta(Some(0.01));
        sim.clock_mut().set_time_scale(2.0);
        sim.tick();
        sim.tick();
        assert_eq!(sim.frame(), 2);
        assert!((sim.clock().elapsed() - 0.04).abs() < 1e-6);

        // Pausing through the clock stops the simulation too.
        sim.clock_mut().toggle_pause();
        assert!(sim.is_paused());
        sim.tick();
        sim.update(1.0 / 60.0, 1.0);
        assert_eq!(sim.frame(), 2);

        sim.toggle_pause();
        sim.clock_mut().set_max_delta(0.005);
        sim.tick();
        assert_eq!(sim.frame(), 3);
        assert!((sim.clock().delta() - 0.005).abs() < 1e-6);
    }

    #[test]
    fn test_reset_respawns_at_inlet() {
        let mut sim = small_sim();
        for i in 0..30 {
            sim.update(1.0 / 60.0, i as f32 / 60.0);
        }
        sim.reset();
        let (min, max) = sim.duct().inlet_volume();
        assert_eq!(sim.particles().len(), 150);
        assert!(sim
            .particles()
            .iter()
            .all(|p| p.position.cmpge(min).all() && p.position.cmple(max).all()));
        assert_eq!(sim.stats().trail_segments, 0);
    }

    #[test]
    fn test_surface_stats_and_position_clamp() {
        let mesh = SurfaceMesh::cuboid(Vec3::new(2.0, 1.0, 1.0)).unwrap();
        let mut sim = small_sim();
        let surface = SolidSurface::fitted(mesh, sim.duct());
        sim.set_surface(surface);

        let stats = sim.stats();
        assert!(stats.surface_loaded);
        assert!((stats.surface_min_y.unwrap() - sim.duct().ground_level()).abs() < 1e-3);
        assert!(stats.surface_extent.unwrap().x > 0.0);

        assert!(sim.set_surface_position(Vec3::new(1000.0, 0.0, 0.0)));
        let x = sim.surface().unwrap().transform().translation.x;
        assert!((x - (sim.duct().outlet_x() - 5.0)).abs() < 1e-4);

        assert!(sim.clear_surface().is_some());
        assert!(!sim.set_surface_position(Vec3::ZERO));
        assert_eq!(sim.stats().surface_extent, None);
    }

    #[test]
    fn test_huge_delta_is_clamped() {
        let mut sim = small_sim();
        sim.update(10.0, 0.0);
        // A clamped step moves freestream particles at most 10 * 5 * 0.05 = 2.5 units.
        let inlet = sim.duct().inlet_x();
        assert!(sim.particles().iter().all(|p| p.position.x < inlet + 0.4 + 3.0));
    }
}
