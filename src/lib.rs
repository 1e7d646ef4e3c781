//! # ductflow - wind-tunnel airflow particles
//!
//! Tracer particles advected through a rectangular duct around a static solid,
//! with trails that light up once a particle has interacted with the solid.
//!
//! The crate is a pure simulation core: it consumes a triangulated surface, a
//! world transform for it and a handful of scalar parameters, and produces
//! flat position/color buffers for points and trail segments every frame.
//! Rendering, asset loading and UI are left to the caller.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ductflow::prelude::*;
//!
//! fn main() -> Result<(), MeshError> {
//!     let mesh = SurfaceMesh::cuboid(Vec3::new(2.0, 0.7, 0.9))?;
//!     let mut sim = FlowSimulation::new()
//!         .with_params(FlowParams::default().with_wind_speed(12.0))
//!         .with_seed(42);
//!     sim.set_surface(SolidSurface::fitted(mesh, sim.duct()));
//!
//!     for frame in 0..600 {
//!         sim.update(1.0 / 60.0, frame as f32 / 60.0);
//!     }
//!     let segments = sim.buffers().segment_positions_flat();
//!     println!("{} trail segments", segments.len() / 6);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! A fixed pool of [`Particle`]s is allocated once. Each frame the active
//! window is resized to the requested count, every active particle runs two
//! integration sub-steps, and particles that leave the duct are respawned at
//! the inlet.
//!
//! ### Deflection
//!
//! Every force that bends a particle's path adds to its deflection score.
//! Once the score exceeds the threshold, or the particle comes close to the
//! wall, it becomes [`Deflection::Deflected`] for the rest of its life and its
//! trail starts recording.
//!
//! ### Forces
//!
//! | Rule | Effect |
//! |------|--------|
//! | [`ForceRule::Freestream`] | relax toward the wind |
//! | [`ForceRule::GroundEffect`] | keep off floor and ceiling |
//! | [`ForceRule::PotentialFlow`] | bend around the solid's cross-sections |
//! | [`ForceRule::SurfaceSliding`] | no-through condition and boundary layer |
//! | [`ForceRule::WakeVortex`] | swirl behind the solid |
//! | [`ForceRule::AmbientTurbulence`] | jitter deflected particles downstream |
//!
//! ## Features
//!
//! - `parallel` (default): integrate particles on the rayon thread pool
//! - `serde`: (de)serialize [`FlowParams`], [`Duct`] and [`ColorRamp`]

pub mod buffers;
pub mod constants;
pub mod error;
pub mod forces;
pub mod params;
pub mod particle;
pub mod pool;
mod simulation;
pub mod spatial;
pub mod spawn;
pub mod surface;
pub mod time;
pub mod trail;
pub mod visuals;

pub use buffers::RenderBuffers;
pub use error::MeshError;
pub use forces::{FieldContext, ForceRule};
pub use glam::{Affine3A, Quat, Vec3};
pub use params::{Duct, FlowParams};
pub use particle::{Deflection, Particle};
pub use pool::ParticlePool;
pub use simulation::{FlowSimulation, SimStats};
pub use spawn::InletSpawner;
pub use surface::{SolidSurface, Station, SurfaceMesh};
pub use time::Time;
pub use trail::Trail;
pub use visuals::{ColorRamp, ColorStop};

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        Affine3A, ColorRamp, Deflection, Duct, FlowParams, FlowSimulation, MeshError, Particle,
        Quat, SimStats, SolidSurface, SurfaceMesh, Vec3,
    };
}
