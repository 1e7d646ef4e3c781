//! Headless runner: a box-shaped solid in the default duct.
//!
//! Usage: `ductflow [particles] [frames]`. Set `RUST_LOG=debug` for detail.

use ductflow::prelude::*;
use std::error::Error;

fn parse_arg<T: std::str::FromStr>(index: usize, default: T) -> Result<T, Box<dyn Error>> {
    match std::env::args().nth(index) {
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("invalid argument {index}: {raw:?}").into()),
        None => Ok(default),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let particles: usize = parse_arg(1, 2000)?;
    let frames: u32 = parse_arg(2, 600)?;

    let mesh = SurfaceMesh::cuboid(Vec3::new(2.2, 0.7, 0.9))?;
    let params = FlowParams::default().with_particle_count(particles);
    let mut sim = FlowSimulation::new().with_params(params).with_seed(1);
    let surface = SolidSurface::fitted(mesh, sim.duct());
    sim.set_surface(surface);

    let dt = 1.0 / 60.0;
    for frame in 0..frames {
        sim.update(dt, frame as f32 * dt);
        if frame % 120 == 0 {
            let stats = sim.stats();
            log::info!(
                "frame {frame}: {} active, {} visible, {} segments",
                stats.active_count,
                stats.visible_count,
                stats.trail_segments
            );
        }
    }

    let stats = sim.stats();
    println!("active particles : {}", stats.active_count);
    println!("deflected        : {}", stats.visible_count);
    println!("trail segments   : {}", stats.trail_segments);
    if let (Some(extent), Some(min_y)) = (stats.surface_extent, stats.surface_min_y) {
        println!("solid extent     : {:.2} x {:.2} x {:.2}", extent.x, extent.y, extent.z);
        println!("solid min y      : {min_y:.2}");
    }
    Ok(())
}
