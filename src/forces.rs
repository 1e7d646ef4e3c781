//! The force field acting on tracer particles.
//!
//! Each [`ForceRule`] reads a particle's position and velocity at the start of
//! the sub-step plus the shared, read-only [`FieldContext`], and **adds** to
//! the particle's acceleration. Rules never read acceleration written by an
//! earlier rule, so their order only matters for the few that also nudge
//! position or velocity directly (surface stand-off, ground clamp).
//!
//! | Rule | Active when |
//! |------|-------------|
//! | [`ForceRule::Freestream`] | always |
//! | [`ForceRule::GroundEffect`] | near the floor or ceiling |
//! | [`ForceRule::PotentialFlow`] | a surface is attached, near a station |
//! | [`ForceRule::SurfaceSliding`] | inside the outer bound, within reach of the surface |
//! | [`ForceRule::WakeVortex`] | downstream of the outer bound |
//! | [`ForceRule::AmbientTurbulence`] | deflected and well past the outer bound |
//!
//! Degenerate geometry (zero-length normals, flat stations, missing hits)
//! turns the rule off for that sub-step.

use crate::constants::*;
use crate::params::Duct;
use crate::particle::Particle;
use crate::surface::{SolidSurface, Station};
use glam::Vec3;

/// Read-only snapshot shared by every particle during one frame.
#[derive(Clone, Copy, Debug)]
pub struct FieldContext<'a> {
    /// Freestream speed along +X.
    pub wind_speed: f32,
    /// Wake perturbation strength.
    pub turbulence: f32,
    /// Score above which a particle becomes deflected.
    pub deflection_threshold: f32,
    /// Simulation time in seconds, drives the turbulence phase.
    pub time: f32,
    pub duct: &'a Duct,
    /// `None` until a solid is attached.
    pub surface: Option<&'a SolidSurface>,
}

impl FieldContext<'_> {
    /// The freestream velocity vector.
    #[inline]
    pub fn freestream(&self) -> Vec3 {
        Vec3::new(self.wind_speed, 0.0, 0.0)
    }
}

/// One contributor to a particle's acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceRule {
    /// Relax velocity toward the freestream.
    Freestream,
    /// Push away from the floor and ceiling.
    GroundEffect,
    /// Bend flow around the solid's elliptical stations.
    PotentialFlow,
    /// Cancel inflow into the surface and slide along it.
    SurfaceSliding,
    /// Swirl around the wake vortex seeds.
    WakeVortex,
    /// Sinusoidal perturbation of deflected particles far downstream.
    AmbientTurbulence,
}

impl ForceRule {
    /// Every rule, in evaluation order.
    pub const ALL: [ForceRule; 6] = [
        ForceRule::Freestream,
        ForceRule::GroundEffect,
        ForceRule::PotentialFlow,
        ForceRule::SurfaceSliding,
        ForceRule::WakeVortex,
        ForceRule::AmbientTurbulence,
    ];

    /// Add this rule's contribution to `p`.
    pub fn apply(&self, p: &mut Particle, ctx: &FieldContext) {
        match self {
            ForceRule::Freestream => apply_freestream(p, ctx),
            ForceRule::GroundEffect => apply_ground_effect(p, ctx.duct),
            ForceRule::PotentialFlow => {
                if let Some(surface) = ctx.surface {
                    apply_potential_flow(p, ctx, surface);
                }
            }
            ForceRule::SurfaceSliding => {
                if let Some(surface) = ctx.surface {
                    apply_surface_sliding(p, ctx, surface);
                }
            }
            ForceRule::WakeVortex => {
                if let Some(surface) = ctx.surface {
                    apply_wake_vortices(p, ctx, surface);
                }
            }
            ForceRule::AmbientTurbulence => apply_ambient_turbulence(p, ctx),
        }
    }
}

/// Evaluate every rule in order.
#[inline]
pub fn apply_all(p: &mut Particle, ctx: &FieldContext) {
    for rule in ForceRule::ALL {
        rule.apply(p, ctx);
    }
}

#[inline]
fn project_on_plane(v: Vec3, unit_normal: Vec3) -> Vec3 {
    v - unit_normal * v.dot(unit_normal)
}

#[inline]
fn smoothstep01(s: f32) -> f32 {
    let s = s.clamp(0.0, 1.0);
    s * s * (3.0 - 2.0 * s)
}

/// Unit tangent of the plane with normal `normal`, preferring the desired
/// flow, then the current velocity, then `normal x up`.
fn flow_tangent(desired: Vec3, velocity: Vec3, normal: Vec3, epsilon: f32) -> Vec3 {
    let mut tangent = project_on_plane(desired, normal);
    if tangent.length_squared() < epsilon {
        tangent = project_on_plane(velocity, normal);
    }
    if tangent.length_squared() < epsilon {
        tangent = normal.cross(Vec3::Y);
    }
    tangent.normalize_or_zero()
}

fn apply_freestream(p: &mut Particle, ctx: &FieldContext) {
    p.acceleration += (ctx.freestream() - p.velocity) * FREESTREAM_RELAXATION;
}

fn apply_ground_effect(p: &mut Particle, duct: &Duct) {
    let dist = p.position.y - duct.floor_y();
    if dist < GROUND_BAND {
        p.acceleration.y += (GROUND_BAND - dist) * GROUND_STIFFNESS;
        p.velocity.y = p.velocity.y.max(-GROUND_SINK_LIMIT * dist);
    }

    let headroom = duct.ceiling_y() - p.position.y;
    if headroom < CEILING_BAND {
        p.acceleration.y -= (CEILING_BAND - headroom) * CEILING_STIFFNESS;
    }
}

fn apply_potential_flow(p: &mut Particle, ctx: &FieldContext, surface: &SolidSurface) {
    for station in surface.stations() {
        apply_station(p, station, ctx);
    }
}

/// Steering and normal push of one elliptical station. A station with no
/// axial extent (a solid that is flat along the flow) contributes nothing.
fn apply_station(p: &mut Particle, station: &Station, ctx: &FieldContext) {
    const EPS: f32 = 1e-4;
    if station.half_length <= EPS {
        return;
    }
    let base = ctx.wind_speed;

    let dx = p.position.x - station.center.x;
    let ax = dx.abs();
    if ax > station.half_length * STATION_AXIAL_REACH {
        return;
    }

    let dy = p.position.y - station.center.y;
    let dz = p.position.z - station.center.z;
    let ry2 = station.radius_y * station.radius_y + EPS;
    let rz2 = station.radius_z * station.radius_z + EPS;
    let radial = (dy * dy / ry2 + dz * dz / rz2).sqrt();
    if radial > STATION_RADIAL_REACH {
        return;
    }

    let normal = Vec3::new(0.0, dy / ry2, dz / rz2);
    if normal.length_squared() < 1e-6 {
        return;
    }
    let normal = normal.normalize();

    let influence = (-ax / (station.half_length * STATION_AXIAL_DECAY)).exp()
        * (1.0 - radial / STATION_RADIAL_REACH).max(0.0);
    if influence < STATION_MIN_INFLUENCE {
        return;
    }

    let tangent = flow_tangent(ctx.freestream(), p.velocity, normal, 1e-6);
    let target_speed = base * (STATION_MIN_SPEED + (1.0 - STATION_MIN_SPEED) * radial.min(1.0));
    let correction = tangent * target_speed - p.velocity;
    p.acceleration += correction * (influence * STATION_STEER_GAIN);

    let sign = if dx < 0.0 { 1.0 } else { STATION_DOWNSTREAM_PUSH };
    p.acceleration += normal * (influence * base * STATION_PUSH_GAIN * sign);

    let response = influence * (correction.length() / (target_speed + EPS));
    p.add_deflection_score(response * STATION_SCORE_WEIGHT, ctx.deflection_threshold);
}

fn apply_surface_sliding(p: &mut Particle, ctx: &FieldContext, surface: &SolidSurface) {
    if !surface.outer_bounds().contains(p.position) {
        return;
    }

    let local = surface.world_to_local(p.position);
    let Some(hit) = surface.closest_point_local(local) else {
        return;
    };
    let hit_world = surface.local_to_world(hit.point);
    let distance = hit_world.distance(p.position);
    if distance > SURFACE_INFLUENCE_RADIUS {
        return;
    }

    let normal = surface.world_face_normal(hit.triangle);
    if normal == Vec3::ZERO {
        return;
    }

    let base = ctx.wind_speed;
    let threshold = ctx.deflection_threshold;

    // No-through condition: remove only the inward normal velocity.
    let vn = p.velocity.dot(normal);
    if vn < 0.0 {
        p.acceleration += normal * (-vn * NORMAL_CANCEL_GAIN);
        p.add_deflection_score(vn.abs().min(NORMAL_SCORE_CAP) * NORMAL_SCORE_WEIGHT, threshold);
        p.activate_trail();
    }

    let tangent = slide_tangent(surface, hit.point, normal, distance, ctx.freestream(), p.velocity);

    let smooth = smoothstep01(distance / SURFACE_INFLUENCE_RADIUS);
    let correction = tangent * boundary_layer_speed(base, distance) - p.velocity;
    if correction.length_squared() > 1e-6 {
        let align = ALIGN_BASE_GAIN + ALIGN_WALL_GAIN * (1.0 - smooth);
        p.acceleration += correction * align;
        p.add_deflection_score(correction.length().min(base) * ALIGN_SCORE_WEIGHT, threshold);
    }

    if !p.is_visible() && distance < STAND_OFF * NEAR_WALL_FACTOR {
        p.activate_trail();
    }
    apply_stand_off(p, hit_world, normal, distance, threshold);
}

/// Direction to slide along the surface at `hit_local`: the freestream
/// projected on the face, bent toward the face a step downstream and then
/// wrapped toward the face a step to the side.
fn slide_tangent(
    surface: &SolidSurface,
    hit_local: Vec3,
    normal: Vec3,
    distance: f32,
    desired: Vec3,
    velocity: Vec3,
) -> Vec3 {
    let mut tangent = flow_tangent(desired, velocity, normal, 1e-8);

    let step = (distance * 0.5).clamp(CURVATURE_STEP.0, CURVATURE_STEP.1);
    let ahead_local = hit_local + surface.direction_to_local(tangent) * step;
    if let Some(ahead) = surface.closest_point_local(ahead_local) {
        let ahead_normal = surface.world_face_normal(ahead.triangle);
        let reprojected = project_on_plane(tangent, ahead_normal).normalize_or_zero();
        tangent = tangent.lerp(reprojected, CURVATURE_BLEND).normalize_or_zero();
    }

    let side = tangent.cross(normal);
    if side.length_squared() > 1e-8 {
        let side = side.normalize();
        let side_local = hit_local + surface.direction_to_local(side) * (step * LATERAL_STEP_RATIO);
        if let Some(lateral) = surface.closest_point_local(side_local) {
            let lateral_normal = surface.world_face_normal(lateral.triangle);
            let wrapped = project_on_plane(side, lateral_normal);
            if wrapped.length_squared() > 1e-6 {
                tangent = tangent.lerp(wrapped.normalize(), LATERAL_BLEND).normalize_or_zero();
            }
        }
    }
    tangent
}

/// Boundary-layer target speed: slower at the wall, freestream at the
/// influence radius.
fn boundary_layer_speed(base: f32, distance: f32) -> f32 {
    let smooth = smoothstep01(distance / SURFACE_INFLUENCE_RADIUS);
    base * (BOUNDARY_LAYER_MIN_SPEED + (1.0 - BOUNDARY_LAYER_MIN_SPEED) * smooth)
}

/// Keep `p` at least [`STAND_OFF`] in front of the face through `hit_world`.
///
/// Inside the stand-off, or straight behind the face, the particle is
/// snapped out and kicked along the normal. Otherwise it is steered toward
/// the stand-off offset, harder the closer it is.
fn apply_stand_off(p: &mut Particle, hit_world: Vec3, normal: Vec3, distance: f32, threshold: f32) {
    let signed = (p.position - hit_world).dot(normal);
    // Beside a convex edge the offset leans away from the face normal; only
    // an offset along the inward normal means the particle tunnelled.
    let behind = signed < 0.0 && -signed > TUNNEL_ALIGNMENT * distance;
    if distance < STAND_OFF || behind {
        let violation = STAND_OFF - signed.min(distance);
        p.position = hit_world + normal * (STAND_OFF + 1e-3);
        let inward = p.velocity.dot(normal);
        if inward < 0.0 {
            p.velocity -= normal * inward;
        }
        p.velocity += normal * (violation * STAND_OFF_KICK);
        p.add_deflection_score(violation * STAND_OFF_SCORE_WEIGHT, threshold);
    } else {
        let smooth = smoothstep01(distance / SURFACE_INFLUENCE_RADIUS);
        let pull = hit_world + normal * STAND_OFF - p.position;
        p.acceleration += pull * (STAND_OFF_STEER_GAIN * (1.0 - smooth));
        if pull.length_squared() > 1e-6 {
            p.add_deflection_score(
                pull.length().min(STAND_OFF_SCORE_CAP) * STAND_OFF_STEER_SCORE_WEIGHT,
                threshold,
            );
        }
    }
}

fn apply_wake_vortices(p: &mut Particle, ctx: &FieldContext, surface: &SolidSurface) {
    if p.position.x < surface.outer_bounds().max.x {
        p.vorticity *= VORTICITY_DECAY_UPSTREAM;
        return;
    }

    let base = ctx.wind_speed;
    let mut accumulated = 0.0;
    let mut influenced = false;

    for (i, center) in surface.vortex_centers().iter().enumerate() {
        let mut offset = p.position - *center;
        offset.x *= WAKE_AXIAL_STRETCH;
        let radius = VORTEX_BASE_RADIUS + i as f32 * VORTEX_RADIUS_STEP;
        let falloff = (-offset.length_squared() / (radius * radius)).exp();
        if falloff > VORTEX_MIN_FALLOFF {
            let swirl = Vec3::Y.cross(offset).normalize_or_zero();
            let strength = base * VORTEX_SWIRL_GAIN * falloff;
            p.acceleration += swirl * strength;
            accumulated += strength;
            influenced = true;
        }
    }

    if influenced {
        let t = ctx.time;
        let pos = p.position;
        let noise = (pos.z * 1.1 + t * 2.5).sin() + (pos.y * 0.9 - t * 1.4).cos();
        p.acceleration.y += noise * ctx.turbulence * 1.2;
        p.acceleration.z += (pos.x * 0.6 + t * 2.1).cos() * ctx.turbulence * 0.9;
        let target = accumulated * VORTICITY_GAIN;
        p.vorticity += (target - p.vorticity) * VORTICITY_BLEND;
        p.add_deflection_score(accumulated * WAKE_SCORE_WEIGHT, ctx.deflection_threshold);
    } else {
        p.vorticity *= VORTICITY_DECAY_WAKE;
    }
}

fn apply_ambient_turbulence(p: &mut Particle, ctx: &FieldContext) {
    let wake_start = ctx
        .surface
        .map(|s| s.outer_bounds().max.x + TURBULENCE_MARGIN)
        .unwrap_or(TURBULENCE_FALLBACK_START);
    if p.position.x <= wake_start || !p.is_deflected() {
        return;
    }

    let t = ctx.time;
    let noise_a = (p.position.z * 1.3 + t * 3.2).sin();
    let noise_b = (p.position.y * 1.1 - t * 1.8).cos();
    p.acceleration.y += noise_a * ctx.turbulence * 0.9;
    p.acceleration.z += noise_b * ctx.turbulence * 0.7;
    p.add_deflection_score(
        (noise_a.abs() + noise_b.abs()) * TURBULENCE_SCORE_WEIGHT,
        ctx.deflection_threshold,
    );
}
