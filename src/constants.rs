//! Tuned coefficients of the flow model.
//!
//! None of these are physically derived. They reproduce the look of the
//! reference wind-tunnel visualization and are grouped by the force
//! contributor that reads them.

// ========== Pool / integration ==========

/// Absolute particle capacity of a default pool.
pub const DEFAULT_MAX_PARTICLES: usize = 4000;
/// Absolute number of samples a trail can hold.
pub const MAX_TRAIL_POINTS: usize = 60;
/// Smallest configurable trail length.
pub const MIN_TRAIL_POINTS: usize = 2;
/// Segments a single full trail can emit.
pub const MAX_TRAIL_SEGMENTS: usize = MAX_TRAIL_POINTS - 1;

/// Fixed sub-steps per frame.
pub const SUB_STEPS: usize = 2;
/// Per-sub-step damping of the velocity deviation from the freestream.
pub const VELOCITY_DAMPING: f32 = 0.997;
/// Visual speed-up applied when advancing positions.
pub const ADVECTION_SCALE: f32 = 5.0;
/// Decay of the deflection score per second while pristine.
pub const SCORE_DECAY_RATE: f32 = 0.12;
/// Largest frame delta accepted (seconds).
pub const MAX_FRAME_DELTA: f32 = 0.05;

// ========== Spawning ==========

/// Distance kept between spawned particles and the duct walls.
pub const SPAWN_MARGIN: f32 = 0.5;
/// Depth of the inlet slab particles are scattered over.
pub const INLET_THICKNESS: f32 = 0.4;
/// Full spread of the vertical velocity kick, as a fraction of wind speed.
pub const SPAWN_VERTICAL_KICK: f32 = 0.05;
/// Full spread of the lateral velocity kick, as a fraction of wind speed.
pub const SPAWN_LATERAL_KICK: f32 = 0.12;

// ========== Freestream / ground ==========

/// First-order relaxation rate toward the freestream velocity.
pub const FREESTREAM_RELAXATION: f32 = 2.2;
/// Height of the floor influence band.
pub const GROUND_BAND: f32 = 0.4;
/// Upward acceleration per unit of floor penetration.
pub const GROUND_STIFFNESS: f32 = 12.0;
/// Largest allowed downward speed per unit of floor distance.
pub const GROUND_SINK_LIMIT: f32 = 0.4;
/// Headroom below which the ceiling pushes down.
pub const CEILING_BAND: f32 = 0.6;
/// Downward acceleration per unit of headroom deficit.
pub const CEILING_STIFFNESS: f32 = 6.0;
/// Offset of the floor/ceiling planes inside the duct walls.
pub const WALL_INSET: f32 = 0.2;

// ========== Surface model ==========

/// Margin added to the tight bound on each axis to form the outer bound.
pub const OUTER_BOUND_MARGIN: [f32; 3] = [1.5, 2.0, 1.8];
/// Number of elliptical stations sampled along the solid.
pub const STATION_COUNT: usize = 6;
/// Vertical radius ratio at the tips and at the widest station.
pub const STATION_RADIUS_Y: (f32, f32) = (0.28, 0.55);
/// Lateral radius ratio at the tips and at the widest station.
pub const STATION_RADIUS_Z: (f32, f32) = (0.32, 0.6);
/// Fraction of a station's spacing used as its half-length.
pub const STATION_HALF_LENGTH: f32 = 0.75;
/// Ground clearance of a solid fitted into the duct.
pub const GROUND_CLEARANCE: f32 = 1.0;

// ========== Potential flow ==========

/// Stations further than this many half-lengths away are ignored.
pub const STATION_AXIAL_REACH: f32 = 1.8;
/// Stations further than this normalized radius are ignored.
pub const STATION_RADIAL_REACH: f32 = 3.0;
/// Axial decay length of a station, in half-lengths.
pub const STATION_AXIAL_DECAY: f32 = 1.2;
/// Influence weights below this are skipped.
pub const STATION_MIN_INFLUENCE: f32 = 1e-3;
/// Speed fraction kept right at a station's surface.
pub const STATION_MIN_SPEED: f32 = 0.7;
/// Gain of the tangential steering.
pub const STATION_STEER_GAIN: f32 = 5.5;
/// Gain of the normal push, as a fraction of wind speed.
pub const STATION_PUSH_GAIN: f32 = 0.9;
/// Normal push sign downstream of a station center.
pub const STATION_DOWNSTREAM_PUSH: f32 = -0.5;
/// Weight of the correction magnitude added to the deflection score.
pub const STATION_SCORE_WEIGHT: f32 = 0.35;

// ========== Surface sliding ==========

/// Distance within which the surface affects a particle.
pub const SURFACE_INFLUENCE_RADIUS: f32 = 2.4;
/// Gain cancelling inward normal velocity.
pub const NORMAL_CANCEL_GAIN: f32 = 6.0;
/// Inward speed is capped at this value before scoring.
pub const NORMAL_SCORE_CAP: f32 = 3.0;
/// Score weight of a cancelled inward speed.
pub const NORMAL_SCORE_WEIGHT: f32 = 0.15;
/// Step bounds for the curvature look-ahead samples.
pub const CURVATURE_STEP: (f32, f32) = (0.05, 0.25);
/// Blend toward the downstream re-projected tangent.
pub const CURVATURE_BLEND: f32 = 0.7;
/// Lateral sample distance relative to the downstream step.
pub const LATERAL_STEP_RATIO: f32 = 0.6;
/// Blend toward the laterally re-projected direction.
pub const LATERAL_BLEND: f32 = 0.3;
/// Speed fraction at the wall inside the boundary layer.
pub const BOUNDARY_LAYER_MIN_SPEED: f32 = 0.35;
/// Base gain of the boundary-layer alignment.
pub const ALIGN_BASE_GAIN: f32 = 2.5;
/// Extra alignment gain right at the wall.
pub const ALIGN_WALL_GAIN: f32 = 4.0;
/// Score weight of the alignment correction.
pub const ALIGN_SCORE_WEIGHT: f32 = 0.08;
/// Minimum stand-off distance from the surface.
pub const STAND_OFF: f32 = 0.12;
/// A particle this many stand-offs away starts recording its trail.
pub const NEAR_WALL_FACTOR: f32 = 1.8;
/// Minimum alignment of the offset with the inward normal for a particle
/// to count as tunnelled behind a face.
pub const TUNNEL_ALIGNMENT: f32 = 0.9;
/// Velocity kick per unit of stand-off violation.
pub const STAND_OFF_KICK: f32 = 4.0;
/// Score per unit of stand-off violation.
pub const STAND_OFF_SCORE_WEIGHT: f32 = 0.5;
/// Gain steering the position toward the stand-off offset.
pub const STAND_OFF_STEER_GAIN: f32 = 3.0;
/// Steering distance is capped at this value before scoring.
pub const STAND_OFF_SCORE_CAP: f32 = 1.5;
/// Score weight of the stand-off steering.
pub const STAND_OFF_STEER_SCORE_WEIGHT: f32 = 0.12;

// ========== Wake ==========

/// Axial compression of vortex offsets (stretches the wake downstream).
pub const WAKE_AXIAL_STRETCH: f32 = 0.7;
/// Radius of the first vortex.
pub const VORTEX_BASE_RADIUS: f32 = 4.0;
/// Radius added per vortex index.
pub const VORTEX_RADIUS_STEP: f32 = 0.6;
/// Falloff below which a vortex does not contribute.
pub const VORTEX_MIN_FALLOFF: f32 = 0.08;
/// Swirl strength as a fraction of wind speed.
pub const VORTEX_SWIRL_GAIN: f32 = 0.9;
/// Fraction of accumulated swirl stored as vorticity.
pub const VORTICITY_GAIN: f32 = 0.18;
/// Smoothing factor of the vorticity scalar.
pub const VORTICITY_BLEND: f32 = 0.35;
/// Vorticity decay per sub-step upstream of the wake.
pub const VORTICITY_DECAY_UPSTREAM: f32 = 0.92;
/// Vorticity decay per sub-step in the wake with no vortex nearby.
pub const VORTICITY_DECAY_WAKE: f32 = 0.95;
/// Score weight of the accumulated swirl.
pub const WAKE_SCORE_WEIGHT: f32 = 0.15;

// ========== Downstream turbulence ==========

/// Distance past the outer bound where ambient turbulence starts.
pub const TURBULENCE_MARGIN: f32 = 1.5;
/// Axial start of ambient turbulence when no surface is attached.
pub const TURBULENCE_FALLBACK_START: f32 = 5.0;
/// Score weight of the ambient perturbation magnitude.
pub const TURBULENCE_SCORE_WEIGHT: f32 = 0.08;

// ========== Coloring ==========

/// Speed that maps to the top of the speed range, as a fraction of wind speed.
pub const COLOR_SPEED_RANGE: f32 = 1.2;
/// Weight of vorticity in the color metric.
pub const COLOR_VORTICITY_GAIN: f32 = 0.8;
/// Cap of the vorticity term in the color metric.
pub const COLOR_VORTICITY_CAP: f32 = 0.5;
