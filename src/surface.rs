//! The static solid the air flows around.
//!
//! [`SurfaceMesh`] is the triangulated surface in its own local space together
//! with its [`TriangleBvh`]. [`SolidSurface`] places a mesh in the duct with a
//! world transform and derives everything the force field reads from it:
//!
//! - a tight world-space bound and an outer bound padded by a fixed margin
//! - elliptical cross-section [`Station`]s for the cheap potential-flow model
//! - wake vortex seed points anchored on the tight bound
//!
//! The derived data is recomputed only when the transform changes.

use crate::constants::{
    OUTER_BOUND_MARGIN, STATION_COUNT, STATION_HALF_LENGTH, STATION_RADIUS_Y, STATION_RADIUS_Z,
};
use crate::error::MeshError;
use crate::params::Duct;
use crate::spatial::{Aabb, SurfaceHit, TriangleBvh};
use glam::{Affine3A, Mat3A, Quat, Vec3};

/// Number of wake vortex seed points.
pub const VORTEX_COUNT: usize = 4;

/// Triangulated surface in local space with a closest-point index.
#[derive(Clone, Debug)]
pub struct SurfaceMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    bvh: TriangleBvh,
}

impl SurfaceMesh {
    /// Squared-area threshold below which a triangle is dropped.
    const DEGENERATE_AREA_SQ: f32 = 1e-14;

    /// Build a mesh from indexed triangles.
    ///
    /// Zero-area triangles are dropped; the indices of the remaining
    /// triangles are what [`SurfaceHit::triangle`] refers to.
    ///
    /// The mesh is expected to be closed and wound counter-clockwise seen
    /// from outside. The winding normal is taken as the outward side: a
    /// particle reaching a face from behind is not held off it, so a single
    /// open sheet only deflects flow arriving on its front.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        if vertices.is_empty() || triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(MeshError::NonFiniteVertex { index });
        }
        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    triangle: t,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        let total = triangles.len();
        let triangles: Vec<[u32; 3]> = triangles
            .into_iter()
            .filter(|tri| {
                let [a, b, c] = tri.map(|i| vertices[i as usize]);
                (b - a).cross(c - a).length_squared() > Self::DEGENERATE_AREA_SQ
            })
            .collect();
        if triangles.is_empty() {
            return Err(MeshError::AllDegenerate);
        }
        if triangles.len() < total {
            log::warn!(
                "Dropped {} degenerate triangles out of {}",
                total - triangles.len(),
                total
            );
        }

        let corners: Vec<[Vec3; 3]> = triangles
            .iter()
            .map(|tri| tri.map(|i| vertices[i as usize]))
            .collect();
        let bvh = TriangleBvh::build(&corners);

        Ok(Self {
            vertices,
            triangles,
            bvh,
        })
    }

    /// Build a mesh from a non-indexed triangle list (three points per triangle),
    /// the layout a binary STL decodes to. Winding follows the same outward
    /// convention as [`new`](Self::new).
    pub fn from_triangle_soup(points: &[Vec3]) -> Result<Self, MeshError> {
        if points.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle {
                vertex_count: points.len(),
            });
        }
        let triangles = (0..points.len() as u32 / 3)
            .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
            .collect();
        Self::new(points.to_vec(), triangles)
    }

    /// Axis-aligned box centered on the origin, wound with outward normals.
    pub fn cuboid(half_extents: Vec3) -> Result<Self, MeshError> {
        let h = half_extents;
        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::X * h.x, Vec3::Y * h.y, Vec3::Z * h.z),
            (Vec3::NEG_X * h.x, Vec3::Z * h.z, Vec3::Y * h.y),
            (Vec3::Y * h.y, Vec3::Z * h.z, Vec3::X * h.x),
            (Vec3::NEG_Y * h.y, Vec3::X * h.x, Vec3::Z * h.z),
            (Vec3::Z * h.z, Vec3::X * h.x, Vec3::Y * h.y),
            (Vec3::NEG_Z * h.z, Vec3::Y * h.y, Vec3::X * h.x),
        ];

        let mut soup = Vec::with_capacity(36);
        for (c, u, v) in faces {
            let p0 = c - u - v;
            let p1 = c + u - v;
            let p2 = c + u + v;
            let p3 = c - u + v;
            soup.extend_from_slice(&[p0, p1, p2, p0, p2, p3]);
        }
        Self::from_triangle_soup(&soup)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Local-space bound of the mesh.
    pub fn bounds(&self) -> Aabb {
        self.bvh.bounds()
    }

    /// Closest point on the surface to a local-space point.
    #[inline]
    pub fn closest_point(&self, local: Vec3) -> Option<SurfaceHit> {
        self.bvh.closest_point(local)
    }

    /// Flat local-space normal of a triangle from the cross product of its edges.
    pub fn face_normal(&self, triangle: usize) -> Vec3 {
        let Some(tri) = self.triangles.get(triangle) else {
            return Vec3::Y;
        };
        let [a, b, c] = tri.map(|i| self.vertices[i as usize]);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Transform that scales the mesh uniformly to fit inside the duct,
    /// centers it and rests its lowest point at the duct's ground level.
    pub fn fitted_transform(&self, duct: &Duct) -> Affine3A {
        let bounds = self.bounds();
        let size = bounds.size().max(Vec3::splat(1e-3));
        let scale = (duct.length * 0.45 / size.x)
            .min(duct.height * 0.5 / size.y)
            .min(duct.width * 0.45 / size.z);

        let lift = duct.ground_level() + size.y * scale * 0.5;
        let translation = -bounds.center() * scale + Vec3::new(0.0, lift, 0.0);
        Affine3A::from_scale_rotation_translation(Vec3::splat(scale), Quat::IDENTITY, translation)
    }
}

/// Elliptical cross-section of the solid used by the potential-flow model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Station {
    pub center: Vec3,
    /// Vertical radius.
    pub radius_y: f32,
    /// Lateral radius.
    pub radius_z: f32,
    /// Half-length of influence along the flow axis.
    pub half_length: f32,
}

/// A mesh placed in the duct, with derived bounds, stations and vortex seeds.
#[derive(Clone, Debug)]
pub struct SolidSurface {
    mesh: SurfaceMesh,
    transform: Affine3A,
    inverse: Affine3A,
    normal_matrix: Mat3A,
    tight: Aabb,
    outer: Aabb,
    stations: Vec<Station>,
    vortex_centers: [Vec3; VORTEX_COUNT],
}

impl SolidSurface {
    /// Place `mesh` with `transform`. A singular transform falls back to identity.
    pub fn new(mesh: SurfaceMesh, transform: Affine3A) -> Self {
        let transform = if is_invertible(&transform) {
            transform
        } else {
            log::warn!("Ignoring singular surface transform, using identity");
            Affine3A::IDENTITY
        };
        let mut surface = Self {
            mesh,
            transform,
            inverse: Affine3A::IDENTITY,
            normal_matrix: Mat3A::IDENTITY,
            tight: Aabb::EMPTY,
            outer: Aabb::EMPTY,
            stations: Vec::with_capacity(STATION_COUNT),
            vortex_centers: [Vec3::ZERO; VORTEX_COUNT],
        };
        surface.refresh();
        surface
    }

    /// Place `mesh` scaled and grounded to fit `duct`.
    pub fn fitted(mesh: SurfaceMesh, duct: &Duct) -> Self {
        let transform = mesh.fitted_transform(duct);
        Self::new(mesh, transform)
    }

    /// Replace the world transform. Derived data is rebuilt only when the
    /// transform actually changed; returns whether it was.
    pub fn set_transform(&mut self, transform: Affine3A) -> bool {
        if transform == self.transform {
            return false;
        }
        if !is_invertible(&transform) {
            log::warn!("Ignoring singular surface transform");
            return false;
        }
        self.transform = transform;
        self.refresh();
        true
    }

    /// Move the solid so its transform translation equals `position`.
    pub fn set_position(&mut self, position: Vec3) -> bool {
        let mut transform = self.transform;
        transform.translation = position.into();
        self.set_transform(transform)
    }

    fn refresh(&mut self) {
        self.inverse = self.transform.inverse();
        self.normal_matrix = self.transform.matrix3.inverse().transpose();

        let transform = self.transform;
        self.tight = Aabb::from_points(
            self.mesh
                .vertices()
                .iter()
                .map(|v| transform.transform_point3(*v)),
        );
        self.outer = self.tight.expanded(Vec3::from(OUTER_BOUND_MARGIN));

        self.rebuild_stations();
        self.rebuild_vortex_centers();

        log::debug!(
            "Surface refreshed: tight bound {:?}..{:?}",
            self.tight.min,
            self.tight.max
        );
    }

    fn rebuild_stations(&mut self) {
        let size = self.tight.size();
        let center = self.tight.center();
        let spacing = size.x / STATION_COUNT as f32;

        self.stations.clear();
        for i in 0..STATION_COUNT {
            let t = (i as f32 + 0.5) / STATION_COUNT as f32;
            let flare = 1.0 - (t - 0.5).abs() * 2.0;
            self.stations.push(Station {
                center: Vec3::new(self.tight.min.x + size.x * t, center.y, center.z),
                radius_y: size.y * lerp(STATION_RADIUS_Y.0, STATION_RADIUS_Y.1, flare),
                radius_z: size.z * lerp(STATION_RADIUS_Z.0, STATION_RADIUS_Z.1, flare),
                half_length: spacing * STATION_HALF_LENGTH,
            });
        }
    }

    fn rebuild_vortex_centers(&mut self) {
        let size = self.tight.size();
        let center = self.tight.center();
        let front_x = self.tight.min.x + size.x * 0.3;
        let rear_x = self.tight.max.x - size.x * 0.15;
        let mid_y = self.tight.min.y + size.y * 0.35;
        let top_y = self.tight.max.y - size.y * 0.2;
        let track = size.z * 0.5 * 0.7;

        self.vortex_centers = [
            Vec3::new(front_x, mid_y, center.z + track),
            Vec3::new(front_x, mid_y, center.z - track),
            Vec3::new(rear_x, top_y, center.z + track * 0.8),
            Vec3::new(rear_x, top_y, center.z - track * 0.8),
        ];
    }

    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    pub fn transform(&self) -> Affine3A {
        self.transform
    }

    /// Exact world-space extent of the transformed mesh.
    pub fn tight_bounds(&self) -> Aabb {
        self.tight
    }

    /// Tight bound padded by the fixed per-axis margin.
    pub fn outer_bounds(&self) -> Aabb {
        self.outer
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn vortex_centers(&self) -> &[Vec3; VORTEX_COUNT] {
        &self.vortex_centers
    }

    #[inline]
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        self.inverse.transform_point3(point)
    }

    #[inline]
    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        self.transform.transform_point3(point)
    }

    /// World direction expressed in local space, normalized.
    #[inline]
    pub fn direction_to_local(&self, direction: Vec3) -> Vec3 {
        self.inverse.transform_vector3(direction).normalize_or_zero()
    }

    /// Local-space normal carried to world space through the normal matrix.
    #[inline]
    pub fn normal_to_world(&self, local_normal: Vec3) -> Vec3 {
        (self.normal_matrix * local_normal).normalize_or_zero()
    }

    /// World-space flat normal of a triangle.
    #[inline]
    pub fn world_face_normal(&self, triangle: usize) -> Vec3 {
        self.normal_to_world(self.mesh.face_normal(triangle))
    }

    /// Closest point on the surface to a local-space point.
    #[inline]
    pub fn closest_point_local(&self, local: Vec3) -> Option<SurfaceHit> {
        self.mesh.closest_point(local)
    }
}

fn is_invertible(transform: &Affine3A) -> bool {
    let det = transform.matrix3.determinant();
    det.is_finite() && det.abs() > 1e-12 && transform.translation.is_finite()
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> SurfaceMesh {
        SurfaceMesh::cuboid(Vec3::new(2.0, 1.0, 1.5)).unwrap()
    }

    #[test]
    fn test_cuboid_normals_point_outward() {
        let mesh = unit_box();
        assert_eq!(mesh.triangles().len(), 12);
        for t in 0..mesh.triangles().len() {
            let [a, b, c] = mesh.triangles()[t].map(|i| mesh.vertices()[i as usize]);
            let centroid = (a + b + c) / 3.0;
            assert!(mesh.face_normal(t).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_mesh_validation() {
        assert_eq!(SurfaceMesh::new(vec![], vec![]).unwrap_err(), MeshError::Empty);
        assert!(matches!(
            SurfaceMesh::from_triangle_soup(&[Vec3::ZERO, Vec3::X]),
            Err(MeshError::IncompleteTriangle { vertex_count: 2 })
        ));
        assert!(matches!(
            SurfaceMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 5]]),
            Err(MeshError::IndexOutOfRange { index: 5, .. })
        ));
        assert!(matches!(
            SurfaceMesh::new(vec![Vec3::ZERO, Vec3::NAN, Vec3::Y], vec![[0, 1, 2]]),
            Err(MeshError::NonFiniteVertex { index: 1 })
        ));
        assert_eq!(
            SurfaceMesh::from_triangle_soup(&[Vec3::ZERO, Vec3::X, Vec3::X * 2.0]).unwrap_err(),
            MeshError::AllDegenerate
        );
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let soup = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::ZERO,
            Vec3::X,
            Vec3::X * 2.0,
        ];
        let mesh = SurfaceMesh::from_triangle_soup(&soup).unwrap();
        assert_eq!(mesh.triangles().len(), 1);
    }

    #[test]
    fn test_winding_sets_outward_side() {
        let front = [Vec3::ZERO, Vec3::Z, Vec3::Y];
        let back = [Vec3::ZERO, Vec3::Y, Vec3::Z];
        let mesh = SurfaceMesh::from_triangle_soup(&front).unwrap();
        assert!((mesh.face_normal(0) - Vec3::NEG_X).length() < 1e-6);
        let mesh = SurfaceMesh::from_triangle_soup(&back).unwrap();
        assert!((mesh.face_normal(0) - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_tight_and_outer_bounds() {
        let transform = Affine3A::from_translation(Vec3::new(1.0, -2.0, 0.5));
        let surface = SolidSurface::new(unit_box(), transform);
        let tight = surface.tight_bounds();
        assert!((tight.min - Vec3::new(-1.0, -3.0, -1.0)).length() < 1e-5);
        assert!((tight.max - Vec3::new(3.0, -1.0, 2.0)).length() < 1e-5);

        let outer = surface.outer_bounds();
        assert!((outer.min - Vec3::new(-2.5, -5.0, -2.8)).length() < 1e-5);
        assert!((outer.max - Vec3::new(4.5, 1.0, 3.8)).length() < 1e-5);
    }

    #[test]
    fn test_stations_flare_toward_middle() {
        let surface = SolidSurface::new(unit_box(), Affine3A::IDENTITY);
        let stations = surface.stations();
        assert_eq!(stations.len(), STATION_COUNT);

        // Evenly spaced along x, symmetric flare
        let size = surface.tight_bounds().size();
        let first = stations[0];
        assert!((first.center.x - (-2.0 + size.x / 12.0)).abs() < 1e-5);
        assert!((first.half_length - size.x / 6.0 * 0.75).abs() < 1e-5);
        assert!((stations[0].radius_y - stations[5].radius_y).abs() < 1e-5);
        assert!(stations[2].radius_y > stations[0].radius_y);
        assert!(stations[2].radius_z > stations[1].radius_z);
        // Tip ratio: flare = 1 - |1/12 - 0.5| * 2 = 1/6
        let expected = size.y * lerp(0.28, 0.55, 1.0 / 6.0);
        assert!((first.radius_y - expected).abs() < 1e-5);
    }

    #[test]
    fn test_set_transform_only_refreshes_on_change() {
        let mut surface = SolidSurface::new(unit_box(), Affine3A::IDENTITY);
        assert!(!surface.set_transform(Affine3A::IDENTITY));
        assert!(surface.set_position(Vec3::new(0.0, 1.0, 0.0)));
        assert!((surface.tight_bounds().min.y - 0.0).abs() < 1e-5);
        assert!((surface.stations()[0].center.y - 1.0).abs() < 1e-5);
        assert!(!surface.set_transform(Affine3A::from_scale(Vec3::ZERO)));
    }

    #[test]
    fn test_world_normals_follow_rotation() {
        let rotation = Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let surface = SolidSurface::new(unit_box(), rotation);
        let local = Vec3::new(5.0, 0.0, 0.0);
        let hit = surface.closest_point_local(local).unwrap();
        let world_n = surface.world_face_normal(hit.triangle);
        // Local +X rotates to world -Z.
        assert!((world_n - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_fitted_transform_rests_on_ground() {
        let duct = Duct::default();
        let surface = SolidSurface::fitted(unit_box(), &duct);
        let tight = surface.tight_bounds();
        assert!((tight.min.y - duct.ground_level()).abs() < 1e-4);
        assert!(tight.size().x <= duct.length * 0.45 + 1e-3);
        assert!(tight.size().y <= duct.height * 0.5 + 1e-3);
        assert!(tight.size().z <= duct.width * 0.45 + 1e-3);
        assert!(tight.center().x.abs() < 1e-4);
    }
}
