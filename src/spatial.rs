//! Spatial indexing over the solid's triangles using Morton encoding (Z-order curve)
//!
//! Triangle centroids are quantized onto a 1024^3 grid, sorted by their
//! 30-bit Morton code and split recursively at the highest differing code
//! bit. The resulting bounding volume hierarchy answers closest-point queries
//! with a branch-and-bound descent instead of a scan over every triangle.

use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point grows into.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Empty input yields [`Aabb::EMPTY`].
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.grow(p);
            b
        })
    }

    #[inline]
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Box grown by `margin` on every side of each axis.
    #[inline]
    pub fn expanded(&self, margin: Vec3) -> Aabb {
        Aabb::new(self.min - margin, self.max + margin)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Squared distance from `p` to the box (0 inside).
    #[inline]
    pub fn distance_sq(&self, p: Vec3) -> f32 {
        let d = (self.min - p).max(p - self.max).max(Vec3::ZERO);
        d.length_squared()
    }
}

// Expand 10-bit integer to 30 bits by inserting 2 zeros between each bit
#[inline]
fn expand_bits(v: u32) -> u32 {
    let mut x = v & 0x0000_03FF;
    x = (x | (x << 16)) & 0x0300_00FF;
    x = (x | (x << 8)) & 0x0300_F00F;
    x = (x | (x << 4)) & 0x030C_30C3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// 30-bit Morton code for a 3D cell (each coordinate 0-1023).
#[inline]
pub fn morton_encode(x: u32, y: u32, z: u32) -> u32 {
    expand_bits(x) | (expand_bits(y) << 1) | (expand_bits(z) << 2)
}

/// Morton code of `p` quantized inside `bounds`.
fn morton_in_bounds(p: Vec3, bounds: &Aabb) -> u32 {
    const GRID_MAX: f32 = 1023.0;
    let extent = bounds.size().max(Vec3::splat(1e-12));
    let cell = ((p - bounds.min) / extent * GRID_MAX).clamp(Vec3::ZERO, Vec3::splat(GRID_MAX));
    morton_encode(cell.x as u32, cell.y as u32, cell.z as u32)
}

/// Closest point on triangle `abc` to `p`.
///
/// Voronoi-region walk: vertex regions first, then edges, then the face.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Result of a closest-point query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    /// Closest point on the surface.
    pub point: Vec3,
    /// Index of the triangle the point lies on.
    pub triangle: usize,
    /// Squared distance from the query point.
    pub distance_sq: f32,
}

#[derive(Clone, Copy, Debug)]
struct Node {
    bounds: Aabb,
    /// Leaf: first slot in `order`. Branch: index of the left child
    /// (the right child follows it).
    first: u32,
    /// Triangles in the leaf, 0 for branches.
    count: u32,
}

/// Bounding volume hierarchy over a triangle list.
#[derive(Clone, Debug)]
pub struct TriangleBvh {
    nodes: Vec<Node>,
    /// Triangle corners in Morton order.
    corners: Vec<[Vec3; 3]>,
    /// Original triangle index for each Morton-ordered slot.
    order: Vec<u32>,
}

impl TriangleBvh {
    const LEAF_SIZE: usize = 4;
    const STACK_DEPTH: usize = 128;
    /// Relative squared-distance band within which two hits count as tied.
    const TIE_TOLERANCE: f32 = 1e-5;

    /// Build the hierarchy. `triangles[i]` holds the three corners of triangle `i`.
    pub fn build(triangles: &[[Vec3; 3]]) -> Self {
        if triangles.is_empty() {
            return Self {
                nodes: Vec::new(),
                corners: Vec::new(),
                order: Vec::new(),
            };
        }

        let centroids: Vec<Vec3> = triangles
            .iter()
            .map(|[a, b, c]| (*a + *b + *c) / 3.0)
            .collect();
        let centroid_bounds = Aabb::from_points(centroids.iter().copied());

        let mut keyed: Vec<(u32, u32)> = centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (morton_in_bounds(*c, &centroid_bounds), i as u32))
            .collect();
        keyed.sort_unstable();

        let codes: Vec<u32> = keyed.iter().map(|(code, _)| *code).collect();
        let order: Vec<u32> = keyed.iter().map(|(_, i)| *i).collect();
        let corners: Vec<[Vec3; 3]> = order.iter().map(|&i| triangles[i as usize]).collect();

        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * triangles.len() / Self::LEAF_SIZE + 1),
            corners,
            order,
        };
        bvh.nodes.push(Node {
            bounds: Aabb::EMPTY,
            first: 0,
            count: 0,
        });
        bvh.build_node(0, 0, codes.len(), &codes);
        bvh
    }

    fn build_node(&mut self, node: usize, start: usize, end: usize, codes: &[u32]) {
        let bounds = self.corners[start..end]
            .iter()
            .flat_map(|tri| tri.iter().copied())
            .fold(Aabb::EMPTY, |mut b, p| {
                b.grow(p);
                b
            });
        self.nodes[node].bounds = bounds;

        if end - start <= Self::LEAF_SIZE {
            self.nodes[node].first = start as u32;
            self.nodes[node].count = (end - start) as u32;
            return;
        }

        let split = start + find_split(&codes[start..end]);
        let left = self.nodes.len();
        let empty = Node {
            bounds: Aabb::EMPTY,
            first: 0,
            count: 0,
        };
        self.nodes.push(empty);
        self.nodes.push(empty);
        self.nodes[node].first = left as u32;
        self.nodes[node].count = 0;

        self.build_node(left, start, split, codes);
        self.build_node(left + 1, split, end, codes);
    }

    /// Number of triangles indexed.
    pub fn triangle_count(&self) -> usize {
        self.order.len()
    }

    /// Bounds of every indexed triangle.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map(|n| n.bounds).unwrap_or(Aabb::EMPTY)
    }

    /// Closest point on any indexed triangle to `p`, or `None` when empty.
    ///
    /// When several triangles share the closest point (an edge or a vertex),
    /// the one whose front side faces `p` the most wins, so the hit's winding
    /// normal points toward `p` wherever the mesh allows it.
    pub fn closest_point(&self, p: Vec3) -> Option<SurfaceHit> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best: Option<SurfaceHit> = None;
        let mut best_dist = f32::INFINITY;
        let mut best_facing = f32::NEG_INFINITY;

        let mut stack = [0u32; Self::STACK_DEPTH];
        let mut top = 1usize;

        while top > 0 {
            top -= 1;
            let node = &self.nodes[stack[top] as usize];
            if node.bounds.distance_sq(p) > best_dist * (1.0 + Self::TIE_TOLERANCE) {
                continue;
            }

            if node.count > 0 {
                let first = node.first as usize;
                for slot in first..first + node.count as usize {
                    let [a, b, c] = self.corners[slot];
                    let q = closest_point_on_triangle(p, a, b, c);
                    let d = q.distance_squared(p);
                    let tie = best_dist * Self::TIE_TOLERANCE;
                    if d > best_dist + tie {
                        continue;
                    }
                    let facing = (p - q).dot((b - a).cross(c - a).normalize_or_zero());
                    if d < best_dist - tie || facing > best_facing {
                        best_dist = best_dist.min(d);
                        best_facing = facing;
                        best = Some(SurfaceHit {
                            point: q,
                            triangle: self.order[slot] as usize,
                            distance_sq: d,
                        });
                    }
                }
                continue;
            }

            let left = node.first;
            let right = node.first + 1;
            let dl = self.nodes[left as usize].bounds.distance_sq(p);
            let dr = self.nodes[right as usize].bounds.distance_sq(p);
            // Push the farther child first so the nearer one is visited next.
            let (near, far) = if dl <= dr { (left, right) } else { (right, left) };
            if top + 2 > Self::STACK_DEPTH {
                break;
            }
            stack[top] = far;
            stack[top + 1] = near;
            top += 2;
        }

        best
    }
}

/// Split position inside a sorted run of Morton codes: the first code that
/// differs from the run's first code at the highest differing bit.
fn find_split(codes: &[u32]) -> usize {
    let first = codes[0];
    let last = codes[codes.len() - 1];
    if first == last {
        return codes.len() / 2;
    }
    let common = (first ^ last).leading_zeros();
    codes.partition_point(|&c| (c ^ first).leading_zeros() > common)
}
