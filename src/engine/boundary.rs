//! Intersection of a mesh boundary surface with a plane
//!
//! The boundary surface is made of the faces that belong to exactly one
//! volumetric cell. Cutting each of those faces with the plane gives line
//! segments whose end points are shared between neighbouring faces, so the
//! segments can be chained back together into curves.

use super::sample::{self, Stencil};
use crate::mesh::Mesh;
use crate::prelude::*;

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
/// A face of the boundary surface and the cell it belongs to
pub(super) struct BoundaryFace {
    cell: usize,
    points: Vec<usize>,
}

/// every face owned by exactly one volumetric cell, in cell order
pub(super) fn boundary_faces(mesh: &Mesh) -> Vec<BoundaryFace> {
    let mut faces: Vec<(BoundaryFace, usize)> = Vec::new();
    let mut index: HashMap<Vec<usize>, usize> = HashMap::new();

    for (cell_id, cell) in mesh.cells.iter().enumerate() {
        for face in cell.faces() {
            let mut key = face.clone();
            key.sort_unstable();

            match index.get(&key) {
                Some(i) => faces[*i].1 += 1,
                None => {
                    index.insert(key, faces.len());
                    faces.push((
                        BoundaryFace {
                            cell: cell_id,
                            points: face,
                        },
                        1,
                    ));
                }
            }
        }
    }

    let out: Vec<BoundaryFace> = faces
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(face, _)| face)
        .collect();

    tracing::debug!(faces = out.len(), "extracted boundary surface");

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// where a cut point sits on the mesh, so neighbouring faces share it
enum Key {
    Vertex(usize),
    Edge(usize, usize),
}

#[derive(Debug, Clone)]
struct CurvePoint {
    position: Point3<f64>,
    stencil: Stencil,
}

#[derive(Default)]
struct Curve {
    points: Vec<CurvePoint>,
    segments: Vec<(usize, usize)>,
}

impl Curve {
    /// add a segment unless it is degenerate or already present
    fn push_segment(&mut self, a: usize, b: usize, seen: &mut HashSet<(usize, usize)>) {
        if a != b && seen.insert((a.min(b), a.max(b))) {
            self.segments.push((a, b));
        }
    }

    /// keep the part of every segment with `space.distance(x) >= 0`
    fn clip(&mut self, space: &HalfSpace) {
        let segments = std::mem::take(&mut self.segments);
        let mut seen = HashSet::new();

        for (a, b) in segments {
            let da = space.distance(&self.points[a].position);
            let db = space.distance(&self.points[b].position);

            match (da >= 0.0, db >= 0.0) {
                (true, true) => self.push_segment(a, b, &mut seen),
                (false, false) => {}
                (a_inside, _) => {
                    let (inside, outside, d_in, d_out) = if a_inside {
                        (a, b, da, db)
                    } else {
                        (b, a, db, da)
                    };

                    let t = d_in / (d_in - d_out);
                    let crossing = if t <= 0.0 {
                        inside
                    } else {
                        let from = &self.points[inside];
                        let to = &self.points[outside];
                        let point = CurvePoint {
                            position: from.position.lerp(&to.position, t),
                            stencil: Stencil::blend(&from.stencil, &to.stencil, t, from.stencil.cell),
                        };
                        self.points.push(point);
                        self.points.len() - 1
                    };

                    self.push_segment(inside, crossing, &mut seen);
                }
            }
        }
    }

    /// point indices in chain order: open chains starting from their end points
    /// first, then closed loops (without repeating their first point)
    fn chains(&self) -> Vec<usize> {
        let mut adjacent: Vec<Vec<(usize, usize)>> = vec![Vec::new(); self.points.len()];
        for (segment, (a, b)) in self.segments.iter().enumerate() {
            adjacent[*a].push((*b, segment));
            adjacent[*b].push((*a, segment));
        }

        let mut visited = vec![false; self.segments.len()];
        let mut order = Vec::with_capacity(self.points.len());

        let walk = |start: usize, visited: &mut Vec<bool>, order: &mut Vec<usize>| {
            let first = order.len();
            order.push(start);

            let mut current = start;
            while let Some((next, segment)) = adjacent[current]
                .iter()
                .find(|(_, segment)| !visited[*segment])
                .copied()
            {
                visited[segment] = true;
                order.push(next);
                current = next;
            }

            if order.len() - first > 2 && order[first] == current {
                order.pop();
            }
        };

        for point in 0..self.points.len() {
            if adjacent[point].len() == 1 && !visited[adjacent[point][0].1] {
                walk(point, &mut visited, &mut order);
            }
        }

        for segment in 0..self.segments.len() {
            if !visited[segment] {
                walk(self.segments[segment].0, &mut visited, &mut order);
            }
        }

        order
    }
}

/// points (and their data) where the plane through `origin` with `normal` cuts the
/// boundary faces, limited to the intersection of `clips`
pub(super) fn boundary_curve(
    mesh: &Mesh,
    faces: &[BoundaryFace],
    origin: Point3<f64>,
    normal: Vector3<f64>,
    clips: &[HalfSpace],
) -> SampledData {
    let plane = HalfSpace::new(origin, normal);
    let mut curve = Curve::default();
    let mut index: HashMap<Key, usize> = HashMap::new();
    let mut seen = HashSet::new();

    for face in faces {
        let distance: Vec<f64> = face
            .points
            .iter()
            .map(|id| plane.distance(&mesh.point(*id)))
            .collect();

        let mut crossings = Vec::new();
        let n = face.points.len();

        for i in 0..n {
            let j = (i + 1) % n;
            if (distance[i] >= 0.0) == (distance[j] >= 0.0) {
                continue;
            }

            let (a, b) = (face.points[i], face.points[j]);
            let (da, db) = (distance[i], distance[j]);

            let key = if da == 0.0 {
                Key::Vertex(a)
            } else if db == 0.0 {
                Key::Vertex(b)
            } else {
                Key::Edge(a.min(b), a.max(b))
            };

            let id = *index.entry(key).or_insert_with(|| {
                let point = match key {
                    Key::Vertex(v) => CurvePoint {
                        position: mesh.point(v),
                        stencil: Stencil::new(face.cell, vec![(v, 1.0)]),
                    },
                    Key::Edge(lo, hi) => {
                        // interpolate from the lower id so both faces agree exactly
                        let (d_lo, d_hi) = if lo == a { (da, db) } else { (db, da) };
                        let t = d_lo / (d_lo - d_hi);
                        CurvePoint {
                            position: mesh.point(lo).lerp(&mesh.point(hi), t),
                            stencil: Stencil::new(face.cell, vec![(lo, 1.0 - t), (hi, t)]),
                        }
                    }
                };
                curve.points.push(point);
                curve.points.len() - 1
            });

            crossings.push(id);
        }

        for pair in crossings.chunks_exact(2) {
            curve.push_segment(pair[0], pair[1], &mut seen);
        }
    }

    for space in clips {
        curve.clip(space);
    }

    let order = curve.chains();

    tracing::debug!(
        segments = curve.segments.len(),
        points = order.len(),
        "cut boundary surface"
    );

    let positions: Vec<Point3<f64>> = order.iter().map(|i| curve.points[*i].position).collect();
    let stencils: Vec<Option<Stencil>> = order
        .iter()
        .map(|i| Some(curve.points[*i].stencil.clone()))
        .collect();

    SampledData::new(sample::coordinates(&positions), sample::gather(mesh, &stencils))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cubes() -> Mesh {
        let mut mesh = Mesh::uniform([3, 2, 2], [0.0; 3], [1.0; 3]);
        let x: Vec<f64> = mesh.points.column(0).to_vec();
        mesh.point_data
            .insert(DataArray::scalars("p", x.iter().map(|x| 10.0 + 10.0 * x).collect()));
        mesh
    }

    #[test]
    fn shared_faces_are_interior() {
        let mesh = two_cubes();
        // 2 cubes have 12 faces, one of them shared
        assert_eq!(boundary_faces(&mesh).len(), 10);
    }

    #[test]
    fn plane_cut_is_a_closed_loop() {
        let mesh = two_cubes();
        let faces = boundary_faces(&mesh);

        let out = boundary_curve(&mesh, &faces, Point3::new(0.0, 0.0, 0.5), Vector3::z(), &[]);

        // the rectangle z = 0.5 around [0, 2] x [0, 1], with corners on the
        // vertical edges and the two mid points at x = 1
        assert_eq!(out.num_points(), 6);
        assert!(out.points.column(2).iter().all(|z| (z - 0.5).abs() < 1e-12));

        let p = &out.point_data.get("p").unwrap().values;
        for (row, value) in out.points.rows().into_iter().zip(p.column(0)) {
            assert!((value - (10.0 + 10.0 * row[0])).abs() < 1e-12);
        }
    }

    #[test]
    fn clipped_cut_is_an_open_chain() {
        let mesh = two_cubes();
        let faces = boundary_faces(&mesh);
        let clips = Bounds::from_array([None, None, None, None, Some(0.0), None]).half_spaces();

        let out = boundary_curve(&mesh, &faces, Point3::new(0.0, 0.0, 0.5), Vector3::z(), &clips);

        // only the y = 0 side survives: x = 0, 1, 2 in chain order
        let x: Vec<f64> = out.points.column(0).to_vec();
        assert_eq!(out.num_points(), 3);
        assert!(out.points.column(1).iter().all(|y| y.abs() < 1e-12));
        assert!(x == vec![0.0, 1.0, 2.0] || x == vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn plane_outside_the_mesh() {
        let mesh = two_cubes();
        let faces = boundary_faces(&mesh);

        let out = boundary_curve(&mesh, &faces, Point3::new(0.0, 0.0, 5.0), Vector3::z(), &[]);
        assert_eq!(out.num_points(), 0);
        assert_eq!(out.point_data.get("p").unwrap().values.nrows(), 0);
    }

    #[test]
    fn clip_inserts_interpolated_point() {
        let mesh = two_cubes();
        let faces = boundary_faces(&mesh);
        let clips = vec![HalfSpace::new(Point3::new(0.5, 0.0, 0.0), Vector3::x())];

        let out = boundary_curve(&mesh, &faces, Point3::new(0.0, 0.0, 0.5), Vector3::z(), &clips);

        // the loop is opened at x = 0.5 on both long sides
        let x: Vec<f64> = out.points.column(0).to_vec();
        assert_eq!(out.num_points(), 6);
        assert!(x.iter().all(|x| *x >= 0.5 - 1e-12));
        assert_eq!(x.iter().filter(|x| (**x - 0.5).abs() < 1e-12).count(), 2);

        let p = &out.point_data.get("p").unwrap().values;
        for (x, value) in x.iter().zip(p.column(0)) {
            assert!((value - (10.0 + 10.0 * x)).abs() < 1e-12);
        }
    }
}
