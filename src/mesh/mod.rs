//! # Mesh Information
//!
//! A [`Mesh`] is the in-memory form of one opened dataset: point coordinates, the
//! cells connecting them, and the arrays attached to points and cells.
//!
//! Every legacy dataset type is normalised into this one representation when it is
//! read. Structured datasets (`STRUCTURED_POINTS`, `RECTILINEAR_GRID`) become
//! voxels, curvilinear `STRUCTURED_GRID`s become hexahedra, and unstructured grids
//! keep whatever cells the file lists. Only volumetric cells (see
//! [`CellKind::is_volumetric`]) can contain a probed point, so datasets made only of
//! surface or line cells load fine but every probe on them falls outside the
//! domain.
//!
//! Point ids of structured datasets run with `x` fastest, then `y`, then `z`, which
//! is also the order the values appear in the file.

mod cell;
mod locator;

pub use cell::{Cell, CellKind};
pub use locator::CellLocator;

use crate::data::Point;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// `(n, 3)` point coordinates
    pub points: Array2<f64>,
    pub cells: Vec<Cell>,
    pub point_data: Attributes,
    pub cell_data: Attributes,
}

impl Mesh {
    /// create a mesh without any attached arrays
    pub fn new(points: Array2<f64>, cells: Vec<Cell>) -> Self {
        Self {
            points,
            cells,
            point_data: Attributes::new(),
            cell_data: Attributes::new(),
        }
    }

    /// regular grid of `dims` points starting at `origin` with constant `spacing`
    pub fn uniform(dims: [usize; 3], origin: Point, spacing: Point) -> Self {
        let axis = |a: usize| -> Vec<f64> {
            (0..dims[a])
                .map(|i| origin[a] + spacing[a] * i as f64)
                .collect()
        };

        Self::rectilinear(&axis(0), &axis(1), &axis(2))
    }

    /// axis aligned grid with the given coordinates along each axis
    pub fn rectilinear(x: &[f64], y: &[f64], z: &[f64]) -> Self {
        let dims = [x.len(), y.len(), z.len()];
        let mut points = Array2::zeros((dims[0] * dims[1] * dims[2], 3));

        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let id = i + dims[0] * (j + dims[1] * k);
                    points[[id, 0]] = x[i];
                    points[[id, 1]] = y[j];
                    points[[id, 2]] = z[k];
                }
            }
        }

        Self::new(points, structured_cells(dims, CellKind::Voxel))
    }

    /// curvilinear grid of `dims` points. `points` must hold `dims[0] * dims[1] * dims[2]` rows
    pub fn structured(dims: [usize; 3], points: Array2<f64>) -> Self {
        Self::new(points, structured_cells(dims, CellKind::Hexahedron))
    }

    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn point(&self, id: usize) -> Point3<f64> {
        let row = self.points.row(id);
        Point3::new(row[0], row[1], row[2])
    }

    /// bounding box of the given points, `None` if the list is empty
    pub fn bounds_of(&self, ids: &[usize]) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = ids.iter().map(|id| self.point(*id));
        let first = iter.next()?;

        Some(iter.fold((first, first), |(lo, hi), p| (lo.inf(&p), hi.sup(&p))))
    }

    /// bounding box of every point of the mesh
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let ids: Vec<usize> = (0..self.num_points()).collect();
        self.bounds_of(&ids)
    }

    pub fn arrays(&self, location: Location) -> &Attributes {
        match location {
            Location::Point => &self.point_data,
            Location::Cell => &self.cell_data,
        }
    }
}

fn structured_cells(dims: [usize; 3], kind: CellKind) -> Vec<Cell> {
    if dims.iter().any(|d| *d < 2) {
        return Vec::new();
    }

    let id = |i: usize, j: usize, k: usize| i + dims[0] * (j + dims[1] * k);
    let mut cells = Vec::with_capacity((dims[0] - 1) * (dims[1] - 1) * (dims[2] - 1));

    for k in 0..dims[2] - 1 {
        for j in 0..dims[1] - 1 {
            for i in 0..dims[0] - 1 {
                let points = match kind {
                    CellKind::Voxel => vec![
                        id(i, j, k),
                        id(i + 1, j, k),
                        id(i, j + 1, k),
                        id(i + 1, j + 1, k),
                        id(i, j, k + 1),
                        id(i + 1, j, k + 1),
                        id(i, j + 1, k + 1),
                        id(i + 1, j + 1, k + 1),
                    ],
                    _ => vec![
                        id(i, j, k),
                        id(i + 1, j, k),
                        id(i + 1, j + 1, k),
                        id(i, j + 1, k),
                        id(i, j, k + 1),
                        id(i + 1, j, k + 1),
                        id(i + 1, j + 1, k + 1),
                        id(i, j + 1, k + 1),
                    ],
                };
                cells.push(Cell::new(kind, points));
            }
        }
    }

    cells
}

#[test]
fn structured_ids() {
    let mesh = Mesh::uniform([3, 2, 2], [0.0; 3], [1.0; 3]);

    assert_eq!(mesh.num_points(), 12);
    assert_eq!(mesh.num_cells(), 2);
    assert_eq!(mesh.point(4), Point3::new(1.0, 1.0, 0.0));
    assert_eq!(mesh.cells[1].points, vec![1, 2, 4, 5, 7, 8, 10, 11]);
    assert_eq!(mesh.bounds(), Some((Point3::origin(), Point3::new(2.0, 1.0, 1.0))));
}

#[test]
fn flat_grid_has_no_cells() {
    let mesh = Mesh::uniform([4, 4, 1], [0.0; 3], [1.0; 3]);
    assert_eq!(mesh.num_points(), 16);
    assert!(mesh.cells.is_empty());
}
