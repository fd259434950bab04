use crate::mesh::{CellLocator, Mesh};
use crate::prelude::*;
use crate::VALID_POINT_MASK;

#[derive(Debug, Clone, PartialEq, Constructor)]
/// How one output sample is built from the mesh: a weighted sum over mesh
/// points for point arrays, and the value of `cell` for cell arrays
pub(super) struct Stencil {
    pub(super) cell: usize,
    pub(super) weights: Vec<(usize, f64)>,
}

impl Stencil {
    /// `(1 - t) * a + t * b`, taking cell values from `cell`
    pub(super) fn blend(a: &Stencil, b: &Stencil, t: f64, cell: usize) -> Self {
        let weights = a
            .weights
            .iter()
            .map(|(id, w)| (*id, w * (1.0 - t)))
            .chain(b.weights.iter().map(|(id, w)| (*id, w * t)))
            .collect();

        Self::new(cell, weights)
    }
}

/// `(n, 3)` array of coordinates
pub(super) fn coordinates(points: &[Point3<f64>]) -> Array2<f64> {
    Array2::from_shape_fn((points.len(), 3), |(i, axis)| points[i][axis])
}

/// probe `mesh` at every point, adding the validity mask
pub(super) fn sample_points(mesh: &Mesh, locator: &CellLocator, points: &[Point3<f64>]) -> SampledData {
    let stencils: Vec<Option<Stencil>> = points
        .iter()
        .map(|p| {
            locator.locate(mesh, p).map(|(cell, weights)| {
                let ids = mesh.cells[cell].points.iter().copied();
                Stencil::new(cell, ids.zip(weights).collect())
            })
        })
        .collect();

    let inside = stencils.iter().filter(|s| s.is_some()).count();
    tracing::trace!(samples = points.len(), inside, "located sample points");

    let mask = stencils
        .iter()
        .map(|s| if s.is_some() { 1.0 } else { 0.0 })
        .collect();

    let mut point_data = gather(mesh, &stencils);
    point_data.insert(DataArray::scalars(VALID_POINT_MASK, mask));

    SampledData::new(coordinates(points), point_data)
}

/// evaluate every array of `mesh` through the stencils. Point arrays come first in
/// their stored order, followed by the cell arrays that no point array shadows.
/// Samples without a stencil are NaN
pub(super) fn gather(mesh: &Mesh, stencils: &[Option<Stencil>]) -> Attributes {
    let mut out = Attributes::new();

    for array in mesh.point_data.iter() {
        let mut values = Array2::from_elem((stencils.len(), array.components()), f64::NAN);

        for (mut row, stencil) in values.rows_mut().into_iter().zip(stencils) {
            if let Some(stencil) = stencil {
                row.fill(0.0);
                for (id, weight) in &stencil.weights {
                    row.scaled_add(*weight, &array.values.row(*id));
                }
            }
        }

        out.insert(DataArray::new(array.name.clone(), values));
    }

    for array in mesh.cell_data.iter() {
        if out.contains(&array.name) {
            continue;
        }

        let mut values = Array2::from_elem((stencils.len(), array.components()), f64::NAN);

        for (mut row, stencil) in values.rows_mut().into_iter().zip(stencils) {
            if let Some(stencil) = stencil {
                row.assign(&array.values.row(stencil.cell));
            }
        }

        out.insert(DataArray::new(array.name.clone(), values));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_mesh() -> Mesh {
        let mut mesh = Mesh::uniform([3, 2, 2], [0.0; 3], [1.0; 3]);
        let x: Vec<f64> = mesh.points.column(0).to_vec();

        mesh.point_data
            .insert(DataArray::scalars("p", x.iter().map(|x| 10.0 + 10.0 * x).collect()));
        let velocity: Vec<[f64; 3]> = x.iter().map(|x| [0.0, 0.0, 1.0 + x]).collect();
        mesh.point_data.insert(DataArray::vectors("u", &velocity));
        mesh.cell_data.insert(DataArray::scalars("id", vec![0.0, 1.0]));
        mesh.cell_data.insert(DataArray::scalars("p", vec![-1.0, -1.0]));
        mesh
    }

    #[test]
    fn interpolates_point_and_cell_arrays() {
        let mesh = linear_mesh();
        let locator = CellLocator::build(&mesh);

        let out = sample_points(
            &mesh,
            &locator,
            &[Point3::new(1.5, 0.5, 0.5), Point3::new(3.0, 0.5, 0.5)],
        );

        assert_eq!(out.num_points(), 2);
        assert_eq!(out.point_data.names(), vec!["p", "u", "id", VALID_POINT_MASK]);

        let p = &out.point_data.get("p").unwrap().values;
        assert!((p[[0, 0]] - 25.0).abs() < 1e-12);
        assert!(p[[1, 0]].is_nan());

        let u = &out.point_data.get("u").unwrap().values;
        assert!((u[[0, 2]] - 2.5).abs() < 1e-12);

        assert_eq!(out.point_data.get("id").unwrap().values[[0, 0]], 1.0);

        let mask = &out.point_data.get(VALID_POINT_MASK).unwrap().values;
        assert_eq!(mask.column(0).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn blend_scales_both_sides() {
        let a = Stencil::new(0, vec![(0, 1.0)]);
        let b = Stencil::new(1, vec![(1, 0.5), (2, 0.5)]);

        let c = Stencil::blend(&a, &b, 0.25, 1);
        assert_eq!(c.cell, 1);
        assert_eq!(c.weights, vec![(0, 0.75), (1, 0.125), (2, 0.125)]);
    }
}
