use super::Mesh;
use crate::prelude::*;

const MAX_BINS_PER_AXIS: usize = 64;

#[derive(Debug, Clone)]
/// Uniform bins over the mesh bounds, each holding the volumetric cells whose
/// bounding boxes overlap it.
pub struct CellLocator {
    lo: Point3<f64>,
    hi: Point3<f64>,
    dims: [usize; 3],
    bins: Vec<Vec<usize>>,
    cell_bounds: Vec<Option<(Point3<f64>, Point3<f64>)>>,
}

impl CellLocator {
    pub fn build(mesh: &Mesh) -> Self {
        let cell_bounds: Vec<_> = mesh
            .cells
            .iter()
            .map(|cell| {
                if !cell.kind.is_volumetric() {
                    return None;
                }
                let (lo, hi) = mesh.bounds_of(&cell.points)?;
                let pad = Vector3::repeat((hi - lo).norm() * super::cell::TOLERANCE);
                Some((lo - pad, hi + pad))
            })
            .collect();

        let volumetric = cell_bounds.iter().filter(|b| b.is_some()).count();

        let (lo, hi) = cell_bounds
            .iter()
            .flatten()
            .fold(None, |acc: Option<(Point3<f64>, Point3<f64>)>, (clo, chi)| match acc {
                None => Some((*clo, *chi)),
                Some((lo, hi)) => Some((lo.inf(clo), hi.sup(chi))),
            })
            .unwrap_or((Point3::origin(), Point3::origin()));

        let per_axis = ((volumetric as f64).cbrt().ceil() as usize).clamp(1, MAX_BINS_PER_AXIS);
        let dims = [per_axis, per_axis, per_axis];

        let mut locator = Self {
            lo,
            hi,
            dims,
            bins: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
            cell_bounds,
        };

        for cell_id in 0..locator.cell_bounds.len() {
            if let Some((clo, chi)) = locator.cell_bounds[cell_id] {
                let start = locator.bin_of(&clo);
                let end = locator.bin_of(&chi);
                for k in start[2]..=end[2] {
                    for j in start[1]..=end[1] {
                        for i in start[0]..=end[0] {
                            let index = locator.flat(i, j, k);
                            locator.bins[index].push(cell_id);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            cells = volumetric,
            bins = locator.bins.len(),
            "built cell locator"
        );

        locator
    }

    /// find the first cell containing `p` and the interpolation weights of `p` in it
    pub fn locate(&self, mesh: &Mesh, p: &Point3<f64>) -> Option<(usize, Vec<f64>)> {
        if (0..3).any(|a| p[a] < self.lo[a] || p[a] > self.hi[a]) {
            return None;
        }

        let [i, j, k] = self.bin_of(p);

        self.bins[self.flat(i, j, k)].iter().find_map(|cell_id| {
            let (clo, chi) = self.cell_bounds[*cell_id]?;
            if (0..3).any(|a| p[a] < clo[a] || p[a] > chi[a]) {
                return None;
            }

            mesh.cells[*cell_id]
                .weights(&mesh.points, p)
                .map(|weights| (*cell_id, weights))
        })
    }

    fn bin_of(&self, p: &Point3<f64>) -> [usize; 3] {
        let mut out = [0; 3];
        for a in 0..3 {
            let extent = self.hi[a] - self.lo[a];
            if extent > 0.0 {
                let t = (p[a] - self.lo[a]) / extent * self.dims[a] as f64;
                out[a] = (t.max(0.0) as usize).min(self.dims[a] - 1);
            }
        }
        out
    }

    fn flat(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }
}
