use crate::prelude::*;

/// parametric slack when deciding if a point is inside a cell
pub(crate) const TOLERANCE: f64 = 1e-6;

const NEWTON_ITERATIONS: usize = 30;

/// parametric coordinates of the hexahedron corners, in vtk point order
const HEX_CORNERS: [[f64; 3]; 8] = [
    [0., 0., 0.],
    [1., 0., 0.],
    [1., 1., 0.],
    [0., 1., 0.],
    [0., 0., 1.],
    [1., 0., 1.],
    [1., 1., 1.],
    [0., 1., 1.],
];

const TETRA_FACES: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];

const VOXEL_FACES: &[&[usize]] = &[
    &[0, 2, 6, 4],
    &[1, 5, 7, 3],
    &[0, 4, 5, 1],
    &[2, 3, 7, 6],
    &[0, 1, 3, 2],
    &[4, 6, 7, 5],
];

const HEXAHEDRON_FACES: &[&[usize]] = &[
    &[0, 4, 7, 3],
    &[1, 2, 6, 5],
    &[0, 1, 5, 4],
    &[3, 7, 6, 2],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];

const WEDGE_FACES: &[&[usize]] = &[
    &[0, 1, 2],
    &[3, 5, 4],
    &[0, 3, 4, 1],
    &[1, 4, 5, 2],
    &[2, 5, 3, 0],
];

const PYRAMID_FACES: &[&[usize]] = &[&[0, 3, 2, 1], &[0, 1, 4], &[1, 2, 4], &[2, 3, 4], &[3, 0, 4]];

const WEDGE_TETS: &[[usize; 4]] = &[[0, 1, 2, 3], [1, 2, 3, 4], [2, 3, 4, 5]];

const PYRAMID_TETS: &[[usize; 4]] = &[[0, 1, 2, 4], [0, 2, 3, 4]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The vtk cell types this crate can interpolate in. Every other type code is
/// carried through as `Other` so files containing them still load.
pub enum CellKind {
    Tetra,
    Voxel,
    Hexahedron,
    Wedge,
    Pyramid,
    Other(u32),
}

impl CellKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            10 => Self::Tetra,
            11 => Self::Voxel,
            12 => Self::Hexahedron,
            13 => Self::Wedge,
            14 => Self::Pyramid,
            other => Self::Other(other),
        }
    }

    /// the vtk type code, as written in `CELL_TYPES`
    pub fn code(&self) -> u32 {
        match self {
            Self::Tetra => 10,
            Self::Voxel => 11,
            Self::Hexahedron => 12,
            Self::Wedge => 13,
            Self::Pyramid => 14,
            Self::Other(code) => *code,
        }
    }

    /// fixed number of points for the volumetric kinds
    pub fn num_points(&self) -> Option<usize> {
        match self {
            Self::Tetra => Some(4),
            Self::Voxel | Self::Hexahedron => Some(8),
            Self::Wedge => Some(6),
            Self::Pyramid => Some(5),
            Self::Other(_) => None,
        }
    }

    pub fn is_volumetric(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    fn local_faces(&self) -> &'static [&'static [usize]] {
        match self {
            Self::Tetra => TETRA_FACES,
            Self::Voxel => VOXEL_FACES,
            Self::Hexahedron => HEXAHEDRON_FACES,
            Self::Wedge => WEDGE_FACES,
            Self::Pyramid => PYRAMID_FACES,
            Self::Other(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Cell {
    pub kind: CellKind,
    /// global point ids, in vtk order for `kind`
    pub points: Vec<usize>,
}

impl Cell {
    /// faces of the cell as global point ids, outward ordered. Empty for
    /// non-volumetric cells
    pub fn faces(&self) -> Vec<Vec<usize>> {
        self.kind
            .local_faces()
            .iter()
            .map(|face| face.iter().map(|local| self.points[*local]).collect())
            .collect()
    }

    /// interpolation weights of `p` with respect to the cell's points, or `None`
    /// if `p` is outside the cell
    pub fn weights(&self, coordinates: &Array2<f64>, p: &Point3<f64>) -> Option<Vec<f64>> {
        let corner = |local: usize| -> Point3<f64> {
            let row = coordinates.row(self.points[local]);
            Point3::new(row[0], row[1], row[2])
        };

        match self.kind {
            CellKind::Tetra => {
                tetra_weights([corner(0), corner(1), corner(2), corner(3)], p).map(|w| w.to_vec())
            }
            CellKind::Voxel => voxel_weights(&corner(0), &corner(7), p).map(|w| w.to_vec()),
            CellKind::Hexahedron => {
                let corners: [Point3<f64>; 8] = std::array::from_fn(corner);
                hexahedron_weights(&corners, p).map(|w| w.to_vec())
            }
            CellKind::Wedge => decomposed_weights(WEDGE_TETS, 6, corner, p),
            CellKind::Pyramid => decomposed_weights(PYRAMID_TETS, 5, corner, p),
            CellKind::Other(_) => None,
        }
    }
}

fn inside(r: f64) -> bool {
    (-TOLERANCE..=1.0 + TOLERANCE).contains(&r)
}

/// barycentric coordinates of `p` in the tetrahedron `c`
fn tetra_weights(c: [Point3<f64>; 4], p: &Point3<f64>) -> Option<[f64; 4]> {
    let edges = Matrix3::from_columns(&[c[1] - c[0], c[2] - c[0], c[3] - c[0]]);
    let b = edges.lu().solve(&(p - c[0]))?;

    let weights = [1.0 - b.sum(), b[0], b[1], b[2]];

    if weights.iter().all(|w| *w >= -TOLERANCE) {
        Some(weights)
    } else {
        None
    }
}

/// trilinear weights in the axis aligned box spanned by `lo` (point 0) and `hi` (point 7)
fn voxel_weights(lo: &Point3<f64>, hi: &Point3<f64>, p: &Point3<f64>) -> Option<[f64; 8]> {
    let mut r = Vector3::<f64>::zeros();

    for axis in 0..3 {
        let extent = hi[axis] - lo[axis];
        if extent == 0.0 {
            return None;
        }
        r[axis] = (p[axis] - lo[axis]) / extent;
        if !inside(r[axis]) {
            return None;
        }
        r[axis] = r[axis].clamp(0.0, 1.0);
    }

    let mut weights = [0.0; 8];
    for (index, w) in weights.iter_mut().enumerate() {
        let fx = if index & 1 == 1 { r[0] } else { 1.0 - r[0] };
        let fy = if index & 2 == 2 { r[1] } else { 1.0 - r[1] };
        let fz = if index & 4 == 4 { r[2] } else { 1.0 - r[2] };
        *w = fx * fy * fz;
    }

    Some(weights)
}

fn hex_shape(r: &Vector3<f64>) -> [f64; 8] {
    let mut n = [0.0; 8];
    for (i, corner) in HEX_CORNERS.iter().enumerate() {
        n[i] = (0..3)
            .map(|a| if corner[a] == 1.0 { r[a] } else { 1.0 - r[a] })
            .product();
    }
    n
}

/// trilinear weights in a general hexahedron, inverting the parametric map with
/// Newton's method
fn hexahedron_weights(corners: &[Point3<f64>; 8], p: &Point3<f64>) -> Option<[f64; 8]> {
    let mut r = Vector3::<f64>::repeat(0.5);
    let mut converged = false;

    for _ in 0..NEWTON_ITERATIONS {
        let n = hex_shape(&r);

        let mut x = Vector3::<f64>::zeros();
        let mut jacobian = Matrix3::<f64>::zeros();

        for (i, corner) in HEX_CORNERS.iter().enumerate() {
            x += corners[i].coords * n[i];

            for col in 0..3 {
                let sign = if corner[col] == 1.0 { 1.0 } else { -1.0 };
                let rest: f64 = (0..3)
                    .filter(|a| *a != col)
                    .map(|a| if corner[a] == 1.0 { r[a] } else { 1.0 - r[a] })
                    .product();
                for row in 0..3 {
                    jacobian[(row, col)] += sign * rest * corners[i][row];
                }
            }
        }

        let delta = jacobian.lu().solve(&(p.coords - x))?;
        r += delta;

        if delta.norm() < 1e-12 {
            converged = true;
            break;
        }
    }

    if !converged || !r.iter().all(|v| inside(*v)) {
        return None;
    }

    Some(hex_shape(&r.map(|v| v.clamp(0.0, 1.0))))
}

fn decomposed_weights<F>(tets: &[[usize; 4]], num_points: usize, corner: F, p: &Point3<f64>) -> Option<Vec<f64>>
where
    F: Fn(usize) -> Point3<f64>,
{
    tets.iter().find_map(|tet| {
        let corners = [corner(tet[0]), corner(tet[1]), corner(tet[2]), corner(tet[3])];
        tetra_weights(corners, p).map(|w| {
            let mut weights = vec![0.0; num_points];
            for (local, value) in tet.iter().zip(w) {
                weights[*local] = value;
            }
            weights
        })
    })
}
