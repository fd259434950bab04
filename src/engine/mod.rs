//! # Legacy engine
//!
//! [`LegacyEngine`] is the in-crate implementation of [`Engine`]. It reads legacy
//! `.vtk` files into a [`Mesh`], locates sample points with a
//! [`CellLocator`], and interpolates every array of the mesh at the requested
//! samples.
//!
//! Probe and line queries report which samples fell inside the mesh through the
//! [`VALID_POINT_MASK`](crate::VALID_POINT_MASK) point array. The values of every
//! other array are NaN at samples outside the mesh. Boundary curves lie on the
//! mesh by construction and carry no mask.

mod boundary;
mod sample;

use crate::mesh::{CellLocator, Mesh};
use crate::prelude::*;
use crate::source::Format;

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
/// Engine session for legacy `.vtk` files. The session holds no state, every
/// dataset it opens is independent.
pub struct LegacyEngine;

impl LegacyEngine {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
/// A mesh opened by [`LegacyEngine`]
pub struct LegacyDataset {
    path: PathBuf,
    mesh: Mesh,
    locator: CellLocator,
    /// computed on the first boundary curve query
    boundary: OnceCell<Vec<boundary::BoundaryFace>>,
}

impl LegacyDataset {
    /// wrap a mesh that is already in memory
    pub fn from_mesh<P: Into<PathBuf>>(path: P, mesh: Mesh) -> Self {
        let locator = CellLocator::build(&mesh);

        Self {
            path: path.into(),
            mesh,
            locator,
            boundary: OnceCell::new(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Engine for LegacyEngine {
    type Dataset = LegacyDataset;

    fn open(&self, path: &Path, format: Format) -> Result<LegacyDataset, Error> {
        let mesh = match format {
            Format::LegacyVtk => crate::parse::read_and_parse(path)?,
        };

        tracing::info!(path = %path.display(), "opened dataset");

        Ok(LegacyDataset::from_mesh(path, mesh))
    }

    fn arrays(&self, dataset: &LegacyDataset, location: Location) -> Vec<String> {
        dataset.mesh.arrays(location).names()
    }

    fn execute(&self, dataset: &LegacyDataset, query: &Query) -> Result<SampledData, Error> {
        tracing::debug!(?query, path = %dataset.path.display(), "executing query");

        let mesh = &dataset.mesh;

        let out = match query {
            Query::Probe { center } => sample::sample_points(mesh, &dataset.locator, &[*center]),
            Query::Line {
                start,
                end,
                resolution,
            } => {
                let points = line_points(*start, *end, *resolution);
                sample::sample_points(mesh, &dataset.locator, &points)
            }
            Query::BoundaryCurve {
                origin,
                normal,
                clips,
            } => {
                if normal.norm() == 0.0 {
                    return Err(Error::invalid("normal", "the plane normal must not be zero"));
                }

                let faces = dataset.boundary.get_or_init(|| boundary::boundary_faces(mesh));
                boundary::boundary_curve(mesh, faces, *origin, *normal, clips)
            }
        };

        tracing::debug!(samples = out.num_points(), "query materialized");

        Ok(out)
    }

    fn release(&self, dataset: LegacyDataset) {
        tracing::info!(path = %dataset.path.display(), "released dataset");
        drop(dataset);
    }
}

/// `resolution + 1` evenly spaced points from `start` to `end`
fn line_points(start: Point3<f64>, end: Point3<f64>, resolution: usize) -> Vec<Point3<f64>> {
    if resolution == 0 {
        return vec![start];
    }

    (0..=resolution)
        .map(|i| start.lerp(&end, i as f64 / resolution as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VALID_POINT_MASK;

    fn dataset() -> LegacyDataset {
        let mut mesh = Mesh::uniform([3, 2, 2], [0.0; 3], [1.0; 3]);
        let x: Vec<f64> = mesh.points.column(0).to_vec();
        mesh.point_data
            .insert(DataArray::scalars("p", x.iter().map(|x| 10.0 + 10.0 * x).collect()));
        LegacyDataset::from_mesh("memory.vtk", mesh)
    }

    #[test]
    fn line_sample_count() {
        let origin = Point3::origin();
        assert_eq!(line_points(origin, Point3::new(1.0, 1.0, 1.0), 0), vec![origin]);

        let points = line_points(origin, Point3::new(2.0, 0.0, 0.0), 4);
        assert_eq!(points.len(), 5);
        assert_eq!(points[1], Point3::new(0.5, 0.0, 0.0));
        assert_eq!(points[4], Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn line_query_masks_outside_samples() {
        let engine = LegacyEngine::new();
        let query = Query::Line {
            start: Point3::new(-1.0, 0.5, 0.5),
            end: Point3::new(2.0, 0.5, 0.5),
            resolution: 3,
        };

        let out = engine.execute(&dataset(), &query).unwrap();

        let mask = out.point_data.get(VALID_POINT_MASK).unwrap();
        assert_eq!(mask.values.column(0).to_vec(), vec![0.0, 1.0, 1.0, 1.0]);

        let p = out.point_data.get("p").unwrap();
        assert!(p.values[[0, 0]].is_nan());
        assert_eq!(p.values[[3, 0]], 30.0);
    }

    #[test]
    fn zero_normal_is_rejected() {
        let engine = LegacyEngine::new();
        let query = Query::BoundaryCurve {
            origin: Point3::origin(),
            normal: Vector3::zeros(),
            clips: vec![],
        };

        let out = engine.execute(&dataset(), &query);
        assert!(matches!(out, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn boundary_faces_are_cached() {
        let engine = LegacyEngine::new();
        let data = dataset();
        let query = Query::BoundaryCurve {
            origin: Point3::new(1.0, 0.0, 0.0),
            normal: Vector3::x(),
            clips: vec![],
        };

        let first = engine.execute(&data, &query).unwrap();
        assert!(data.boundary.get().is_some());
        let second = engine.execute(&data, &query).unwrap();

        assert_eq!(first, second);
        assert!(first
            .point_data
            .get("p")
            .unwrap()
            .values
            .iter()
            .all(|p| (p - 20.0).abs() < 1e-12));
    }
}
