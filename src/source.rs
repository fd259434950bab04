//! # Data sources
//!
//! A [`DataSource`] owns one dataset opened through an [`Engine`] and answers
//! point, line and boundary curve queries on it. Each query builds a [`Query`],
//! materializes it through the engine and resolves the requested variable with
//! the [`FieldResolver`].
//!
//! A data source is opened once and closed once. Dropping it closes it, so the
//! dataset is released on every exit path:
//!
//! ```no_run
//! use vtk_probe::{DataSource, LegacyEngine};
//!
//! let engine = LegacyEngine::new();
//! let source = DataSource::open(&engine, "cavity.vtk")?;
//!
//! let pressure = source.probe("p", [0.5, 0.5, 0.5])?;
//! let velocity = source.line("U X", [[0.0, 0.5, 0.5], [1.0, 0.5, 0.5]], 100, true)?;
//! # Ok::<(), vtk_probe::Error>(())
//! ```

use crate::prelude::*;
use crate::resolve::FieldResolver;
use crate::data::Point;

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// File formats a data source can be opened from
pub enum Format {
    /// legacy `.vtk` files
    LegacyVtk,
}

impl Format {
    /// detect the format from the (case insensitive) file extension
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        if extension.eq_ignore_ascii_case("vtk") {
            Ok(Self::LegacyVtk)
        } else {
            Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            })
        }
    }
}

/// One opened dataset and the engine session it was opened in
pub struct DataSource<'e, E: Engine> {
    engine: &'e E,
    path: PathBuf,
    dataset: Option<E::Dataset>,
}

impl<'e, E: Engine> DataSource<'e, E> {
    /// open the file at `path` in `engine`
    ///
    /// Fails with [`Error::NotFound`] if `path` is not an existing file and with
    /// [`Error::UnsupportedFormat`] if its extension is not a known mesh format.
    pub fn open<P: AsRef<Path>>(engine: &'e E, path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let format = Format::from_path(path)?;
        let path = std::fs::canonicalize(path)?;
        let dataset = engine.open(&path, format)?;

        tracing::debug!(path = %path.display(), ?format, "opened data source");

        Ok(Self {
            engine,
            path,
            dataset: Some(dataset),
        })
    }

    /// absolute path of the opened file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.dataset.is_some()
    }

    /// release the dataset. Every query afterwards fails with [`Error::ClosedSource`]
    pub fn close(&mut self) {
        if let Some(dataset) = self.dataset.take() {
            tracing::debug!(path = %self.path.display(), "closing data source");
            self.engine.release(dataset);
        }
    }

    fn dataset(&self) -> Result<&E::Dataset, Error> {
        self.dataset.as_ref().ok_or(Error::ClosedSource)
    }

    /// names of the arrays stored at `location`, in the order the dataset lists them
    pub fn variables(&self, location: Location) -> Result<Vec<String>, Error> {
        Ok(self.engine.arrays(self.dataset()?, location))
    }

    /// value of `variable` at `point`
    ///
    /// `None` if the variable does not exist or `point` lies outside the mesh.
    /// Vectors give their magnitude, see [`FieldResolver`] for the names that
    /// can be resolved.
    pub fn probe(&self, variable: &str, point: Point) -> Result<Option<f64>, Error> {
        let dataset = self.dataset()?;
        let query = Query::Probe {
            center: Point3::from(point),
        };
        let values = FieldResolver::sample(self.engine, dataset, &query, variable, true)?;

        match values.as_deref() {
            None | Some([]) => Ok(None),
            Some([value]) => Ok(Some(*value)),
            Some(values) => Err(Error::UnexpectedResultShape(values.len())),
        }
    }

    /// values of `variable` at `npoints` evenly spaced samples from `line[0]` to `line[1]`
    ///
    /// With `only_inside` the samples outside the mesh are dropped, so fewer than
    /// `npoints` values may come back. Without it they are kept as NaN.
    pub fn line(
        &self,
        variable: &str,
        line: [Point; 2],
        npoints: usize,
        only_inside: bool,
    ) -> Result<Option<Vec<f64>>, Error> {
        let dataset = self.dataset()?;

        if npoints == 0 {
            return Err(Error::invalid("npoints", "a line needs at least one sample"));
        }

        let query = Query::Line {
            start: Point3::from(line[0]),
            end: Point3::from(line[1]),
            resolution: npoints - 1,
        };

        FieldResolver::sample(self.engine, dataset, &query, variable, only_inside)
    }

    /// values of `variable` along the curve where the plane through `origin` with
    /// `normal` cuts the boundary of the mesh, optionally limited to `bounds`
    pub fn boundary_line(
        &self,
        variable: &str,
        origin: Point,
        normal: Point,
        bounds: Option<&Bounds>,
    ) -> Result<Option<Vec<f64>>, Error> {
        let dataset = self.dataset()?;
        let normal = Vector3::from(normal);

        if normal.norm() == 0.0 {
            return Err(Error::invalid("normal", "the plane normal must not be zero"));
        }

        let query = Query::BoundaryCurve {
            origin: Point3::from(origin),
            normal,
            clips: bounds.map(Bounds::half_spaces).unwrap_or_default(),
        };

        FieldResolver::sample(self.engine, dataset, &query, variable, true)
    }
}

impl<'e, E: Engine> Drop for DataSource<'e, E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<'e, E: Engine> fmt::Display for DataSource<'e, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            write!(f, "DataSource (open, \"{}\")", self.path.display())
        } else {
            write!(f, "DataSource (closed)")
        }
    }
}

impl<'e, E: Engine> fmt::Debug for DataSource<'e, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// engine over empty files, counting open datasets
    #[derive(Default)]
    struct Counting {
        open: Cell<usize>,
        /// samples a point query answers with, one if zero
        point_rows: usize,
    }

    impl Engine for Counting {
        type Dataset = PathBuf;

        fn open(&self, path: &Path, _: Format) -> Result<PathBuf, Error> {
            self.open.set(self.open.get() + 1);
            Ok(path.to_path_buf())
        }

        fn arrays(&self, _: &PathBuf, location: Location) -> Vec<String> {
            match location {
                Location::Point => vec!["p".into()],
                Location::Cell => Vec::new(),
            }
        }

        fn execute(&self, _: &PathBuf, query: &Query) -> Result<SampledData, Error> {
            let n = match query {
                Query::Line { resolution, .. } => resolution + 1,
                Query::Probe { .. } => self.point_rows.max(1),
                _ => 1,
            };
            let mut point_data = Attributes::new();
            point_data.insert(DataArray::scalars("p", vec![1.5; n]));
            point_data.insert(DataArray::new("uv".into(), Array2::zeros((n, 2))));
            Ok(SampledData::new(Array2::zeros((n, 3)), point_data))
        }

        fn release(&self, _: PathBuf) {
            self.open.set(self.open.get() - 1);
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(Format::from_path(Path::new("a/b.VTK")).unwrap(), Format::LegacyVtk);
        assert_eq!(Format::from_path(Path::new("b.vtk")).unwrap(), Format::LegacyVtk);

        let err = Format::from_path(Path::new("b.vtu")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { extension, .. } if extension == "vtu"));
        assert!(Format::from_path(Path::new("vtk")).is_err());
    }

    #[test]
    fn missing_file() {
        let engine = Counting::default();
        let err = DataSource::open(&engine, "does/not/exist.vtk").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn unsupported_extension() {
        let engine = Counting::default();
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();

        let err = DataSource::open(&engine, file.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert_eq!(engine.open.get(), 0);
    }

    #[test]
    fn open_close_lifecycle() {
        let engine = Counting::default();
        let file = tempfile::Builder::new().suffix(".Vtk").tempfile().unwrap();

        let mut source = DataSource::open(&engine, file.path()).unwrap();
        let path = std::fs::canonicalize(file.path()).unwrap();

        assert!(source.path().is_absolute());
        assert_eq!(source.to_string(), format!("DataSource (open, \"{}\")", path.display()));
        assert_eq!(source.variables(Location::Point).unwrap(), vec!["p"]);
        assert_eq!(engine.open.get(), 1);

        source.close();
        assert_eq!(engine.open.get(), 0);
        assert_eq!(source.to_string(), "DataSource (closed)");
        assert!(matches!(source.variables(Location::Cell), Err(Error::ClosedSource)));
        assert!(matches!(source.probe("p", [0.0; 3]), Err(Error::ClosedSource)));

        // closing twice and dropping afterwards release nothing more
        source.close();
        drop(source);
        assert_eq!(engine.open.get(), 0);
    }

    #[test]
    fn drop_releases_dataset() {
        let engine = Counting::default();
        let file = tempfile::Builder::new().suffix(".vtk").tempfile().unwrap();

        {
            let _source = DataSource::open(&engine, file.path()).unwrap();
            assert_eq!(engine.open.get(), 1);
        }
        assert_eq!(engine.open.get(), 0);
    }

    #[test]
    fn argument_checks() {
        let engine = Counting::default();
        let file = tempfile::Builder::new().suffix(".vtk").tempfile().unwrap();
        let source = DataSource::open(&engine, file.path()).unwrap();

        let err = source.line("p", [[0.0; 3], [1.0; 3]], 0, true).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let err = source.boundary_line("p", [0.0; 3], [0.0; 3], None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn closed_source_is_reported_before_bad_arguments() {
        let engine = Counting::default();
        let file = tempfile::Builder::new().suffix(".vtk").tempfile().unwrap();
        let mut source = DataSource::open(&engine, file.path()).unwrap();
        source.close();

        let err = source.line("p", [[0.0; 3], [1.0; 3]], 0, true).unwrap_err();
        assert!(matches!(err, Error::ClosedSource));

        let err = source.boundary_line("p", [0.0; 3], [0.0; 3], None).unwrap_err();
        assert!(matches!(err, Error::ClosedSource));
    }

    #[test]
    fn two_component_array_keeps_one_value_per_sample() {
        let engine = Counting::default();
        let file = tempfile::Builder::new().suffix(".vtk").tempfile().unwrap();
        let source = DataSource::open(&engine, file.path()).unwrap();

        assert_eq!(source.line("uv", [[0.0; 3], [1.0; 3]], 4, false).unwrap(), None);
        assert_eq!(source.probe("uv", [0.0; 3]).unwrap(), None);

        assert_eq!(source.line("uv X", [[0.0; 3], [1.0; 3]], 4, false).unwrap(), Some(vec![0.0; 4]));
        assert_eq!(source.line("uv Y", [[0.0; 3], [1.0; 3]], 4, false).unwrap(), Some(vec![0.0; 4]));
        assert_eq!(source.probe("missing", [0.0; 3]).unwrap(), None);
    }

    #[test]
    fn several_samples_for_one_point_is_unexpected() {
        let engine = Counting {
            point_rows: 2,
            ..Counting::default()
        };
        let file = tempfile::Builder::new().suffix(".vtk").tempfile().unwrap();
        let source = DataSource::open(&engine, file.path()).unwrap();

        let err = source.probe("p", [0.0; 3]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResultShape(2)));

        let single = Counting::default();
        let source = DataSource::open(&single, file.path()).unwrap();
        assert_eq!(source.probe("p", [0.0; 3]).unwrap(), Some(1.5));
    }
}
