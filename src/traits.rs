//! # Traits
//!
//! The [`Engine`] trait is the boundary between this crate and whatever actually
//! reads meshes and runs geometric filters on them. [`LegacyEngine`](crate::LegacyEngine)
//! implements it for legacy `.vtk` files; a binding to an external visualization
//! toolkit would implement it the same way.

use crate::data::{Location, Query, SampledData};
use crate::source::Format;
use crate::Error;
use std::path::Path;

/// A mesh engine session.
///
/// Every call receives the dataset it operates on explicitly, there is no notion
/// of an "active" dataset held by the engine. The session itself is not assumed to
/// be safe to share between threads running queries concurrently; run one session
/// per worker if you need parallelism.
///
/// ```ignore
/// struct Session;
///
/// impl vtk_probe::Engine for Session {
///     type Dataset = MyHandle;
///
///     fn open(&self, path: &Path, format: Format) -> Result<MyHandle, vtk_probe::Error> { .. }
///     fn arrays(&self, dataset: &MyHandle, location: Location) -> Vec<String> { .. }
///     fn execute(&self, dataset: &MyHandle, query: &Query) -> Result<SampledData, vtk_probe::Error> { .. }
///     fn release(&self, dataset: MyHandle) { .. }
/// }
/// ```
pub trait Engine {
    /// handle to one opened mesh file
    type Dataset;

    /// open a file that is known to exist and to have the given format
    fn open(&self, path: &Path, format: Format) -> Result<Self::Dataset, Error>;

    /// names of the arrays stored at `location`, in the order the dataset stores them
    fn arrays(&self, dataset: &Self::Dataset, location: Location) -> Vec<String>;

    /// build and materialize the pipeline described by `query` on top of `dataset`
    fn execute(&self, dataset: &Self::Dataset, query: &Query) -> Result<SampledData, Error>;

    /// deterministically free everything associated with `dataset`
    fn release(&self, dataset: Self::Dataset);
}
