#![doc = include_str!("../README.md")]

pub mod config;
mod data;
pub mod engine;
pub mod mesh;
pub mod parse;
pub mod prelude;
mod resolve;
mod source;
pub mod sweep;
mod traits;
mod write_vtk;

pub use traits::Engine;

pub use data::{Attributes, Bounds, DataArray, HalfSpace, Location, Query, SampledData};
pub use data::{Point, VALID_POINT_MASK};

pub use config::SweepConfig;
pub use engine::{LegacyDataset, LegacyEngine};
pub use mesh::{Cell, CellKind, Mesh};
pub use resolve::FieldResolver;
pub use source::{DataSource, Format};
pub use sweep::{Axis, FlatResult, Hierarchy, Method, SampleValue, Sweep, Value};

pub use parse::read_and_parse as read_vtk;
pub use write_vtk::write_vtk;

pub use nalgebra;
pub use ndarray;

use std::path::PathBuf;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("File `{0}` does not exist")]
    NotFound(PathBuf),
    #[error("Unsupported format `{extension}` of file `{path}`")]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("Data source has already been closed")]
    ClosedSource,
    #[error("Missing argument: `{0}`")]
    MissingArgument(String),
    #[error("Method `{method}` does not take an argument `{name}`")]
    UnknownArgument { method: &'static str, name: String },
    #[error("Invalid value for argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("Unsupported function `{0}`, expected one of probe, line, boundary_line")]
    UnsupportedMethod(String),
    #[error("Unexpected length of the probed array: {0}")]
    UnexpectedResultShape(usize),
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing legacy vtk file: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not (de)serialize json: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error("Array shape mismatch: `{0}`")]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    pub(crate) fn invalid<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Encoding of the data section of a legacy vtk file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// whitespace separated numbers
    Ascii,
    /// raw big endian bytes
    Binary,
}
