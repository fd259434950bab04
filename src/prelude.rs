//! Common traits and types that are useful for working with `vtk_probe`
#![allow(unused_imports)]

pub use crate::data::{Attributes, Bounds, DataArray, HalfSpace, Location, Query, SampledData};
pub use crate::source::DataSource;
pub use crate::sweep::{Axis, Method, SampleValue, Sweep, Value};
pub use crate::traits::Engine;

pub(crate) use crate::Error;

pub(crate) use derive_more::{Constructor, Deref, DerefMut, Display, From};

pub(crate) use ndarray::{Array1, Array2};

pub(crate) use nalgebra::{Matrix3, Point3, Vector3};

pub(crate) use serde::{Deserialize, Serialize};

pub(crate) use std::fmt;
