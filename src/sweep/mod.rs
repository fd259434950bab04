//! # Parameter sweeps
//!
//! A [`Sweep`] evaluates one [`Method`] of [`DataSource`] for every combination
//! of a set of parameter [`Axis`] values. The `filename` axis is the outer loop:
//! each file is opened once, queried for every combination of the other axes and
//! released before the next file is opened.
//!
//! Results are keyed by the labels of the axes holding more than one value, in a
//! fixed order: `filename` first, then the parameters of the method in
//! declaration order. Axes with a single value are left out of the keys.
//!
//! ```no_run
//! use vtk_probe::{Axis, LegacyEngine, Method, Sweep};
//!
//! let sweep = Sweep::new(Method::Probe)
//!     .axis("filename", Axis::labelled([("case1.vtk", "case1"), ("case2.vtk", "case2")]))
//!     .axis("variable", Axis::labelled([("PPressure", "p"), ("PVelocity Z", "uz")]))
//!     .axis("point", Axis::single([0.5, 0.5, 0.5]));
//!
//! let results = sweep.run(&LegacyEngine::new())?;
//! // keys are (file label, variable label), the single point is not part of them
//! let key = vec!["case1".to_string(), "p".to_string()];
//! println!("{:?}", results[&key]);
//! # Ok::<(), vtk_probe::Error>(())
//! ```

mod axis;
mod hierarchy;
mod method;

pub use axis::{Axis, Value};
pub use hierarchy::Hierarchy;
pub use method::{Method, Parameter, DEFAULT_NPOINTS, DEFAULT_ONLY_INSIDE};

use crate::prelude::*;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// name of the axis holding the files to open
pub const FILENAME: &str = "filename";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// The result of one query. Serializes as `null`, a number or an array of numbers
pub enum SampleValue {
    /// the variable does not exist, or the probed point is outside the mesh
    Absent,
    Scalar(f64),
    Series(Vec<f64>),
}

impl SampleValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Self::Series(values) => Some(values),
            _ => None,
        }
    }
}

impl From<Option<f64>> for SampleValue {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::Scalar).unwrap_or(Self::Absent)
    }
}

impl From<Option<Vec<f64>>> for SampleValue {
    fn from(values: Option<Vec<f64>>) -> Self {
        values.map(Self::Series).unwrap_or(Self::Absent)
    }
}

/// results of a sweep by key
pub type FlatResult = BTreeMap<Vec<String>, SampleValue>;

#[derive(Debug, Clone, PartialEq)]
/// A set of parameter axes and the method to evaluate over them
pub struct Sweep {
    method: Method,
    axes: Vec<(String, Axis)>,
}

impl Sweep {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            axes: Vec::new(),
        }
    }

    /// set the axis of parameter `name`, replacing an earlier axis of the same name
    pub fn axis<N: Into<String>>(mut self, name: N, axis: Axis) -> Self {
        let name = name.into();

        match self.axes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = axis,
            None => self.axes.push((name, axis)),
        }

        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn get(&self, name: &str) -> Option<&Axis> {
        self.axes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, axis)| axis)
    }

    /// the supplied axes in key order, after checking them against the method
    fn ordered_axes(&self) -> Result<Vec<(&'static str, &Axis)>, Error> {
        let schema = std::iter::once(Parameter {
            name: FILENAME,
            required: true,
        })
        .chain(self.method.parameters().iter().copied());

        let mut ordered = Vec::with_capacity(self.axes.len());

        for parameter in schema {
            match self.get(parameter.name) {
                Some(axis) => ordered.push((parameter.name, axis)),
                None if parameter.required => return Err(Error::MissingArgument(parameter.name.to_string())),
                None => {}
            }
        }

        if let Some((name, _)) = self
            .axes
            .iter()
            .find(|(name, _)| !ordered.iter().any(|(known, _)| known == name))
        {
            return Err(Error::UnknownArgument {
                method: self.method.name(),
                name: name.clone(),
            });
        }

        Ok(ordered)
    }

    /// evaluate every combination of the axes
    ///
    /// Arguments are checked before any file is opened. The first failing query
    /// aborts the sweep; the file it ran on is released either way.
    pub fn run<E: Engine>(&self, engine: &E) -> Result<FlatResult, Error> {
        let axes = self.ordered_axes()?;
        let (files, rest) = match axes.split_first() {
            Some(((_, files), rest)) => (*files, rest),
            None => return Err(Error::MissingArgument(FILENAME.to_string())),
        };

        let lengths: Vec<usize> = rest.iter().map(|(_, axis)| axis.len()).collect();
        let mut out = FlatResult::new();

        tracing::info!(
            method = %self.method,
            files = files.len(),
            combinations = lengths.iter().product::<usize>(),
            "starting sweep"
        );

        for (file, file_label) in files.entries() {
            let source = DataSource::open(engine, file.as_text(FILENAME)?)?;

            for combination in Combinations::new(lengths.clone()) {
                let mut args: HashMap<&str, &Value> = HashMap::with_capacity(rest.len());
                let mut key = Vec::with_capacity(axes.len());

                if files.is_free() {
                    key.push(file_label.clone());
                }

                for ((name, axis), index) in rest.iter().zip(&combination) {
                    let (value, label) = &axis.entries()[*index];
                    args.insert(*name, value);
                    if axis.is_free() {
                        key.push(label.clone());
                    }
                }

                let value = self.method.invoke(&source, &args)?;
                tracing::debug!(?key, absent = value.is_absent(), "evaluated combination");

                out.insert(key, value);
            }
        }

        Ok(out)
    }

    /// run the sweep and nest the results by key
    pub fn hierarchy<E: Engine>(&self, engine: &E) -> Result<Hierarchy, Error> {
        Ok(Hierarchy::from_flat(&self.run(engine)?))
    }

    /// run the sweep and save the nested results as JSON at `path`
    pub fn to_json<E: Engine, P: AsRef<Path>>(&self, path: P, engine: &E) -> Result<Hierarchy, Error> {
        let hierarchy = self.hierarchy(engine)?;
        hierarchy.save(path)?;
        Ok(hierarchy)
    }
}

/// indices of every element of the cartesian product of axes with the given
/// lengths, the last axis varying fastest
struct Combinations {
    lengths: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Combinations {
    fn new(lengths: Vec<usize>) -> Self {
        let next = if lengths.contains(&0) {
            None
        } else {
            Some(vec![0; lengths.len()])
        };

        Self { lengths, next }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();

        for axis in (0..following.len()).rev() {
            following[axis] += 1;
            if following[axis] < self.lengths[axis] {
                self.next = Some(following);
                break;
            }
            following[axis] = 0;
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_in_nested_loop_order() {
        let all: Vec<_> = Combinations::new(vec![2, 3]).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );

        assert_eq!(Combinations::new(vec![]).count(), 1);
        assert_eq!(Combinations::new(vec![3, 0]).count(), 0);
    }

    #[test]
    fn missing_axis_is_reported_in_schema_order() {
        let sweep = Sweep::new(Method::Line).axis("variable", Axis::single("p"));
        assert!(matches!(sweep.ordered_axes(), Err(Error::MissingArgument(name)) if name == "filename"));

        let sweep = sweep.axis(FILENAME, Axis::single("a.vtk"));
        assert!(matches!(sweep.ordered_axes(), Err(Error::MissingArgument(name)) if name == "line"));
    }

    #[test]
    fn unknown_axis_is_rejected() {
        let sweep = Sweep::new(Method::Probe)
            .axis("point", Axis::single([0.0; 3]))
            .axis("variable", Axis::single("p"))
            .axis(FILENAME, Axis::single("a.vtk"))
            .axis("npoints", Axis::single(10usize));

        let err = sweep.ordered_axes().unwrap_err();
        assert!(matches!(err, Error::UnknownArgument { method: "probe", name } if name == "npoints"));
    }

    #[test]
    fn axes_follow_the_schema() {
        let sweep = Sweep::new(Method::Line)
            .axis("only_inside", Axis::single(false))
            .axis("line", Axis::single([[0.0; 3], [1.0; 3]]))
            .axis("variable", Axis::single("p"))
            .axis(FILENAME, Axis::single("a.vtk"));

        let names: Vec<_> = sweep.ordered_axes().unwrap().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["filename", "variable", "line", "only_inside"]);
    }

    #[test]
    fn replacing_an_axis() {
        let sweep = Sweep::new(Method::Probe)
            .axis("variable", Axis::single("p"))
            .axis("variable", Axis::labelled([("p", "p"), ("u", "u")]));
        assert_eq!(sweep.get("variable").map(Axis::len), Some(2));
    }

    #[test]
    fn sample_values_serialize_plainly() {
        let values = vec![
            SampleValue::Absent,
            SampleValue::Scalar(1.5),
            SampleValue::Series(vec![1.0, f64::NAN]),
        ];
        assert_eq!(serde_json::to_string(&values).unwrap(), "[null,1.5,[1.0,null]]");
    }
}
