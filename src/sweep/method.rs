use super::{SampleValue, Value};
use crate::prelude::*;

use std::collections::HashMap;
use std::str::FromStr;

/// number of line samples when `npoints` is not given
pub const DEFAULT_NPOINTS: usize = 100;

/// whether line samples outside the mesh are dropped when `only_inside` is not given
pub const DEFAULT_ONLY_INSIDE: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One parameter of a [`Method`]
pub struct Parameter {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> Parameter {
    Parameter { name, required: true }
}

const fn optional(name: &'static str) -> Parameter {
    Parameter { name, required: false }
}

const PROBE: &[Parameter] = &[required("variable"), required("point")];

const LINE: &[Parameter] = &[
    required("variable"),
    required("line"),
    optional("npoints"),
    optional("only_inside"),
];

const BOUNDARY_LINE: &[Parameter] = &[
    required("variable"),
    required("origin"),
    required("normal"),
    optional("bounds"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// The [`DataSource`] query a sweep evaluates for every combination
pub enum Method {
    Probe,
    Line,
    BoundaryLine,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Line => "line",
            Self::BoundaryLine => "boundary_line",
        }
    }

    /// the parameters of the query in declaration order, not counting the file
    pub fn parameters(&self) -> &'static [Parameter] {
        match self {
            Self::Probe => PROBE,
            Self::Line => LINE,
            Self::BoundaryLine => BOUNDARY_LINE,
        }
    }

    /// run the query on `source` with the given arguments, filling in defaults for
    /// the optional parameters that are missing
    pub(crate) fn invoke<E: Engine>(
        &self,
        source: &DataSource<E>,
        args: &HashMap<&str, &Value>,
    ) -> Result<SampleValue, Error> {
        let get = |name: &str| args.get(name).copied();
        let require = |name: &str| get(name).ok_or_else(|| Error::MissingArgument(name.to_string()));

        let variable = require("variable")?.as_text("variable")?;

        let value = match self {
            Self::Probe => {
                let point = require("point")?.as_point("point")?;
                source.probe(variable, point)?.into()
            }
            Self::Line => {
                let line = require("line")?.as_segment("line")?;
                let npoints = match get("npoints") {
                    Some(value) => value.as_count("npoints")?,
                    None => DEFAULT_NPOINTS,
                };
                let only_inside = match get("only_inside") {
                    Some(value) => value.as_bool("only_inside")?,
                    None => DEFAULT_ONLY_INSIDE,
                };
                source.line(variable, line, npoints, only_inside)?.into()
            }
            Self::BoundaryLine => {
                let origin = require("origin")?.as_point("origin")?;
                let normal = require("normal")?.as_point("normal")?;
                let bounds = match get("bounds") {
                    Some(value) => value.as_bounds("bounds")?,
                    None => None,
                };
                source.boundary_line(variable, origin, normal, bounds.as_ref())?.into()
            }
        };

        Ok(value)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "probe" => Ok(Self::Probe),
            "line" => Ok(Self::Line),
            "boundary_line" => Ok(Self::BoundaryLine),
            other => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[test]
fn names_round_trip() {
    for method in [Method::Probe, Method::Line, Method::BoundaryLine] {
        assert_eq!(method.name().parse::<Method>().unwrap(), method);
        let json = serde_json::to_string(&method).unwrap();
        assert_eq!(json, format!("\"{}\"", method.name()));
    }

    assert!(matches!("slice".parse::<Method>(), Err(Error::UnsupportedMethod(name)) if name == "slice"));
}

#[test]
fn schemas_start_with_the_variable() {
    for method in [Method::Probe, Method::Line, Method::BoundaryLine] {
        assert_eq!(method.parameters()[0], required("variable"));
    }
    let optional: Vec<_> = Method::Line
        .parameters()
        .iter()
        .filter(|p| !p.required)
        .map(|p| p.name)
        .collect();
    assert_eq!(optional, vec!["npoints", "only_inside"]);
}
