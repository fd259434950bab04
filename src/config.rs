//! # Sweep configuration files
//!
//! A sweep can be described declaratively in JSON and run with
//! [`SweepConfig::run`]:
//!
//! ```json
//! {
//!     "method": "line",
//!     "axes": {
//!         "filename": "Cell1Structured.vtk",
//!         "variable": [
//!             { "value": "PPressure", "label": "p" },
//!             { "value": "PVelocity Z", "label": "uz" }
//!         ],
//!         "line": [[0, 0.5, 0.5], [2, 0.5, 0.5]],
//!         "npoints": 3
//!     },
//!     "output": "results.json"
//! }
//! ```
//!
//! Each axis is either a bare value (one value, labelled by itself) or a list of
//! `value` / `label` objects. Relative file names, including `output`, are taken
//! relative to the directory of the configuration file.

use crate::prelude::*;
use crate::sweep::{Hierarchy, FILENAME};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledValue {
    pub value: Value,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// The JSON form of an [`Axis`]
pub enum AxisSpec {
    Labelled(Vec<LabelledValue>),
    Single(Value),
}

impl From<&AxisSpec> for Axis {
    fn from(spec: &AxisSpec) -> Self {
        match spec {
            AxisSpec::Labelled(entries) => Axis::labelled(
                entries
                    .iter()
                    .map(|entry| (entry.value.clone(), entry.label.clone())),
            ),
            AxisSpec::Single(value) => Axis::single(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub method: Method,
    pub axes: BTreeMap<String, AxisSpec>,
    /// where to save the nested results, if anywhere
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// directory relative paths are resolved against
    #[serde(skip)]
    base: Option<PathBuf>,
}

impl SweepConfig {
    /// read a configuration from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);

        let mut config: Self = serde_json::from_reader(reader)?;
        config.base = path.parent().map(Path::to_path_buf);

        tracing::debug!(path = %path.display(), method = %config.method, "loaded sweep configuration");

        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// the sweep this configuration describes
    pub fn to_sweep(&self) -> Sweep {
        self.axes.iter().fold(Sweep::new(self.method), |sweep, (name, spec)| {
            let mut axis = Axis::from(spec);

            if name == FILENAME {
                axis = Axis::labelled(axis.entries().iter().map(|(value, label)| {
                    let value = match value {
                        Value::Text(file) => Value::from(self.resolve(Path::new(file)).as_path()),
                        other => other.clone(),
                    };
                    (value, label.clone())
                }));
            }

            sweep.axis(name.clone(), axis)
        })
    }

    /// run the sweep, saving the results when an output file is configured
    pub fn run<E: Engine>(&self, engine: &E) -> Result<Hierarchy, Error> {
        let sweep = self.to_sweep();

        match &self.output {
            Some(output) => sweep.to_json(self.resolve(output), engine),
            None => sweep.hierarchy(engine),
        }
    }
}
