use super::{FlatResult, SampleValue};
use crate::prelude::*;

use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Sweep results nested by the labels of their keys
///
/// The first label of a key selects an entry of the outermost level, the second
/// one an entry of the level below, and so on; the last label holds the value.
/// A sweep without free axes has the single key `()` and becomes a bare leaf.
pub enum Hierarchy {
    Leaf(SampleValue),
    Node(BTreeMap<String, Hierarchy>),
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::Node(BTreeMap::new())
    }
}

impl Hierarchy {
    /// nest a flat result. A key that is also the prefix of another key leaves
    /// only one of the two in the result
    pub fn from_flat(flat: &FlatResult) -> Self {
        let mut root = Self::default();

        for (key, value) in flat {
            root.insert(key.as_slice(), value.clone());
        }

        root
    }

    /// put `value` at `path`, creating the levels on the way
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], value: SampleValue) {
        let mut node = self;

        for label in path {
            // a leaf on the way is replaced by a level
            if let Self::Leaf(_) = node {
                *node = Self::default();
            }
            let Self::Node(children) = node else {
                return;
            };
            node = children.entry(label.as_ref().to_string()).or_default();
        }

        *node = Self::Leaf(value);
    }

    /// the value at `path`, if there is a leaf there
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&SampleValue> {
        let mut node = self;

        for label in path {
            node = match node {
                Self::Node(children) => children.get(label.as_ref())?,
                Self::Leaf(_) => return None,
            };
        }

        match node {
            Self::Leaf(value) => Some(value),
            Self::Node(_) => None,
        }
    }

    /// the flat result this hierarchy nests
    pub fn flatten(&self) -> FlatResult {
        let mut out = FlatResult::new();
        let mut stack: Vec<(Vec<String>, &Hierarchy)> = vec![(Vec::new(), self)];

        while let Some((path, node)) = stack.pop() {
            match node {
                Self::Leaf(value) => {
                    out.insert(path, value.clone());
                }
                Self::Node(children) => {
                    for (label, child) in children {
                        let mut path = path.clone();
                        path.push(label.clone());
                        stack.push((path, child));
                    }
                }
            }
        }

        out
    }

    /// write as JSON indented by four spaces
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), Error> {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut serializer)?;
        Ok(())
    }

    /// write as JSON to the file at `path`, replacing it if it exists
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut writer = std::io::BufWriter::new(std::fs::File::create(path.as_ref())?);
        self.write_json(&mut writer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!(path = %path.as_ref().display(), "saved sweep results");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn nests_by_label() {
        let mut flat = FlatResult::new();
        flat.insert(key(&["a.vtk", "p"]), SampleValue::Scalar(1.0));
        flat.insert(key(&["a.vtk", "u"]), SampleValue::Absent);
        flat.insert(key(&["b.vtk", "p"]), SampleValue::Series(vec![1.0, 2.0]));

        let tree = Hierarchy::from_flat(&flat);

        assert_eq!(tree.get(&["a.vtk", "p"]), Some(&SampleValue::Scalar(1.0)));
        assert_eq!(tree.get(&["a.vtk", "u"]), Some(&SampleValue::Absent));
        assert_eq!(tree.get(&["a.vtk"]), None);
        assert_eq!(tree.flatten(), flat);

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"a.vtk": {"p": 1.0, "u": null}, "b.vtk": {"p": [1.0, 2.0]}})
        );
    }

    #[test]
    fn empty_key_is_a_bare_leaf() {
        let mut flat = FlatResult::new();
        flat.insert(Vec::new(), SampleValue::Scalar(15.0));

        let tree = Hierarchy::from_flat(&flat);
        assert_eq!(tree, Hierarchy::Leaf(SampleValue::Scalar(15.0)));
        assert_eq!(tree.flatten(), flat);
    }

    #[test]
    fn four_space_indent() {
        let mut tree = Hierarchy::default();
        tree.insert(&["p"], SampleValue::Scalar(20.0));

        let mut bytes = Vec::new();
        tree.write_json(&mut bytes).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n    \"p\": 20.0\n}");
    }

    #[test]
    fn json_reads_back() {
        let text = r#"{"L1": {"p": [10.0, 20.0]}, "L2": {"p": null}}"#;
        let tree: Hierarchy = serde_json::from_str(text).unwrap();

        assert_eq!(tree.get(&["L1", "p"]), Some(&SampleValue::Series(vec![10.0, 20.0])));
        assert_eq!(tree.get(&["L2", "p"]), Some(&SampleValue::Absent));
    }
}
