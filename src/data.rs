use crate::prelude::*;

/// A position or direction as callers pass it in: `[x, y, z]`
pub type Point = [f64; 3];

/// Name of the point array flagging which samples of a probe or line query lie
/// inside the mesh (`1`) and which do not (`0`)
pub const VALID_POINT_MASK: &str = "vtkValidPointMask";

#[derive(Debug, Clone, PartialEq, Constructor)]
/// A named array of tuples. `values` has one row per point (or cell) and one
/// column per component.
pub struct DataArray {
    pub name: String,
    pub values: Array2<f64>,
}

impl DataArray {
    /// build a single component array from a list of values
    pub fn scalars<N: Into<String>>(name: N, values: Vec<f64>) -> Self {
        let values = Array1::from(values).insert_axis(ndarray::Axis(1));
        Self::new(name.into(), values)
    }

    /// build a three component array from a list of vectors
    pub fn vectors<N: Into<String>>(name: N, values: &[Point]) -> Self {
        let mut arr = Array2::zeros((values.len(), 3));
        for (mut row, vector) in arr.rows_mut().into_iter().zip(values) {
            row[0] = vector[0];
            row[1] = vector[1];
            row[2] = vector[2];
        }
        Self::new(name.into(), arr)
    }

    pub fn components(&self) -> usize {
        self.values.ncols()
    }

    pub fn tuples(&self) -> usize {
        self.values.nrows()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
/// Ordered collection of named arrays. Insertion order is preserved, which is the
/// order [`Attributes::names`] reports.
pub struct Attributes(Vec<DataArray>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.0.iter().find(|array| array.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// add an array, replacing a previous array with the same name
    pub fn insert(&mut self, array: DataArray) {
        match self.0.iter_mut().find(|existing| existing.name == array.name) {
            Some(existing) => *existing = array,
            None => self.0.push(array),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|array| array.name.clone()).collect()
    }
}

impl FromIterator<DataArray> for Attributes {
    fn from_iter<T: IntoIterator<Item = DataArray>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        iter.into_iter().for_each(|array| attributes.insert(array));
        attributes
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The materialized output of a [`Query`]: sample positions and the point data
/// the engine produced for them.
pub struct SampledData {
    /// `(n, 3)` sample coordinates
    pub points: Array2<f64>,
    pub point_data: Attributes,
}

impl SampledData {
    pub fn new(points: Array2<f64>, point_data: Attributes) -> Self {
        Self { points, point_data }
    }

    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Where an array lives on the mesh
pub enum Location {
    Point,
    Cell,
}

impl std::str::FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(Self::Point),
            "cell" => Ok(Self::Cell),
            other => Err(Error::invalid("location", format!("`{other}` is not `point` or `cell`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Constructor)]
/// The half of space where `normal . (x - origin) >= 0`
pub struct HalfSpace {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl HalfSpace {
    /// signed distance (scaled by the normal length) of `point` from the bounding plane
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.origin))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[Option<f64>; 6]", into = "[Option<f64>; 6]")]
/// Optional axis aligned bounds. A `None` bound is not applied; `Some(0.0)` is a
/// bound like any other.
pub struct Bounds {
    pub min: [Option<f64>; 3],
    pub max: [Option<f64>; 3],
}

impl Bounds {
    /// bounds from `(min_x, min_y, min_z, max_x, max_y, max_z)`
    pub fn from_array(b: [Option<f64>; 6]) -> Self {
        Self {
            min: [b[0], b[1], b[2]],
            max: [b[3], b[4], b[5]],
        }
    }

    pub fn to_array(&self) -> [Option<f64>; 6] {
        [
            self.min[0],
            self.min[1],
            self.min[2],
            self.max[0],
            self.max[1],
            self.max[2],
        ]
    }

    /// one half space per present bound, minimums first
    pub fn half_spaces(&self) -> Vec<HalfSpace> {
        let mut out = Vec::with_capacity(6);

        for axis in 0..3 {
            if let Some(min) = self.min[axis] {
                let mut origin = Point3::origin();
                let mut normal = Vector3::zeros();
                origin[axis] = min;
                normal[axis] = 1.0;
                out.push(HalfSpace::new(origin, normal));
            }
        }

        for axis in 0..3 {
            if let Some(max) = self.max[axis] {
                let mut origin = Point3::origin();
                let mut normal = Vector3::zeros();
                origin[axis] = max;
                normal[axis] = -1.0;
                out.push(HalfSpace::new(origin, normal));
            }
        }

        out
    }
}

impl From<[Option<f64>; 6]> for Bounds {
    fn from(b: [Option<f64>; 6]) -> Self {
        Self::from_array(b)
    }
}

impl From<Bounds> for [Option<f64>; 6] {
    fn from(b: Bounds) -> Self {
        b.to_array()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .to_array()
            .iter()
            .map(|b| match b {
                Some(value) => value.to_string(),
                None => "None".to_string(),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A geometric query pipeline, built by a [`DataSource`](crate::DataSource) and
/// executed by an [`Engine`](crate::Engine).
pub enum Query {
    /// zero radius point source at `center`
    Probe { center: Point3<f64> },
    /// `resolution + 1` uniformly spaced samples from `start` to `end`
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
        resolution: usize,
    },
    /// intersection of the mesh boundary surface with the plane through
    /// `origin` with `normal`, clipped by every half space in `clips`
    BoundaryCurve {
        origin: Point3<f64>,
        normal: Vector3<f64>,
        clips: Vec<HalfSpace>,
    },
}
