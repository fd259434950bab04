use crate::prelude::*;
use crate::data::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// A parameter value of a sweep
///
/// In JSON, `null`, booleans, numbers and strings map onto the variants of the
/// same name. An array of three numbers is a point, an array of two points a
/// segment, and an array of six numbers or `null`s a bounding box.
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Point(Point),
    Segment([Point; 2]),
    Bounds(Bounds),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "nothing",
            Self::Bool(_) => "a boolean",
            Self::Number(_) => "a number",
            Self::Text(_) => "a string",
            Self::Point(_) => "a point",
            Self::Segment(_) => "a pair of points",
            Self::Bounds(_) => "bounds",
        }
    }

    fn mismatch(&self, name: &str, expected: &str) -> Error {
        Error::invalid(name, format!("expected {expected}, got {}", self.kind()))
    }

    pub(crate) fn as_text(&self, name: &str) -> Result<&str, Error> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(other.mismatch(name, "a string")),
        }
    }

    pub(crate) fn as_bool(&self, name: &str) -> Result<bool, Error> {
        match self {
            Self::Bool(flag) => Ok(*flag),
            other => Err(other.mismatch(name, "a boolean")),
        }
    }

    /// a non negative whole number
    pub(crate) fn as_count(&self, name: &str) -> Result<usize, Error> {
        match self {
            Self::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= usize::MAX as f64 => Ok(*n as usize),
            other => Err(other.mismatch(name, "a non negative whole number")),
        }
    }

    pub(crate) fn as_point(&self, name: &str) -> Result<Point, Error> {
        match self {
            Self::Point(point) => Ok(*point),
            other => Err(other.mismatch(name, "a point")),
        }
    }

    pub(crate) fn as_segment(&self, name: &str) -> Result<[Point; 2], Error> {
        match self {
            Self::Segment(segment) => Ok(*segment),
            other => Err(other.mismatch(name, "a pair of points")),
        }
    }

    /// `null` means no bounds
    pub(crate) fn as_bounds(&self, name: &str) -> Result<Option<Bounds>, Error> {
        match self {
            Self::Null => Ok(None),
            Self::Bounds(bounds) => Ok(Some(*bounds)),
            other => Err(other.mismatch(name, "bounds")),
        }
    }
}

fn fmt_point(p: &Point) -> String {
    format!("({}, {}, {})", p[0], p[1], p[2])
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "None"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Point(p) => write!(f, "{}", fmt_point(p)),
            Self::Segment([a, b]) => write!(f, "({}, {})", fmt_point(a), fmt_point(b)),
            Self::Bounds(bounds) => write!(f, "{bounds}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&std::path::Path> for Value {
    fn from(path: &std::path::Path) -> Self {
        Self::Text(path.to_string_lossy().into_owned())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<Point> for Value {
    fn from(point: Point) -> Self {
        Self::Point(point)
    }
}

impl From<[Point; 2]> for Value {
    fn from(segment: [Point; 2]) -> Self {
        Self::Segment(segment)
    }
}

impl From<Bounds> for Value {
    fn from(bounds: Bounds) -> Self {
        Self::Bounds(bounds)
    }
}

impl From<Option<Bounds>> for Value {
    fn from(bounds: Option<Bounds>) -> Self {
        bounds.map(Self::Bounds).unwrap_or(Self::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// One dimension of a sweep: the values a parameter takes, each with the label
/// that stands for it in result keys
pub struct Axis(Vec<(Value, String)>);

impl Axis {
    /// an axis of one value, labelled with its [`Display`](fmt::Display) form
    pub fn single<V: Into<Value>>(value: V) -> Self {
        let value = value.into();
        let label = value.to_string();
        Self(vec![(value, label)])
    }

    /// an axis of explicitly labelled values
    ///
    /// ```
    /// use vtk_probe::Axis;
    ///
    /// let variables = Axis::labelled([("PPressure", "p"), ("PVelocity Z", "uz")]);
    /// assert_eq!(variables.len(), 2);
    /// assert_eq!(variables.labels().collect::<Vec<_>>(), vec!["p", "uz"]);
    /// ```
    pub fn labelled<I, V, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<Value>,
        L: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// an axis is part of the result keys exactly when it has more than one value
    pub fn is_free(&self) -> bool {
        self.len() > 1
    }

    pub fn entries(&self) -> &[(Value, String)] {
        &self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, label)| label.as_str())
    }
}
