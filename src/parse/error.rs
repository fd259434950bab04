use crate::prelude::*;

#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("Error parsing legacy vtk file header: {0}")]
    Header(Header),
    #[error("Error parsing legacy vtk dataset geometry: {0}")]
    Geometry(Geometry),
    #[error("Error parsing legacy vtk POINT_DATA / CELL_DATA: {0}")]
    Attributes(Attributes),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Header {
    #[error("{0}")]
    UnexpectedEof(UnexpectedEof),
    #[error("{0}")]
    UnexpectedKeyword(UnexpectedKeyword),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Geometry {
    #[error("{0}")]
    UnexpectedEof(UnexpectedEof),
    #[error("{0}")]
    UnexpectedKeyword(UnexpectedKeyword),
    #[error("{0}")]
    MalformedNumber(MalformedNumber),
    #[error("{0}")]
    UnsupportedDataType(UnsupportedDataType),
    #[error("{0}")]
    InvalidCell(InvalidCell),
    #[error("{0}")]
    LengthMismatch(LengthMismatch),
    #[error("{0}")]
    OversizedGrid(OversizedGrid),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Attributes {
    #[error("{0}")]
    UnexpectedEof(UnexpectedEof),
    #[error("{0}")]
    UnexpectedKeyword(UnexpectedKeyword),
    #[error("{0}")]
    MalformedNumber(MalformedNumber),
    #[error("{0}")]
    UnsupportedDataType(UnsupportedDataType),
    #[error("{0}")]
    LengthMismatch(LengthMismatch),
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "unexpected end of file, expected {expected}")]
pub struct UnexpectedEof {
    expected: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "unexpected keyword. Expected `{expected}`, got `{actual}`")]
pub struct UnexpectedKeyword {
    expected: String,
    actual: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "`{token}` could not be parsed as a number")]
pub struct MalformedNumber {
    token: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "data type `{name}` is not supported")]
pub struct UnsupportedDataType {
    name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "cell {cell} is invalid: {reason}")]
pub struct InvalidCell {
    cell: usize,
    reason: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "DIMENSIONS {nx} {ny} {nz} describe more points than can be stored")]
pub struct OversizedGrid {
    nx: usize,
    ny: usize,
    nz: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{section} holds {actual} entries, expected {expected}")]
pub struct LengthMismatch {
    section: String,
    expected: usize,
    actual: usize,
}

impl UnexpectedKeyword {
    pub(crate) fn expected<E: Into<String>, A: Into<String>>(expected: E, actual: A) -> Self {
        Self::new(expected.into(), actual.into())
    }
}

impl LengthMismatch {
    pub(crate) fn section<S: Into<String>>(section: S, expected: usize, actual: usize) -> Self {
        Self::new(section.into(), expected, actual)
    }
}
