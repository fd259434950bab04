//! reading and parsing legacy (`.vtk`) files
//!
//! Both `ASCII` and `BINARY` (big endian) files are understood. The dataset
//! types `STRUCTURED_POINTS`, `RECTILINEAR_GRID`, `STRUCTURED_GRID` and
//! `UNSTRUCTURED_GRID` are normalised into a [`Mesh`]. Both the classic `CELLS`
//! layout and the `OFFSETS` / `CONNECTIVITY` layout of version 5 files are read.
//!
//! most of the time you will not need to interact with this module directly, the
//! [`LegacyEngine`](crate::LegacyEngine) calls [`read_and_parse`] when a data
//! source is opened.

mod cursor;
mod error;

pub use cursor::DataType;
pub use error::ParseError;

use cursor::Cursor;
use error::{InvalidCell, LengthMismatch, OversizedGrid, UnexpectedKeyword};

use crate::mesh::{Cell, CellKind, Mesh};
use crate::prelude::*;
use crate::Encoding;

/// read in and parse an entire legacy vtk file for a given path
pub fn read_and_parse(path: &std::path::Path) -> Result<Mesh, Error> {
    let bytes = std::fs::read(path)?;
    let mesh = parse_legacy(&bytes)?;

    tracing::debug!(
        path = %path.display(),
        points = mesh.num_points(),
        cells = mesh.num_cells(),
        point_arrays = mesh.point_data.len(),
        cell_arrays = mesh.cell_data.len(),
        "parsed legacy vtk file"
    );

    Ok(mesh)
}

/// parse the contents of a legacy vtk file
pub fn parse_legacy(bytes: &[u8]) -> Result<Mesh, ParseError> {
    let mut cursor = Cursor::new(bytes);

    let encoding = read_header(&mut cursor)?;
    let mut mesh = read_geometry(&mut cursor, encoding)?;
    read_attributes(&mut cursor, encoding, &mut mesh)?;

    Ok(mesh)
}

fn read_header(cursor: &mut Cursor) -> Result<Encoding, error::Header> {
    let version = cursor.line();

    if !version.trim_start().to_ascii_lowercase().starts_with("# vtk datafile") {
        return Err(UnexpectedKeyword::expected("# vtk DataFile Version", version.trim()).into());
    }

    // the title line is free text
    let _title = cursor.line();

    let format = cursor.token::<error::Header>("ASCII or BINARY")?;

    match format.to_ascii_uppercase().as_str() {
        "ASCII" => Ok(Encoding::Ascii),
        "BINARY" => Ok(Encoding::Binary),
        _ => Err(UnexpectedKeyword::expected("ASCII or BINARY", format).into()),
    }
}

/// consume any `METADATA` blocks at the cursor. A block runs until the next empty line
fn skip_metadata(cursor: &mut Cursor) {
    while matches!(cursor.peek(), Some(t) if t.eq_ignore_ascii_case("METADATA")) {
        let _ = cursor.token::<error::Attributes>("METADATA");
        let _ = cursor.line();
        while !cursor.line().trim().is_empty() {}
    }
}

/// next keyword (upper-cased), stepping over any `METADATA` blocks
fn next_keyword<E>(cursor: &mut Cursor, expected: &str) -> Result<String, E>
where
    E: From<error::UnexpectedEof>,
{
    skip_metadata(cursor);
    Ok(cursor.token::<E>(expected)?.to_ascii_uppercase())
}

fn read_geometry(cursor: &mut Cursor, encoding: Encoding) -> Result<Mesh, error::Geometry> {
    cursor.keyword::<error::Geometry>("DATASET")?;

    let kind = cursor
        .token::<error::Geometry>("dataset type")?
        .to_ascii_uppercase();

    tracing::trace!(dataset = %kind, ?encoding, "reading geometry");

    // dataset level field data (e.g. TIME) is not attached to points or cells
    if matches!(cursor.peek(), Some(t) if t.eq_ignore_ascii_case("FIELD")) {
        let _ = cursor.token::<error::Geometry>("FIELD")?;
        let _ = read_field::<error::Geometry>(cursor, encoding, None)?;
    }

    match kind.as_str() {
        "STRUCTURED_POINTS" => read_structured_points(cursor),
        "RECTILINEAR_GRID" => read_rectilinear_grid(cursor, encoding),
        "STRUCTURED_GRID" => read_structured_grid(cursor, encoding),
        "UNSTRUCTURED_GRID" => read_unstructured_grid(cursor, encoding),
        other => Err(UnexpectedKeyword::expected(
            "STRUCTURED_POINTS, RECTILINEAR_GRID, STRUCTURED_GRID or UNSTRUCTURED_GRID",
            other,
        )
        .into()),
    }
}

/// grid dimensions whose point coordinates fit in one array
fn read_dimensions(cursor: &mut Cursor) -> Result<[usize; 3], error::Geometry> {
    cursor.keyword::<error::Geometry>("DIMENSIONS")?;
    let dims = [
        cursor.usize::<error::Geometry>("DIMENSIONS")?,
        cursor.usize::<error::Geometry>("DIMENSIONS")?,
        cursor.usize::<error::Geometry>("DIMENSIONS")?,
    ];

    let coordinates = dims
        .iter()
        .try_fold(3usize, |n, d| n.checked_mul(*d))
        .filter(|n| *n <= isize::MAX as usize);

    match coordinates {
        Some(_) => Ok(dims),
        None => Err(OversizedGrid::new(dims[0], dims[1], dims[2]).into()),
    }
}

fn read_structured_points(cursor: &mut Cursor) -> Result<Mesh, error::Geometry> {
    let mut dims = None;
    let mut origin = [0.0; 3];
    let mut spacing = [1.0; 3];

    // DIMENSIONS, ORIGIN and SPACING may come in any order
    while let Some(keyword) = cursor.peek() {
        match keyword.to_ascii_uppercase().as_str() {
            "DIMENSIONS" => dims = Some(read_dimensions(cursor)?),
            "ORIGIN" => {
                let _ = cursor.token::<error::Geometry>("ORIGIN")?;
                origin = cursor.point::<error::Geometry>("ORIGIN")?;
            }
            "SPACING" | "ASPECT_RATIO" => {
                let _ = cursor.token::<error::Geometry>("SPACING")?;
                spacing = cursor.point::<error::Geometry>("SPACING")?;
            }
            _ => break,
        }
    }

    let dims = match dims {
        Some(dims) => dims,
        None => {
            let actual = cursor.peek().map(|t| t.into_owned()).unwrap_or_default();
            return Err(UnexpectedKeyword::expected("DIMENSIONS", actual).into());
        }
    };

    Ok(Mesh::uniform(dims, origin, spacing))
}

fn read_coordinates(
    cursor: &mut Cursor,
    encoding: Encoding,
    keyword: &str,
    expected_len: usize,
) -> Result<Vec<f64>, error::Geometry> {
    let _ = next_keyword::<error::Geometry>(cursor, keyword)?;
    let len = cursor.usize::<error::Geometry>(keyword)?;
    let data_type = DataType::from_name::<error::Geometry>(&cursor.token::<error::Geometry>(keyword)?)?;

    if len != expected_len {
        return Err(LengthMismatch::section(keyword, expected_len, len).into());
    }

    cursor.values(len, data_type, encoding, keyword)
}

fn read_rectilinear_grid(cursor: &mut Cursor, encoding: Encoding) -> Result<Mesh, error::Geometry> {
    let dims = read_dimensions(cursor)?;

    let x = read_coordinates(cursor, encoding, "X_COORDINATES", dims[0])?;
    let y = read_coordinates(cursor, encoding, "Y_COORDINATES", dims[1])?;
    let z = read_coordinates(cursor, encoding, "Z_COORDINATES", dims[2])?;

    Ok(Mesh::rectilinear(&x, &y, &z))
}

fn read_points(cursor: &mut Cursor, encoding: Encoding) -> Result<Array2<f64>, error::Geometry> {
    let keyword = next_keyword::<error::Geometry>(cursor, "POINTS")?;
    if keyword != "POINTS" {
        return Err(UnexpectedKeyword::expected("POINTS", keyword).into());
    }

    let count = cursor.usize::<error::Geometry>("POINTS")?;
    let data_type = DataType::from_name::<error::Geometry>(&cursor.token::<error::Geometry>("POINTS")?)?;
    let expected = cursor.entries::<error::Geometry>(count, 3, "POINTS")?;
    let values = cursor.values::<error::Geometry>(expected, data_type, encoding, "POINTS")?;
    let len = values.len();

    Array2::from_shape_vec((count, 3), values)
        .map_err(|_| LengthMismatch::section("POINTS", expected, len).into())
}

fn read_structured_grid(cursor: &mut Cursor, encoding: Encoding) -> Result<Mesh, error::Geometry> {
    let dims = read_dimensions(cursor)?;
    let points = read_points(cursor, encoding)?;

    let expected: usize = dims.iter().product();
    if points.nrows() != expected {
        return Err(LengthMismatch::section("POINTS", expected, points.nrows()).into());
    }

    Ok(Mesh::structured(dims, points))
}

fn read_unstructured_grid(cursor: &mut Cursor, encoding: Encoding) -> Result<Mesh, error::Geometry> {
    let points = read_points(cursor, encoding)?;

    let keyword = next_keyword::<error::Geometry>(cursor, "CELLS")?;
    if keyword != "CELLS" {
        return Err(UnexpectedKeyword::expected("CELLS", keyword).into());
    }

    let first = cursor.usize::<error::Geometry>("CELLS")?;
    let second = cursor.usize::<error::Geometry>("CELLS")?;

    let connectivity = match cursor.peek() {
        Some(next) if next.eq_ignore_ascii_case("OFFSETS") => {
            read_offset_cells(cursor, encoding, first, second)?
        }
        _ => read_classic_cells(cursor, encoding, first, second)?,
    };

    let keyword = next_keyword::<error::Geometry>(cursor, "CELL_TYPES")?;
    if keyword != "CELL_TYPES" {
        return Err(UnexpectedKeyword::expected("CELL_TYPES", keyword).into());
    }
    let num_types = cursor.usize::<error::Geometry>("CELL_TYPES")?;
    if num_types != connectivity.len() {
        return Err(LengthMismatch::section("CELL_TYPES", connectivity.len(), num_types).into());
    }
    let types = cursor.values::<error::Geometry>(num_types, DataType::Int, encoding, "CELL_TYPES")?;

    let num_points = points.nrows();
    let mut cells = Vec::with_capacity(num_types);

    for (index, (ids, code)) in connectivity.into_iter().zip(types).enumerate() {
        let kind = CellKind::from_code(code as u32);

        if let Some(expected) = kind.num_points() {
            if ids.len() != expected {
                let reason = format!("{:?} needs {expected} points, got {}", kind, ids.len());
                return Err(InvalidCell::new(index, reason).into());
            }
        }

        if let Some(bad) = ids.iter().find(|id| **id >= num_points) {
            let reason = format!("point id {bad} is out of range for {num_points} points");
            return Err(InvalidCell::new(index, reason).into());
        }

        cells.push(Cell::new(kind, ids));
    }

    Ok(Mesh::new(points, cells))
}

/// `CELLS n size` followed by `n` lists of `count id id ...`
fn read_classic_cells(
    cursor: &mut Cursor,
    encoding: Encoding,
    num_cells: usize,
    size: usize,
) -> Result<Vec<Vec<usize>>, error::Geometry> {
    let raw = cursor.values::<error::Geometry>(size, DataType::Int, encoding, "CELLS")?;

    // every cell takes at least its point count
    let mut cells = Vec::with_capacity(num_cells.min(raw.len()));
    let mut idx = 0;

    for cell in 0..num_cells {
        let count = *raw
            .get(idx)
            .ok_or_else(|| LengthMismatch::section("CELLS", size, idx))? as usize;
        let end = (idx + 1)
            .checked_add(count)
            .filter(|end| *end <= raw.len())
            .ok_or_else(|| InvalidCell::new(cell, "connectivity runs past the CELLS section".into()))?;

        cells.push(raw[idx + 1..end].iter().map(|id| *id as usize).collect());
        idx = end;
    }

    if idx != size {
        return Err(LengthMismatch::section("CELLS", size, idx).into());
    }

    Ok(cells)
}

/// `CELLS offsets connectivity` followed by `OFFSETS type` and `CONNECTIVITY type` arrays
fn read_offset_cells(
    cursor: &mut Cursor,
    encoding: Encoding,
    num_offsets: usize,
    num_connectivity: usize,
) -> Result<Vec<Vec<usize>>, error::Geometry> {
    cursor.keyword::<error::Geometry>("OFFSETS")?;
    let data_type = DataType::from_name::<error::Geometry>(&cursor.token::<error::Geometry>("OFFSETS")?)?;
    let offsets = cursor.values::<error::Geometry>(num_offsets, data_type, encoding, "OFFSETS")?;

    let keyword = next_keyword::<error::Geometry>(cursor, "CONNECTIVITY")?;
    if keyword != "CONNECTIVITY" {
        return Err(UnexpectedKeyword::expected("CONNECTIVITY", keyword).into());
    }
    let data_type =
        DataType::from_name::<error::Geometry>(&cursor.token::<error::Geometry>("CONNECTIVITY")?)?;
    let connectivity =
        cursor.values::<error::Geometry>(num_connectivity, data_type, encoding, "CONNECTIVITY")?;

    let mut cells = Vec::with_capacity(num_offsets.saturating_sub(1));

    for (cell, window) in offsets.windows(2).enumerate() {
        let (start, end) = (window[0] as usize, window[1] as usize);
        let ids = connectivity
            .get(start..end)
            .ok_or_else(|| InvalidCell::new(cell, format!("offsets {start}..{end} are invalid")))?;
        cells.push(ids.iter().map(|id| *id as usize).collect());
    }

    Ok(cells)
}

fn read_attributes(
    cursor: &mut Cursor,
    encoding: Encoding,
    mesh: &mut Mesh,
) -> Result<(), error::Attributes> {
    let mut location = None;

    loop {
        skip_metadata(cursor);
        if cursor.is_eof() {
            break;
        }

        let keyword = cursor
            .token::<error::Attributes>("attribute keyword")?
            .to_ascii_uppercase();

        match keyword.as_str() {
            "POINT_DATA" | "CELL_DATA" => {
                let count = cursor.usize::<error::Attributes>(&keyword)?;
                let (loc, expected) = if keyword == "POINT_DATA" {
                    (Location::Point, mesh.num_points())
                } else {
                    (Location::Cell, mesh.num_cells())
                };
                if count != expected {
                    return Err(LengthMismatch::section(keyword.as_str(), expected, count).into());
                }
                location = Some((loc, count));
            }
            // field data of the whole dataset, written after the geometry by some tools
            "FIELD" if location.is_none() => {
                let _ = read_field::<error::Attributes>(cursor, encoding, None)?;
            }
            _ => {
                let (loc, tuples) = match location {
                    Some(location) => location,
                    None => {
                        return Err(UnexpectedKeyword::expected("POINT_DATA or CELL_DATA", keyword.as_str()).into())
                    }
                };

                let arrays = read_attribute(cursor, encoding, &keyword, tuples)?;
                let target = match loc {
                    Location::Point => &mut mesh.point_data,
                    Location::Cell => &mut mesh.cell_data,
                };
                arrays.into_iter().for_each(|array| target.insert(array));
            }
        }
    }

    Ok(())
}

/// read one attribute section. Only `FIELD` can produce more than one array, and
/// `LOOKUP_TABLE` produces none.
fn read_attribute(
    cursor: &mut Cursor,
    encoding: Encoding,
    keyword: &str,
    tuples: usize,
) -> Result<Vec<DataArray>, error::Attributes> {
    let name = |cursor: &mut Cursor| -> Result<String, error::Attributes> {
        Ok(cursor.token::<error::Attributes>("array name")?.into_owned())
    };
    let data_type = |cursor: &mut Cursor| -> Result<DataType, error::Attributes> {
        DataType::from_name(&cursor.token::<error::Attributes>("data type")?)
    };

    let array = match keyword {
        "SCALARS" => {
            let name = name(cursor)?;
            let data_type = data_type(cursor)?;

            // the component count is optional, as is the lookup table line
            let components = match cursor.peek() {
                Some(token) if token.parse::<usize>().is_ok() => {
                    cursor.usize::<error::Attributes>("SCALARS")?
                }
                _ => 1,
            };
            if matches!(cursor.peek(), Some(t) if t.eq_ignore_ascii_case("LOOKUP_TABLE")) {
                let _ = cursor.token::<error::Attributes>("LOOKUP_TABLE")?;
                let _ = cursor.token::<error::Attributes>("lookup table name")?;
            }

            read_array::<error::Attributes>(cursor, encoding, name, data_type, tuples, components)?
        }
        "COLOR_SCALARS" => {
            let name = name(cursor)?;
            let components = cursor.usize::<error::Attributes>("COLOR_SCALARS")?;
            // binary color scalars are bytes scaled to [0, 1]
            match encoding {
                Encoding::Ascii => read_array::<error::Attributes>(cursor, encoding, name, DataType::Float, tuples, components)?,
                Encoding::Binary => {
                    let mut array =
                        read_array::<error::Attributes>(cursor, encoding, name, DataType::UnsignedChar, tuples, components)?;
                    array.values.mapv_inplace(|v| v / 255.0);
                    array
                }
            }
        }
        "LOOKUP_TABLE" => {
            let _ = name(cursor)?;
            let size = cursor.usize::<error::Attributes>("LOOKUP_TABLE")?;
            let data_type = match encoding {
                Encoding::Ascii => DataType::Float,
                Encoding::Binary => DataType::UnsignedChar,
            };
            let entries = cursor.entries::<error::Attributes>(size, 4, "LOOKUP_TABLE")?;
            let _ = cursor.values::<error::Attributes>(entries, data_type, encoding, "LOOKUP_TABLE")?;
            return Ok(Vec::new());
        }
        "VECTORS" | "NORMALS" => {
            let name = name(cursor)?;
            let data_type = data_type(cursor)?;
            read_array::<error::Attributes>(cursor, encoding, name, data_type, tuples, 3)?
        }
        "TENSORS" | "TENSORS6" => {
            let name = name(cursor)?;
            let data_type = data_type(cursor)?;
            let components = if keyword == "TENSORS" { 9 } else { 6 };
            read_array::<error::Attributes>(cursor, encoding, name, data_type, tuples, components)?
        }
        "TEXTURE_COORDINATES" => {
            let name = name(cursor)?;
            let components = cursor.usize::<error::Attributes>("TEXTURE_COORDINATES")?;
            let data_type = data_type(cursor)?;
            read_array::<error::Attributes>(cursor, encoding, name, data_type, tuples, components)?
        }
        "FIELD" => return read_field(cursor, encoding, Some(tuples)),
        other => {
            return Err(UnexpectedKeyword::expected(
                "SCALARS, COLOR_SCALARS, LOOKUP_TABLE, VECTORS, NORMALS, TENSORS, TEXTURE_COORDINATES or FIELD",
                other,
            )
            .into())
        }
    };

    Ok(vec![array])
}

/// the arrays of a `FIELD` section, the `FIELD` keyword already consumed. When
/// `tuples` is given every array must have that many tuples
fn read_field<E>(cursor: &mut Cursor, encoding: Encoding, tuples: Option<usize>) -> Result<Vec<DataArray>, E>
where
    E: From<error::UnexpectedEof>
        + From<error::MalformedNumber>
        + From<error::UnsupportedDataType>
        + From<LengthMismatch>,
{
    // `FIELD` is followed by the field name and the number of arrays
    let _ = cursor.token::<E>("FIELD name")?;
    let num_arrays = cursor.usize::<E>("FIELD")?;
    let mut arrays = Vec::with_capacity(num_arrays.min(cursor.remaining()));

    for _ in 0..num_arrays {
        skip_metadata(cursor);

        let name = cursor.token::<E>("FIELD array name")?.into_owned();
        let components = cursor.usize::<E>(&name)?;
        let num_tuples = cursor.usize::<E>(&name)?;
        let data_type = DataType::from_name::<E>(&cursor.token::<E>(&name)?)?;

        if let Some(expected) = tuples {
            if num_tuples != expected {
                return Err(E::from(LengthMismatch::section(name, expected, num_tuples)));
            }
        }

        arrays.push(read_array::<E>(cursor, encoding, name, data_type, num_tuples, components)?);
    }

    Ok(arrays)
}

fn read_array<E>(
    cursor: &mut Cursor,
    encoding: Encoding,
    name: String,
    data_type: DataType,
    tuples: usize,
    components: usize,
) -> Result<DataArray, E>
where
    E: From<error::UnexpectedEof> + From<error::MalformedNumber> + From<LengthMismatch>,
{
    let expected = cursor.entries::<E>(tuples, components, &name)?;
    let values = cursor.values::<E>(expected, data_type, encoding, &name)?;
    let len = values.len();
    let values = Array2::from_shape_vec((tuples, components), values)
        .map_err(|_| E::from(LengthMismatch::section(name.clone(), expected, len)))?;

    Ok(DataArray::new(name, values))
}
