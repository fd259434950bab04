use crate::prelude::*;
use crate::{Encoding, Mesh};

use std::io::Write;

/// Write a mesh and all of its arrays to a `Writer` as a legacy
/// `UNSTRUCTURED_GRID` file
///
/// Every dataset type read by [`read_vtk`](crate::read_vtk) is written back as an
/// unstructured grid. Single component arrays become `SCALARS`, three component
/// arrays `VECTORS`, and everything else is collected into one `FIELD` section.
///
/// ## Example
///
/// ```
/// use vtk_probe::{DataArray, Encoding, Mesh};
///
/// let mut mesh = Mesh::uniform([2, 2, 2], [0.0; 3], [1.0; 3]);
/// mesh.point_data.insert(DataArray::scalars("p", (0..8).map(f64::from).collect()));
///
/// let mut bytes = Vec::new();
/// vtk_probe::write_vtk(&mut bytes, &mesh, Encoding::Binary).unwrap();
///
/// let back = vtk_probe::parse::parse_legacy(&bytes).unwrap();
/// assert_eq!(back, mesh);
/// ```
pub fn write_vtk<W: Write>(writer: W, mesh: &Mesh, encoding: Encoding) -> Result<(), Error> {
    let mut writer = std::io::BufWriter::new(writer);

    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "vtk-probe output")?;
    match encoding {
        Encoding::Ascii => writeln!(writer, "ASCII")?,
        Encoding::Binary => writeln!(writer, "BINARY")?,
    }
    writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;

    writeln!(writer, "POINTS {} double", mesh.num_points())?;
    write_floats(&mut writer, &mesh.points, encoding)?;

    let size: usize = mesh.cells.iter().map(|cell| cell.points.len() + 1).sum();
    writeln!(writer, "CELLS {} {}", mesh.num_cells(), size)?;
    let connectivity = mesh.cells.iter().map(|cell| {
        std::iter::once(cell.points.len())
            .chain(cell.points.iter().copied())
            .map(|id| id as i32)
            .collect::<Vec<_>>()
    });
    write_ints(&mut writer, connectivity, encoding)?;

    writeln!(writer, "CELL_TYPES {}", mesh.num_cells())?;
    let types = mesh.cells.iter().map(|cell| vec![cell.kind.code() as i32]);
    write_ints(&mut writer, types, encoding)?;

    if !mesh.point_data.is_empty() {
        writeln!(writer, "POINT_DATA {}", mesh.num_points())?;
        write_attributes(&mut writer, &mesh.point_data, encoding)?;
    }

    if !mesh.cell_data.is_empty() && mesh.num_cells() > 0 {
        writeln!(writer, "CELL_DATA {}", mesh.num_cells())?;
        write_attributes(&mut writer, &mesh.cell_data, encoding)?;
    }

    writer.flush()?;

    Ok(())
}

fn write_attributes<W: Write>(writer: &mut W, attributes: &Attributes, encoding: Encoding) -> Result<(), Error> {
    let mut field = Vec::new();

    for array in attributes.iter() {
        match array.components() {
            1 => {
                writeln!(writer, "SCALARS {} double 1", array.name)?;
                writeln!(writer, "LOOKUP_TABLE default")?;
            }
            3 => writeln!(writer, "VECTORS {} double", array.name)?,
            _ => {
                field.push(array);
                continue;
            }
        }
        write_floats(writer, &array.values, encoding)?;
    }

    if !field.is_empty() {
        writeln!(writer, "FIELD FieldData {}", field.len())?;
        for array in field {
            writeln!(
                writer,
                "{} {} {} double",
                array.name,
                array.components(),
                array.tuples()
            )?;
            write_floats(writer, &array.values, encoding)?;
        }
    }

    Ok(())
}

/// one row per line in ascii, big endian doubles followed by a line break in binary
fn write_floats<W: Write>(writer: &mut W, values: &Array2<f64>, encoding: Encoding) -> Result<(), Error> {
    match encoding {
        Encoding::Ascii => {
            for row in values.rows() {
                let line: Vec<String> = row
                    .iter()
                    .map(|x| {
                        let mut buffer = ryu::Buffer::new();
                        buffer.format(*x).to_string()
                    })
                    .collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }
        Encoding::Binary => {
            let mut bytes = Vec::with_capacity(values.len() * 8);
            values
                .iter()
                .for_each(|float| bytes.extend_from_slice(&float.to_be_bytes()));
            writer.write_all(&bytes)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}

fn write_ints<W, I>(writer: &mut W, rows: I, encoding: Encoding) -> Result<(), Error>
where
    W: Write,
    I: Iterator<Item = Vec<i32>>,
{
    match encoding {
        Encoding::Ascii => {
            for row in rows {
                let line: Vec<String> = row.iter().map(|id| id.to_string()).collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
        }
        Encoding::Binary => {
            let bytes: Vec<u8> = rows.flatten().flat_map(i32::to_be_bytes).collect();
            writer.write_all(&bytes)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}
