use ndarray::Array2;
use vtk_probe::{DataArray, DataSource, Encoding, LegacyEngine, Mesh};

/// a sheared, stretched 4 x 3 x 3 structured grid with p = x + 2 y + 3 z
fn create_mesh() -> Mesh {
    let dims = [4, 3, 3];
    let mut points = Array2::zeros((dims[0] * dims[1] * dims[2], 3));

    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                let id = i + dims[0] * (j + dims[1] * k);
                points[[id, 0]] = 0.5 * i as f64 + 0.1 * k as f64;
                points[[id, 1]] = j as f64;
                points[[id, 2]] = 0.25 * k as f64;
            }
        }
    }

    let mut mesh = Mesh::structured(dims, points);

    let p = mesh
        .points
        .rows()
        .into_iter()
        .map(|r| r[0] + 2.0 * r[1] + 3.0 * r[2])
        .collect();
    mesh.point_data.insert(DataArray::scalars("p", p));

    let cells = (0..mesh.num_cells()).map(|c| c as f64).collect();
    mesh.cell_data.insert(DataArray::scalars("cell", cells));

    mesh
}

fn write_then_probe(encoding: Encoding) {
    let mesh = create_mesh();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheared.vtk");
    let file = std::fs::File::create(&path).unwrap();
    vtk_probe::write_vtk(file, &mesh, encoding).unwrap();

    let back = vtk_probe::read_vtk(&path).unwrap();
    assert_eq!(back, mesh);

    let engine = LegacyEngine::new();
    let source = DataSource::open(&engine, &path).unwrap();

    // trilinear interpolation is exact for a linear field
    let point = [0.9, 1.3, 0.3];
    let p = source.probe("p", point).unwrap().unwrap();
    assert!((p - (0.9 + 2.6 + 0.9)).abs() < 1e-9);

    let cell = source.probe("cell", point).unwrap().unwrap();
    assert_eq!(cell.fract(), 0.0);

    let values = source
        .line("p", [[0.1, 0.0, 0.0], [1.5, 2.0, 0.5]], 11, true)
        .unwrap()
        .unwrap();
    assert!(!values.is_empty());
}

#[test]
fn ascii_write_then_probe() {
    write_then_probe(Encoding::Ascii);
}

#[test]
fn binary_write_then_probe() {
    write_then_probe(Encoding::Binary);
}

#[test]
fn uppercase_extension_is_accepted() {
    let mesh = Mesh::uniform([2, 2, 2], [0.0; 3], [1.0; 3]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("CUBE.VTK");
    vtk_probe::write_vtk(std::fs::File::create(&path).unwrap(), &mesh, Encoding::Ascii).unwrap();

    let engine = LegacyEngine::new();
    let source = DataSource::open(&engine, &path).unwrap();
    assert_eq!(source.probe("Z", [0.5, 0.5, 0.25]).unwrap(), Some(0.25));
}
