use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use nalgebra::Point3;

use crate::{mesh::QuadMesh, surface::NurbsSurface3D};

/// VTK cell type of a four node quadrilateral
pub const VTK_QUAD: u8 = 9;

pub(crate) fn write_header<W: Write>(writer: &mut W, title: &str, dataset: &str) -> anyhow::Result<()> {
    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "{}", title)?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET {}", dataset)?;
    Ok(())
}

pub(crate) fn write_points<W: Write>(writer: &mut W, points: &[Point3<f64>]) -> anyhow::Result<()> {
    writeln!(writer, "POINTS {} double", points.len())?;
    for p in points {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    Ok(())
}

/// Write counter-clockwise quads as `CELLS` and `CELL_TYPES`
pub(crate) fn write_quad_cells<W: Write>(writer: &mut W, quads: &[[usize; 4]]) -> anyhow::Result<()> {
    writeln!(writer, "CELLS {} {}", quads.len(), 5 * quads.len())?;
    for q in quads {
        writeln!(writer, "4 {} {} {} {}", q[0], q[1], q[2], q[3])?;
    }
    writeln!(writer, "CELL_TYPES {}", quads.len())?;
    for _ in quads {
        writeln!(writer, "{}", VTK_QUAD)?;
    }
    Ok(())
}

/// Create the parent directories of `path` and open it for buffered writing
pub(crate) fn create_file(path: &Path) -> anyhow::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", path.display(), e))?;
    Ok(BufWriter::new(file))
}

/// Write a surface sampled on a `(divs_u + 1) x (divs_v + 1)` grid as a structured grid
/// # Example
/// ```
/// use wingshell::prelude::*;
/// use nalgebra::Point4;
///
/// let plane = NurbsSurface3D::try_new(
///     1,
///     1,
///     vec![0., 0., 1., 1.],
///     vec![0., 0., 1., 1.],
///     vec![
///         vec![Point4::new(0., 0., 0., 1.), Point4::new(0., 1., 0., 1.)],
///         vec![Point4::new(1., 0., 0., 1.), Point4::new(1., 1., 0., 1.)],
///     ],
/// ).unwrap();
/// let mut buffer = vec![];
/// write_surface_vtk(&plane, 4, 2, &mut buffer).unwrap();
/// let text = String::from_utf8(buffer).unwrap();
/// assert!(text.contains("DIMENSIONS 5 3 1"));
/// assert!(text.contains("POINTS 15 double"));
/// ```
pub fn write_surface_vtk<W: Write>(
    surface: &NurbsSurface3D<f64>,
    divs_u: usize,
    divs_v: usize,
    writer: &mut W,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        divs_u > 0 && divs_v > 0,
        "Surface sampling needs at least one division in each direction"
    );
    let grid = surface.regular_sample_points(divs_u, divs_v);

    write_header(writer, "wingshell surface", "STRUCTURED_GRID")?;
    writeln!(writer, "DIMENSIONS {} {} 1", divs_u + 1, divs_v + 1)?;

    // u runs fastest
    let points = (0..=divs_v)
        .flat_map(|j| grid.iter().map(move |row| row[j]))
        .collect::<Vec<_>>();
    write_points(writer, &points)?;
    Ok(())
}

/// Write a quadrilateral mesh as an unstructured grid, with the face of every quad as cell data
pub fn write_quad_mesh_vtk<W: Write>(mesh: &QuadMesh, writer: &mut W) -> anyhow::Result<()> {
    write_header(writer, "wingshell quad mesh", "UNSTRUCTURED_GRID")?;
    write_points(writer, mesh.points())?;
    write_quad_cells(writer, mesh.quads())?;

    writeln!(writer, "CELL_DATA {}", mesh.num_quads())?;
    writeln!(writer, "SCALARS face int 1")?;
    writeln!(writer, "LOOKUP_TABLE default")?;
    for i in 0..mesh.num_quads() {
        writeln!(writer, "{}", mesh.face_of(i).map(|f| f.0).unwrap_or(0))?;
    }
    Ok(())
}

/// Write a surface to a VTK file
pub fn write_surface_vtk_file<P: AsRef<Path>>(
    surface: &NurbsSurface3D<f64>,
    divs_u: usize,
    divs_v: usize,
    path: P,
) -> anyhow::Result<()> {
    let mut writer = create_file(path.as_ref())?;
    write_surface_vtk(surface, divs_u, divs_v, &mut writer)?;
    writer.flush()?;
    Ok(())
}
