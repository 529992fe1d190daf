use std::{io::Write, path::Path};

use crate::{
    fe::{ElementKind, Model},
    mesh::swap_quad_ordering,
};

use super::vtk::{create_file, write_header, write_points, write_quad_cells};

const STRAIN_NAMES: [&str; 8] = ["ex", "ey", "gxy", "kx", "ky", "kxy", "gyz", "gxz"];

/// Selects the fields written next to the nodes of a model
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportFlags {
    /// Nodal translations as point vectors
    pub displacements: bool,
    /// Nodal rotations as point vectors
    pub rotations: bool,
    /// Centroid strains as cell scalars
    pub strains: bool,
    /// Failure index as a cell scalar
    pub failure: bool,
    /// Element thickness as a cell scalar
    pub thickness: bool,
}

impl Default for ExportFlags {
    fn default() -> Self {
        Self {
            displacements: true,
            rotations: false,
            strains: true,
            failure: false,
            thickness: false,
        }
    }
}

impl ExportFlags {
    pub fn with_displacements(mut self, displacements: bool) -> Self {
        self.displacements = displacements;
        self
    }

    pub fn with_rotations(mut self, rotations: bool) -> Self {
        self.rotations = rotations;
        self
    }

    pub fn with_strains(mut self, strains: bool) -> Self {
        self.strains = strains;
        self
    }

    pub fn with_failure(mut self, failure: bool) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_thickness(mut self, thickness: bool) -> Self {
        self.thickness = thickness;
        self
    }

    fn has_point_data(&self) -> bool {
        self.displacements || self.rotations
    }

    fn has_cell_data(&self) -> bool {
        self.strains || self.failure || self.thickness
    }
}

/// Writes a finite-element model of shell elements as a VTK unstructured grid
///
/// Element connectivity is stored in tensor product order and converted back to
/// counter-clockwise order for the quad cells.
#[derive(Debug, Clone)]
pub struct ModelExporter<'a> {
    model: &'a Model,
    flags: ExportFlags,
}

impl<'a> ModelExporter<'a> {
    pub fn new(model: &'a Model, flags: ExportFlags) -> Self {
        Self { model, flags }
    }

    pub fn flags(&self) -> &ExportFlags {
        &self.flags
    }

    fn quads(&self) -> anyhow::Result<Vec<[usize; 4]>> {
        let mut quads = (0..self.model.num_elements())
            .map(|e| {
                let element = self.model.element(e)?;
                anyhow::ensure!(
                    element.kind() == ElementKind::Shell,
                    "Element {} cannot be exported as a quad",
                    e
                );
                let nodes = self.model.element_nodes(e)?;
                let quad: [usize; 4] = nodes.try_into().map_err(|_| {
                    anyhow::anyhow!("Element {} has {} nodes, expected 4", e, nodes.len())
                })?;
                Ok(quad)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        swap_quad_ordering(&mut quads);
        Ok(quads)
    }

    fn write_nodal_vectors<W: Write>(
        &self,
        writer: &mut W,
        name: &str,
        offset: usize,
    ) -> anyhow::Result<()> {
        let vpn = self.model.vars_per_node();
        anyhow::ensure!(
            vpn >= offset + 3,
            "{} needs {} variables per node, the model has {}",
            name,
            offset + 3,
            vpn
        );
        writeln!(writer, "VECTORS {} double", name)?;
        for node in self.model.variables().chunks(vpn) {
            writeln!(writer, "{} {} {}", node[offset], node[offset + 1], node[offset + 2])?;
        }
        Ok(())
    }

    fn write_cell_scalars<W: Write>(
        &self,
        writer: &mut W,
        name: &str,
        values: &[f64],
    ) -> anyhow::Result<()> {
        writeln!(writer, "SCALARS {} double 1", name)?;
        writeln!(writer, "LOOKUP_TABLE default")?;
        for v in values {
            writeln!(writer, "{}", v)?;
        }
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let quads = self.quads()?;
        let num_elements = quads.len();

        write_header(writer, "wingshell model", "UNSTRUCTURED_GRID")?;
        write_points(writer, self.model.nodes())?;
        write_quad_cells(writer, &quads)?;

        if self.flags.has_point_data() {
            writeln!(writer, "POINT_DATA {}", self.model.num_nodes())?;
            if self.flags.displacements {
                self.write_nodal_vectors(writer, "displacements", 0)?;
            }
            if self.flags.rotations {
                self.write_nodal_vectors(writer, "rotations", 3)?;
            }
        }

        if self.flags.has_cell_data() {
            writeln!(writer, "CELL_DATA {}", num_elements)?;
            if self.flags.strains {
                let strains = (0..num_elements)
                    .map(|e| self.model.element_strain(e))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                for (i, name) in STRAIN_NAMES.iter().enumerate() {
                    let values = strains.iter().map(|s| s[i]).collect::<Vec<_>>();
                    self.write_cell_scalars(writer, name, &values)?;
                }
            }
            if self.flags.failure {
                let values = (0..num_elements)
                    .map(|e| self.model.element_failure(e))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                self.write_cell_scalars(writer, "failure", &values)?;
            }
            if self.flags.thickness {
                let values = (0..num_elements)
                    .map(|e| self.model.element(e).map(|el| el.thickness()))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                self.write_cell_scalars(writer, "thickness", &values)?;
            }
        }

        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut writer = create_file(path)?;
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!(
            "wrote {} nodes and {} elements to {}",
            self.model.num_nodes(),
            self.model.num_elements(),
            path.display()
        );
        Ok(())
    }
}
