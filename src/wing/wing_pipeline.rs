use std::sync::Arc;

use log::info;
use nalgebra::Point2;

use crate::{
    curve::{NurbsCurve2D, NurbsCurve3D},
    fe::{Creator, Element, IsoFsdtStiffness, Model, ShellElement},
    interpolation::CurveInterpolation,
    io::{write_surface_vtk_file, ModelExporter},
    loft::CurveLofter,
    mesh::{Mesher, QuadMesh},
    surface::NurbsSurface3D,
    topology::{EdgeCurve, Geometry, GeometryBuilder, Orientation, Vertex},
};

use super::{Airfoil, WingOptions};

/// Everything produced by a run of the pipeline
#[derive(Debug, Clone)]
pub struct WingArtifacts {
    pub surface: NurbsSurface3D<f64>,
    pub geometry: Geometry,
    pub mesh: QuadMesh,
    pub model: Model,
}

/// Builds a shell model of a wing skin cutout from airfoil sections
/// # Example
/// ```no_run
/// use wingshell::prelude::*;
///
/// let pipeline = WingPipeline::new(WingOptions::default());
/// let artifacts = pipeline.run().unwrap();
/// pipeline.write_outputs(&artifacts).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct WingPipeline {
    options: WingOptions,
    airfoil: Airfoil,
}

impl WingPipeline {
    pub fn new(options: WingOptions) -> Self {
        Self {
            options,
            airfoil: Airfoil::rae2822(),
        }
    }

    /// Use another profile than RAE 2822
    pub fn with_airfoil(mut self, airfoil: Airfoil) -> Self {
        self.airfoil = airfoil;
        self
    }

    pub fn options(&self) -> &WingOptions {
        &self.options
    }

    /// Fit one curve through the scaled profile at every station
    pub fn try_sections(&self) -> anyhow::Result<Vec<NurbsCurve3D<f64>>> {
        let WingOptions {
            scales, stations, ..
        } = &self.options;
        anyhow::ensure!(
            scales.len() == stations.len(),
            "{} scales given for {} stations",
            scales.len(),
            stations.len()
        );
        anyhow::ensure!(!scales.is_empty(), "At least one station is required");

        let sections = scales
            .iter()
            .zip(stations.iter())
            .map(|(scale, z)| {
                CurveInterpolation::new(self.airfoil.section(*scale, *z))
                    .with_num_control_points(self.options.num_control_points)
                    .try_create_curve(self.options.curve_order)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        info!(
            "fitted {} sections with {} control points",
            sections.len(),
            self.options.num_control_points
        );
        Ok(sections)
    }

    /// Skin the sections into a surface, `u` runs along the sections and `v` along the span
    pub fn try_loft(&self, sections: &[NurbsCurve3D<f64>]) -> anyhow::Result<NurbsSurface3D<f64>> {
        let surface = CurveLofter::new(sections).try_create_surface(self.options.loft_order)?;
        info!(
            "lofted surface of degree ({}, {})",
            surface.u_degree(),
            surface.v_degree()
        );
        Ok(surface)
    }

    /// Bound the surface by the rectangular cutout in parameter space
    pub fn try_geometry(&self, surface: NurbsSurface3D<f64>) -> anyhow::Result<Geometry> {
        let (u0, u1) = self.options.cutout_u;
        let (v0, v1) = self.options.cutout_v;
        let inside = |x: f64| (0. ..=1.).contains(&x);
        anyhow::ensure!(
            inside(u0) && inside(u1) && inside(v0) && inside(v1),
            "Cutout ({}, {}) x ({}, {}) is outside the unit square",
            u0,
            u1,
            v0,
            v1
        );
        anyhow::ensure!(
            u0 < u1 && v0 < v1,
            "Cutout ({}, {}) x ({}, {}) is empty",
            u0,
            u1,
            v0,
            v1
        );

        let mut builder = GeometryBuilder::new();
        let face = builder.add_surface(surface);

        let corners = [
            Point2::new(u0, v0),
            Point2::new(u1, v0),
            Point2::new(u1, v1),
            Point2::new(u0, v1),
        ];
        let edges = (0..4)
            .map(|i| {
                let pcurve = NurbsCurve2D::polyline(&[corners[i], corners[(i + 1) % 4]])?;
                Ok(builder.add_edge(EdgeCurve::OnFace { face, pcurve }))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        // every edge starts at its own vertex and ends at the next one
        let vertices = edges
            .iter()
            .map(|edge| builder.add_vertex(Vertex::OnEdge { edge: *edge, t: 0. }))
            .collect::<Vec<_>>();
        for i in 0..4 {
            builder.set_edge_vertices(edges[i], vertices[i], vertices[(i + 1) % 4])?;
        }

        builder.add_loop(
            face,
            edges.iter().map(|e| (*e, Orientation::Forward)).collect(),
        )?;
        builder.build()
    }

    pub fn try_mesh(&self, geometry: &Geometry) -> anyhow::Result<QuadMesh> {
        Mesher::new(geometry).mesh(&self.options.mesh)
    }

    /// Create one shell element per quad, all sharing the same constitutive law
    pub fn try_model(&self, mesh: &QuadMesh) -> anyhow::Result<Model> {
        let (ptr, conn) = mesh.csr_connectivity();
        let num_elements = mesh.num_quads();

        let stiffness = Arc::new(IsoFsdtStiffness::try_new(self.options.properties.clone())?);
        let elements = (0..num_elements)
            .map(|_| {
                let element: Arc<dyn Element> =
                    Arc::new(ShellElement::try_new(2, stiffness.clone())?);
                Ok(element)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut creator = Creator::new(self.options.vars_per_node);
        creator.set_global_connectivity(
            mesh.num_points(),
            ptr,
            conn,
            (0..num_elements).collect(),
        );
        creator.set_nodes(mesh.flattened_points());
        creator.set_elements(elements);
        creator.create_model()
    }

    pub fn run(&self) -> anyhow::Result<WingArtifacts> {
        let sections = self.try_sections()?;
        let surface = self.try_loft(&sections)?;
        let geometry = self.try_geometry(surface.clone())?;
        let mesh = self.try_mesh(&geometry)?;
        let model = self.try_model(&mesh)?;
        Ok(WingArtifacts {
            surface,
            geometry,
            mesh,
            model,
        })
    }

    /// Write the sampled surface and the finite-element model to the configured paths
    pub fn write_outputs(&self, artifacts: &WingArtifacts) -> anyhow::Result<()> {
        let (divs_u, divs_v) = self.options.surface_divisions;
        write_surface_vtk_file(
            &artifacts.surface,
            divs_u,
            divs_v,
            &self.options.surface_path,
        )?;
        info!("wrote surface to {}", self.options.surface_path.display());

        ModelExporter::new(&artifacts.model, self.options.export.clone())
            .write_to_file(&self.options.mesh_path)?;
        Ok(())
    }
}
