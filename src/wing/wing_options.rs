use std::path::PathBuf;

use crate::{fe::IsoShellProperties, io::ExportFlags, mesh::MeshOptions};

/// Configuration of the wing pipeline
/// The default reproduces the RAE 2822 wing: five stations over a 20 unit span,
/// a cutout on the upper skin and a 2 cm aluminium shell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WingOptions {
    /// Chord scale of each station
    pub scales: Vec<f64>,
    /// Spanwise position of each station
    pub stations: Vec<f64>,
    /// Number of control points of each fitted section
    pub num_control_points: usize,
    /// Order of the section curves (degree + 1)
    pub curve_order: usize,
    /// Order of the loft in the spanwise direction
    pub loft_order: usize,
    /// Parametric extent of the cutout along the sections
    pub cutout_u: (f64, f64),
    /// Parametric extent of the cutout along the span
    pub cutout_v: (f64, f64),
    pub mesh: MeshOptions,
    pub properties: IsoShellProperties,
    pub vars_per_node: usize,
    /// Grid divisions used to sample the surface for export
    pub surface_divisions: (usize, usize),
    pub export: ExportFlags,
    pub surface_path: PathBuf,
    pub mesh_path: PathBuf,
}

impl Default for WingOptions {
    fn default() -> Self {
        Self {
            scales: vec![6., 4., 3., 2., 1.],
            stations: vec![0., 2., 5., 10., 20.],
            num_control_points: 15,
            curve_order: 4,
            loft_order: 4,
            cutout_u: (0.1, 0.4),
            cutout_v: (0.0, 1.0),
            mesh: MeshOptions::default().with_element_size(0.1),
            properties: IsoShellProperties::default(),
            vars_per_node: 6,
            surface_divisions: (128, 32),
            export: ExportFlags::default(),
            surface_path: PathBuf::from("wing.vtk"),
            mesh_path: PathBuf::from("mesh.vtk"),
        }
    }
}

impl WingOptions {
    /// Set the station scales and spanwise positions together
    pub fn with_stations(mut self, scales: Vec<f64>, stations: Vec<f64>) -> Self {
        self.scales = scales;
        self.stations = stations;
        self
    }

    pub fn with_num_control_points(mut self, num_control_points: usize) -> Self {
        self.num_control_points = num_control_points;
        self
    }

    pub fn with_curve_order(mut self, curve_order: usize) -> Self {
        self.curve_order = curve_order;
        self
    }

    pub fn with_loft_order(mut self, loft_order: usize) -> Self {
        self.loft_order = loft_order;
        self
    }

    pub fn with_cutout(mut self, cutout_u: (f64, f64), cutout_v: (f64, f64)) -> Self {
        self.cutout_u = cutout_u;
        self.cutout_v = cutout_v;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshOptions) -> Self {
        self.mesh = mesh;
        self
    }

    pub fn with_element_size(mut self, element_size: f64) -> Self {
        self.mesh.element_size = element_size;
        self
    }

    pub fn with_properties(mut self, properties: IsoShellProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_vars_per_node(mut self, vars_per_node: usize) -> Self {
        self.vars_per_node = vars_per_node;
        self
    }

    pub fn with_surface_divisions(mut self, divs_u: usize, divs_v: usize) -> Self {
        self.surface_divisions = (divs_u, divs_v);
        self
    }

    pub fn with_export(mut self, export: ExportFlags) -> Self {
        self.export = export;
        self
    }

    pub fn with_output_paths<P: Into<PathBuf>, Q: Into<PathBuf>>(
        mut self,
        surface_path: P,
        mesh_path: Q,
    ) -> Self {
        self.surface_path = surface_path.into();
        self.mesh_path = mesh_path.into();
        self
    }

    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
