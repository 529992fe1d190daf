use std::fmt::Debug;

use nalgebra::{Point3, Vector3};

use super::ShellStrain;

/// Element family, used to pick the output layout of an exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Shell,
}

/// A finite element evaluated from its node coordinates and nodal variables
/// `xpts` holds the coordinates of the element nodes in element order,
/// `vars` the `num_nodes() * vars_per_node()` nodal variables.
pub trait Element: Debug + Send + Sync {
    fn kind(&self) -> ElementKind;

    fn num_nodes(&self) -> usize;

    fn vars_per_node(&self) -> usize;

    fn thickness(&self) -> f64;

    fn area(&self, xpts: &[Point3<f64>]) -> anyhow::Result<f64>;

    fn mass(&self, xpts: &[Point3<f64>]) -> anyhow::Result<f64>;

    /// Strain at the element centroid in the local tangent frame
    fn centroid_strain(&self, xpts: &[Point3<f64>], vars: &[f64]) -> anyhow::Result<ShellStrain>;

    /// Failure index at the element centroid, values above 1 indicate failure
    fn failure(&self, xpts: &[Point3<f64>], vars: &[f64]) -> anyhow::Result<f64>;

    /// Surface normals of the isoparametric map at the quadrature points
    fn quadrature_normals(&self, xpts: &[Point3<f64>]) -> anyhow::Result<Vec<Vector3<f64>>>;
}
