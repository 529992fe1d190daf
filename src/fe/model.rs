use std::sync::Arc;

use nalgebra::Point3;

use super::{Element, ShellStrain};

/// Finite-element model: nodes, element connectivity, elements and the nodal variables
#[derive(Debug, Clone)]
pub struct Model {
    vars_per_node: usize,
    nodes: Vec<Point3<f64>>,
    ptr: Vec<usize>,
    conn: Vec<usize>,
    elements: Vec<Arc<dyn Element>>,
    variables: Vec<f64>,
}

impl Model {
    /// Created through `Creator::create_model`, which validates the input
    pub(crate) fn new(
        vars_per_node: usize,
        nodes: Vec<Point3<f64>>,
        ptr: Vec<usize>,
        conn: Vec<usize>,
        elements: Vec<Arc<dyn Element>>,
    ) -> Self {
        let variables = vec![0.; vars_per_node * nodes.len()];
        Self {
            vars_per_node,
            nodes,
            ptr,
            conn,
            elements,
            variables,
        }
    }

    pub fn vars_per_node(&self) -> usize {
        self.vars_per_node
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn nodes(&self) -> &[Point3<f64>] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> anyhow::Result<&Point3<f64>> {
        self.nodes
            .get(index)
            .ok_or(anyhow::anyhow!("Node {} does not exist", index))
    }

    /// Node indices of an element in element order
    pub fn element_nodes(&self, element: usize) -> anyhow::Result<&[usize]> {
        anyhow::ensure!(
            element < self.elements.len(),
            "Element {} does not exist",
            element
        );
        Ok(&self.conn[self.ptr[element]..self.ptr[element + 1]])
    }

    pub fn element(&self, element: usize) -> anyhow::Result<&dyn Element> {
        self.elements
            .get(element)
            .map(|e| e.as_ref())
            .ok_or(anyhow::anyhow!("Element {} does not exist", element))
    }

    pub fn element_xpts(&self, element: usize) -> anyhow::Result<Vec<Point3<f64>>> {
        Ok(self
            .element_nodes(element)?
            .iter()
            .map(|n| self.nodes[*n])
            .collect())
    }

    /// Nodal variables of an element, node by node
    pub fn element_vars(&self, element: usize) -> anyhow::Result<Vec<f64>> {
        let vpn = self.vars_per_node;
        Ok(self
            .element_nodes(element)?
            .iter()
            .flat_map(|n| self.variables[vpn * n..vpn * (n + 1)].iter().copied())
            .collect())
    }

    /// Nodal variables, `vars_per_node` consecutive values per node
    pub fn variables(&self) -> &[f64] {
        &self.variables
    }

    pub fn set_variables(&mut self, variables: Vec<f64>) -> anyhow::Result<()> {
        anyhow::ensure!(
            variables.len() == self.variables.len(),
            "Got {} variables, expected {}",
            variables.len(),
            self.variables.len()
        );
        self.variables = variables;
        Ok(())
    }

    pub fn total_area(&self) -> anyhow::Result<f64> {
        (0..self.num_elements()).try_fold(0., |acc, e| {
            Ok(acc + self.elements[e].area(&self.element_xpts(e)?)?)
        })
    }

    pub fn total_mass(&self) -> anyhow::Result<f64> {
        (0..self.num_elements()).try_fold(0., |acc, e| {
            Ok(acc + self.elements[e].mass(&self.element_xpts(e)?)?)
        })
    }

    pub fn element_strain(&self, element: usize) -> anyhow::Result<ShellStrain> {
        let xpts = self.element_xpts(element)?;
        let vars = self.element_vars(element)?;
        self.elements[element].centroid_strain(&xpts, &vars)
    }

    pub fn element_failure(&self, element: usize) -> anyhow::Result<f64> {
        let xpts = self.element_xpts(element)?;
        let vars = self.element_vars(element)?;
        self.elements[element].failure(&xpts, &vars)
    }
}
