use std::sync::Arc;

use nalgebra::Point3;

use super::{Element, Model};

/// Collects connectivity, node coordinates and elements, and validates them into a `Model`
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use wingshell::prelude::*;
///
/// let stiffness = Arc::new(IsoFsdtStiffness::try_new(IsoShellProperties::default()).unwrap());
/// let shell: Arc<dyn Element> = Arc::new(ShellElement::try_new(2, stiffness).unwrap());
///
/// let mut creator = Creator::new(6);
/// creator.set_global_connectivity(4, vec![0, 4], vec![0, 1, 2, 3], vec![0]);
/// creator.set_nodes(vec![
///     0., 0., 0.,
///     1., 0., 0.,
///     0., 1., 0.,
///     1., 1., 0.,
/// ]);
/// creator.set_elements(vec![shell]);
/// let model = creator.create_model().unwrap();
/// assert_eq!(model.num_variables(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct Creator {
    vars_per_node: usize,
    connectivity: Option<Connectivity>,
    nodes: Option<Vec<f64>>,
    elements: Option<Vec<Arc<dyn Element>>>,
}

#[derive(Debug, Clone)]
struct Connectivity {
    num_nodes: usize,
    ptr: Vec<usize>,
    conn: Vec<usize>,
    ids: Vec<usize>,
}

impl Creator {
    pub fn new(vars_per_node: usize) -> Self {
        Self {
            vars_per_node,
            connectivity: None,
            nodes: None,
            elements: None,
        }
    }

    pub fn vars_per_node(&self) -> usize {
        self.vars_per_node
    }

    /// Set the element connectivity in compressed row form
    /// The nodes of element `e` are `conn[ptr[e]..ptr[e + 1]]` and its type is `ids[e]`,
    /// an index into the list given to `set_elements`
    pub fn set_global_connectivity(
        &mut self,
        num_nodes: usize,
        ptr: Vec<usize>,
        conn: Vec<usize>,
        ids: Vec<usize>,
    ) {
        self.connectivity = Some(Connectivity {
            num_nodes,
            ptr,
            conn,
            ids,
        });
    }

    /// Set the node coordinates as `[x0, y0, z0, x1, ...]`
    pub fn set_nodes(&mut self, xyz: Vec<f64>) {
        self.nodes = Some(xyz);
    }

    pub fn set_elements(&mut self, elements: Vec<Arc<dyn Element>>) {
        self.elements = Some(elements);
    }

    pub fn create_model(&self) -> anyhow::Result<Model> {
        anyhow::ensure!(self.vars_per_node > 0, "Variables per node must be positive");
        let Connectivity {
            num_nodes,
            ptr,
            conn,
            ids,
        } = self
            .connectivity
            .as_ref()
            .ok_or(anyhow::anyhow!("Connectivity has not been set"))?;
        let xyz = self
            .nodes
            .as_ref()
            .ok_or(anyhow::anyhow!("Nodes have not been set"))?;
        let elements = self
            .elements
            .as_ref()
            .ok_or(anyhow::anyhow!("Elements have not been set"))?;

        anyhow::ensure!(!ptr.is_empty(), "Connectivity pointer is empty");
        anyhow::ensure!(
            ptr[0] == 0,
            "Connectivity pointer must start at 0, got {}",
            ptr[0]
        );
        if let Some(e) = ptr.windows(2).position(|w| w[1] < w[0]) {
            anyhow::bail!("Connectivity pointer decreases at element {}", e);
        }
        anyhow::ensure!(
            ptr[ptr.len() - 1] == conn.len(),
            "Connectivity pointer ends at {}, expected {}",
            ptr[ptr.len() - 1],
            conn.len()
        );
        if let Some(i) = conn.iter().position(|n| *n >= *num_nodes) {
            anyhow::bail!(
                "Node index {} at position {} is out of range of {} nodes",
                conn[i],
                i,
                num_nodes
            );
        }
        anyhow::ensure!(
            xyz.len() == 3 * num_nodes,
            "Node array has length {}, expected {}",
            xyz.len(),
            3 * num_nodes
        );

        let num_elements = ptr.len() - 1;
        anyhow::ensure!(
            ids.len() == num_elements,
            "Got {} element ids for {} elements",
            ids.len(),
            num_elements
        );

        let nodes = xyz
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect::<Vec<_>>();

        let mut assigned = Vec::with_capacity(num_elements);
        for e in 0..num_elements {
            let id = ids[e];
            let element = elements.get(id).ok_or(anyhow::anyhow!(
                "Element {} refers to id {} but only {} elements were set",
                e,
                id,
                elements.len()
            ))?;
            let row = &conn[ptr[e]..ptr[e + 1]];
            anyhow::ensure!(
                element.num_nodes() == row.len(),
                "Element {} has {} nodes but its connectivity lists {}",
                e,
                element.num_nodes(),
                row.len()
            );
            anyhow::ensure!(
                element.vars_per_node() == self.vars_per_node,
                "Element {} has {} variables per node, expected {}",
                e,
                element.vars_per_node(),
                self.vars_per_node
            );

            let xpts = row.iter().map(|n| nodes[*n]).collect::<Vec<_>>();
            check_orientation(e, &element.quadrature_normals(&xpts)?)?;

            assigned.push(element.clone());
        }

        let model = Model::new(
            self.vars_per_node,
            nodes,
            ptr.clone(),
            conn.clone(),
            assigned,
        );
        log::info!(
            "model: {} nodes, {} elements, {} variables",
            model.num_nodes(),
            model.num_elements(),
            model.num_variables()
        );
        Ok(model)
    }
}

/// Reject elements whose jacobian vanishes or whose normal flips between quadrature points
fn check_orientation(element: usize, normals: &[nalgebra::Vector3<f64>]) -> anyhow::Result<()> {
    let Some(reference) = normals.first() else {
        return Ok(());
    };
    for n in normals {
        anyhow::ensure!(
            n.norm() > f64::EPSILON,
            "Element {} is degenerate",
            element
        );
        anyhow::ensure!(
            n.dot(reference) > 0.,
            "Element {} is inverted, its normal flips between quadrature points",
            element
        );
    }
    Ok(())
}
