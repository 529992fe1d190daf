/// Options for mapped quadrilateral meshing
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshOptions {
    /// Target length of an element edge
    pub element_size: f64,
    /// Minimum number of segments per edge
    pub min_edge_divisions: usize,
    /// Number of intervals of the arc length table of an edge
    pub arc_length_intervals: usize,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            element_size: 0.1,
            min_edge_divisions: 1,
            arc_length_intervals: 64,
        }
    }
}

impl MeshOptions {
    pub fn with_element_size(mut self, element_size: f64) -> Self {
        self.element_size = element_size;
        self
    }

    pub fn with_min_edge_divisions(mut self, min_edge_divisions: usize) -> Self {
        self.min_edge_divisions = min_edge_divisions;
        self
    }

    pub fn with_arc_length_intervals(mut self, arc_length_intervals: usize) -> Self {
        self.arc_length_intervals = arc_length_intervals;
        self
    }
}
