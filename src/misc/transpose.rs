use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use super::FloatingPoint;

/// Transpose a control point net, turning columns into rows
pub fn transpose_control_points<T: FloatingPoint, D: DimName>(
    points: &[Vec<OPoint<T, D>>],
) -> Vec<Vec<OPoint<T, D>>>
where
    DefaultAllocator: Allocator<D>,
{
    let columns = points.first().map(|row| row.len()).unwrap_or(0);
    let mut transposed = vec![vec![]; columns];
    points.iter().for_each(|row| {
        row.iter().enumerate().for_each(|(j, p)| {
            transposed[j].push(p.clone());
        })
    });
    transposed
}
