// src/spline/grid.rs
//
// Default tensor-product control-point grid.
//
// Axes are processed in reverse declaration order. The first processed axis
// seeds one single-coordinate tuple per value; every later axis loops over
// the existing tuples (outer) and its own values (inner) and prepends its
// coordinate. The resulting tuple index equals the declared axis order and
// the first declared axis varies fastest in the flattened point index. The
// action-index mapping of trained agents depends on this order.

use crate::error::DefinitionResult;
use crate::space_dimension::SplineSpaceDimension;
use crate::variable::VariableLocation;

pub(crate) fn default_control_point_grid(
    dimensions: &[SplineSpaceDimension],
) -> DefinitionResult<Vec<Vec<VariableLocation>>> {
    let mut grid: Vec<Vec<VariableLocation>> = Vec::new();
    for (processed, dim) in dimensions.iter().rev().enumerate() {
        let axis = axis_variables(dim.number_of_points())?;
        if processed == 0 {
            grid = axis.into_iter().map(|var| vec![var]).collect();
            continue;
        }
        let mut next = Vec::with_capacity(grid.len() * axis.len());
        for tuple in &grid {
            for var in &axis {
                let mut point = Vec::with_capacity(tuple.len() + 1);
                point.push(var.clone());
                point.extend(tuple.iter().cloned());
                next.push(point);
            }
        }
        grid = next;
    }
    Ok(grid)
}

/// Equally spaced values in [0, 1], each free to move half a spacing
/// towards its neighbours. End points only move inwards.
fn axis_variables(number_of_points: usize) -> DefinitionResult<Vec<VariableLocation>> {
    if number_of_points == 1 {
        return Ok(vec![VariableLocation::fixed(0.0)?]);
    }
    let intervals = (number_of_points - 1) as f64;
    let half = 1.0 / (2.0 * intervals);
    (0..number_of_points)
        .map(|i| {
            if i == 0 {
                VariableLocation::with_bounds(0.0, 0.0, half)
            } else if i == number_of_points - 1 {
                VariableLocation::with_bounds(1.0, 1.0 - half, 1.0)
            } else {
                let value = i as f64 / intervals;
                VariableLocation::with_bounds(value, value - half, value + half)
            }
        })
        .collect()
}
