// src/cube.rs
//
// Point-cloud shape: a list of control points in the unit hypercube with no
// knot or degree metadata. The geometry is the control points themselves.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, DefinitionResult};
use crate::shape::{current_positions, grid_targets, validate_unit_hypercube, ActionTarget, ShapeParameterization};
use crate::spline::geometry::SplineGeometry;
use crate::variable::{ControlValue, VariableLocation};

const ENTITY: &str = "CubeDefinition";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CubeSpec {
    pub control_points: Vec<Vec<ControlValue>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CubeDefinition {
    control_points: Vec<Vec<VariableLocation>>,
}

impl CubeDefinition {
    pub fn from_spec(spec: &CubeSpec) -> DefinitionResult<Self> {
        if spec.control_points.first().map_or(true, Vec::is_empty) {
            return Err(DefinitionError::GridShape {
                entity: ENTITY,
                field: "control_points",
                message: "a cube needs at least one control point with one coordinate".to_string(),
            });
        }
        let control_points = spec
            .control_points
            .iter()
            .map(|row| row.iter().map(ControlValue::resolve).collect())
            .collect::<DefinitionResult<Vec<Vec<_>>>>()?;
        validate_unit_hypercube(ENTITY, "control_points", &control_points)?;
        Ok(Self { control_points })
    }

    pub fn control_point_variables(&self) -> &[Vec<VariableLocation>] {
        &self.control_points
    }
}

impl ShapeParameterization for CubeDefinition {
    /// Number of control points times the coordinates of the first one.
    fn number_of_points(&self) -> usize {
        self.control_points.len() * self.control_points.first().map_or(0, Vec::len)
    }

    fn control_points(&self) -> Vec<Vec<f64>> {
        current_positions(&self.control_points)
    }

    fn targets(&self) -> Vec<ActionTarget> {
        grid_targets(&self.control_points)
    }

    fn variable(&self, target: ActionTarget) -> Option<&VariableLocation> {
        match target {
            ActionTarget::ControlPoint { point, axis } => self.control_points.get(point)?.get(axis),
            ActionTarget::Weight(_) => None,
        }
    }

    fn variable_mut(&mut self, target: ActionTarget) -> Option<&mut VariableLocation> {
        match target {
            ActionTarget::ControlPoint { point, axis } => {
                self.control_points.get_mut(point)?.get_mut(axis)
            }
            ActionTarget::Weight(_) => None,
        }
    }

    fn spline(&self) -> SplineGeometry {
        debug!("Cube geometry requested, returning the raw control points.");
        SplineGeometry::ControlPoints {
            control_points: self.control_points(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableLocationSpec;

    #[test]
    fn number_of_points_counts_coordinates() {
        let cube = CubeDefinition::from_spec(&CubeSpec {
            control_points: vec![vec![ControlValue::Fixed(0.0); 3]; 4],
        })
        .unwrap();
        assert_eq!(cube.number_of_points(), 12);
        assert_eq!(cube.control_points().len(), 4);
        assert!(cube.actions().is_empty());
    }

    #[test]
    fn spline_is_the_raw_control_points() {
        let mut cube = CubeDefinition::from_spec(&CubeSpec {
            control_points: vec![vec![
                VariableLocationSpec::bounded(0.5, 0.0, 1.0).into(),
                ControlValue::Fixed(0.2),
            ]],
        })
        .unwrap();
        cube.apply_continuous_action(&[1.0]).unwrap();
        let geometry = cube.spline();
        assert_eq!(geometry.kind(), "control_points");
        assert_eq!(geometry.control_points(), &[vec![1.0, 0.2]]);
        assert!(geometry.weights().is_none());
    }

    #[test]
    fn rejects_empty_and_out_of_domain_points() {
        assert!(matches!(
            CubeDefinition::from_spec(&CubeSpec { control_points: vec![] }),
            Err(DefinitionError::GridShape { .. })
        ));
        assert!(matches!(
            CubeDefinition::from_spec(&CubeSpec {
                control_points: vec![vec![ControlValue::Fixed(-0.1)]],
            }),
            Err(DefinitionError::OutOfDomain { entity: "CubeDefinition", .. })
        ));
    }
}
