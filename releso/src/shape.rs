// src/shape.rs
//
// Shared contract of all shape definitions (B-spline, NURBS, cube) and the
// tagged union the geometry facade owns.

use serde::{Deserialize, Serialize};

use crate::cube::{CubeDefinition, CubeSpec};
use crate::error::{DefinitionError, DefinitionResult, GeometryError};
use crate::rl::action_encoding::{decode_discrete_action, discrete_action_count};
use crate::spline::geometry::SplineGeometry;
use crate::spline::{SplineDefinition, SplineSpec};
use crate::variable::VariableLocation;

/// Address of one variable inside a shape definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTarget {
    ControlPoint { point: usize, axis: usize },
    Weight(usize),
}

/// Operations every shape definition offers to the RL loop.
///
/// Implementors provide the variable storage (`targets`, `variable`,
/// `variable_mut`) and the geometry; action collection, action dispatch
/// and reset are shared.
pub trait ShapeParameterization {
    /// Number of control points, as each variant defines it.
    fn number_of_points(&self) -> usize;

    /// Current positions, one row per control point.
    fn control_points(&self) -> Vec<Vec<f64>>;

    /// Every variable of the definition in stable order: control points
    /// flattened point-major, then weights.
    fn targets(&self) -> Vec<ActionTarget>;

    fn variable(&self, target: ActionTarget) -> Option<&VariableLocation>;

    fn variable_mut(&mut self, target: ActionTarget) -> Option<&mut VariableLocation>;

    /// Geometry handle of the current shape.
    fn spline(&self) -> SplineGeometry;

    /// Targets of the action-eligible variables, in stable order.
    fn action_targets(&self) -> Vec<ActionTarget> {
        self.targets()
            .into_iter()
            .filter(|t| self.variable(*t).is_some_and(VariableLocation::is_action))
            .collect()
    }

    fn actions(&self) -> Vec<&VariableLocation> {
        self.action_targets()
            .into_iter()
            .filter_map(|t| self.variable(t))
            .collect()
    }

    /// Whether any variable has moved away from its original position.
    fn is_changed(&self) -> bool {
        self.targets()
            .into_iter()
            .any(|t| self.variable(t).is_some_and(VariableLocation::is_changed))
    }

    /// Apply discrete action `index` of the `2k` action space.
    fn apply_discrete_action(&mut self, index: usize) -> Result<f64, GeometryError> {
        let targets = self.action_targets();
        apply_discrete_to(self, &targets, index)
    }

    /// Apply one normalised value per action variable, positionally.
    fn apply_continuous_action(&mut self, values: &[f64]) -> Result<(), GeometryError> {
        let targets = self.action_targets();
        apply_continuous_to(self, &targets, values)
    }

    /// Restore every variable (control points and weights).
    fn reset(&mut self) {
        for target in self.targets() {
            if let Some(var) = self.variable_mut(target) {
                var.reset();
            }
        }
    }
}

/// Apply discrete action `index` against an explicit action mapping.
pub(crate) fn apply_discrete_to<S: ShapeParameterization + ?Sized>(
    shape: &mut S,
    targets: &[ActionTarget],
    index: usize,
) -> Result<f64, GeometryError> {
    let out_of_range = GeometryError::ActionIndexOutOfRange {
        index,
        size: discrete_action_count(targets.len()),
    };
    let action = match decode_discrete_action(index, targets.len()) {
        Some(action) => action,
        None => return Err(out_of_range),
    };
    match shape.variable_mut(targets[action.variable]) {
        Some(var) => Ok(var.apply_discrete_action(action.increasing)),
        None => Err(out_of_range),
    }
}

/// Apply one normalised value per entry of an explicit action mapping.
/// Nothing moves when the lengths differ.
pub(crate) fn apply_continuous_to<S: ShapeParameterization + ?Sized>(
    shape: &mut S,
    targets: &[ActionTarget],
    values: &[f64],
) -> Result<(), GeometryError> {
    if values.len() != targets.len() {
        return Err(GeometryError::ActionLength {
            expected: targets.len(),
            found: values.len(),
        });
    }
    for (target, &value) in targets.iter().zip(values) {
        if let Some(var) = shape.variable_mut(*target) {
            var.apply_continuous_action(value);
        }
    }
    Ok(())
}

/// Declarative shape, tagged by `type` in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    #[serde(rename = "b_spline", alias = "bspline")]
    BSpline(SplineSpec),
    Nurbs(SplineSpec),
    Cube(CubeSpec),
}

impl ShapeSpec {
    pub fn build(&self) -> DefinitionResult<ShapeDefinition> {
        match self {
            ShapeSpec::BSpline(spec) => spec.build_bspline().map(ShapeDefinition::Spline),
            ShapeSpec::Nurbs(spec) => spec.build_nurbs().map(ShapeDefinition::Spline),
            ShapeSpec::Cube(spec) => CubeDefinition::from_spec(spec).map(ShapeDefinition::Cube),
        }
    }
}

/// A built shape definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDefinition {
    Spline(SplineDefinition),
    Cube(CubeDefinition),
}

impl ShapeDefinition {
    fn inner(&self) -> &dyn ShapeParameterization {
        match self {
            ShapeDefinition::Spline(s) => s,
            ShapeDefinition::Cube(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ShapeParameterization {
        match self {
            ShapeDefinition::Spline(s) => s,
            ShapeDefinition::Cube(c) => c,
        }
    }

    /// `b_spline`, `nurbs` or `cube`.
    pub fn kind(&self) -> &'static str {
        match self {
            ShapeDefinition::Spline(s) => s.kind().name(),
            ShapeDefinition::Cube(_) => "cube",
        }
    }
}

impl From<SplineDefinition> for ShapeDefinition {
    fn from(spline: SplineDefinition) -> Self {
        ShapeDefinition::Spline(spline)
    }
}

impl From<CubeDefinition> for ShapeDefinition {
    fn from(cube: CubeDefinition) -> Self {
        ShapeDefinition::Cube(cube)
    }
}

impl ShapeParameterization for ShapeDefinition {
    fn number_of_points(&self) -> usize {
        self.inner().number_of_points()
    }

    fn control_points(&self) -> Vec<Vec<f64>> {
        self.inner().control_points()
    }

    fn targets(&self) -> Vec<ActionTarget> {
        self.inner().targets()
    }

    fn variable(&self, target: ActionTarget) -> Option<&VariableLocation> {
        self.inner().variable(target)
    }

    fn variable_mut(&mut self, target: ActionTarget) -> Option<&mut VariableLocation> {
        self.inner_mut().variable_mut(target)
    }

    fn spline(&self) -> SplineGeometry {
        self.inner().spline()
    }
}

/// Point-major targets of a `rows x width` control-point grid.
pub(crate) fn grid_targets(grid: &[Vec<VariableLocation>]) -> Vec<ActionTarget> {
    grid.iter()
        .enumerate()
        .flat_map(|(point, row)| (0..row.len()).map(move |axis| ActionTarget::ControlPoint { point, axis }))
        .collect()
}

pub(crate) fn current_positions(grid: &[Vec<VariableLocation>]) -> Vec<Vec<f64>> {
    grid.iter()
        .map(|row| row.iter().map(VariableLocation::current_position).collect())
        .collect()
}

/// Reject any control-point coordinate (current position or bound) outside
/// the closed unit interval.
pub(crate) fn validate_unit_hypercube(
    entity: &'static str,
    field: &'static str,
    grid: &[Vec<VariableLocation>],
) -> DefinitionResult<()> {
    for (point, row) in grid.iter().enumerate() {
        for (axis, var) in row.iter().enumerate() {
            for value in [var.current_position(), var.min_value(), var.max_value()] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(DefinitionError::OutOfDomain {
                        entity,
                        field,
                        point,
                        axis,
                        value,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{ControlValue, VariableLocationSpec};

    fn cube() -> ShapeDefinition {
        CubeDefinition::from_spec(&CubeSpec {
            control_points: vec![
                vec![ControlValue::Fixed(0.0), VariableLocationSpec::bounded(0.5, 0.25, 0.75).into()],
                vec![VariableLocationSpec::bounded(1.0, 0.8, 1.0).into(), ControlValue::Fixed(1.0)],
            ],
        })
        .unwrap()
        .into()
    }

    #[test]
    fn action_targets_skip_fixed_variables() {
        let shape = cube();
        assert_eq!(shape.targets().len(), 4);
        assert_eq!(
            shape.action_targets(),
            vec![
                ActionTarget::ControlPoint { point: 0, axis: 1 },
                ActionTarget::ControlPoint { point: 1, axis: 0 },
            ]
        );
        assert_eq!(shape.actions().len(), 2);
    }

    #[test]
    fn discrete_dispatch_uses_the_stable_order() {
        let mut shape = cube();
        // index 1: variable 0, decreasing
        let value = shape.apply_discrete_action(1).unwrap();
        assert!((value - 0.45).abs() < 1e-12);
        // index 3: variable 1, decreasing
        shape.apply_discrete_action(3).unwrap();
        assert!(shape.is_changed());
        assert_eq!(
            shape.apply_discrete_action(4),
            Err(GeometryError::ActionIndexOutOfRange { index: 4, size: 4 })
        );

        shape.reset();
        assert!(!shape.is_changed());
        assert_eq!(shape.control_points(), vec![vec![0.0, 0.5], vec![1.0, 1.0]]);
    }

    #[test]
    fn continuous_dispatch_checks_length() {
        let mut shape = cube();
        assert_eq!(
            shape.apply_continuous_action(&[0.0]),
            Err(GeometryError::ActionLength {
                expected: 2,
                found: 1
            })
        );
        assert!(!shape.is_changed());

        shape.apply_continuous_action(&[1.0, -1.0]).unwrap();
        assert_eq!(shape.control_points(), vec![vec![0.0, 0.75], vec![0.8, 1.0]]);
    }

    #[test]
    fn hypercube_check_covers_bounds() {
        let grid = vec![vec![VariableLocation::with_bounds(0.9, 0.8, 1.2).unwrap()]];
        assert!(matches!(
            validate_unit_hypercube("CubeDefinition", "control_points", &grid),
            Err(DefinitionError::OutOfDomain { point: 0, axis: 0, .. })
        ));
    }

    #[test]
    fn shape_spec_is_tagged_by_type() {
        let spec: ShapeSpec = serde_yaml::from_str(
            "type: cube\ncontrol_points:\n  - [0.0, 0.5]\n  - [1.0, 1.0]\n",
        )
        .unwrap();
        let shape = spec.build().unwrap();
        assert_eq!(shape.kind(), "cube");
        assert!(shape.action_targets().is_empty());
    }
}
