// src/spline/mod.rs
//
// Spline shape definitions (B-spline and NURBS).
//
// Construction is an ordered pipeline, each stage reading only the stages
// before it:
//   axes -> knot vectors -> control-point grid -> unit-hypercube check -> weights
// Any failure aborts the build with an error naming the offending field;
// no partially built definition is ever returned.

pub mod geometry;
mod grid;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, DefinitionResult};
use crate::shape::{current_positions, grid_targets, validate_unit_hypercube, ActionTarget, ShapeParameterization};
use crate::space_dimension::{SplineSpaceDimension, SplineSpaceDimensionSpec};
use crate::variable::{ControlValue, VariableLocation};

use self::geometry::{BSplineGeometry, NurbsGeometry, SplineGeometry};

const ENTITY: &str = "SplineDefinition";
const NURBS_ENTITY: &str = "NURBSDefinition";

/// Declarative spline shape as written in a config file.
///
/// Used for both `b_spline` and `nurbs` shapes; `weights` is only accepted
/// for NURBS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplineSpec {
    pub space_dimensions: Vec<SplineSpaceDimensionSpec>,
    #[serde(default)]
    pub control_point_variables: Option<Vec<Vec<ControlValue>>>,
    #[serde(default)]
    pub weights: Option<Vec<ControlValue>>,
}

impl SplineSpec {
    pub fn new(space_dimensions: Vec<SplineSpaceDimensionSpec>) -> Self {
        Self {
            space_dimensions,
            ..Self::default()
        }
    }

    pub fn with_control_points(mut self, rows: Vec<Vec<ControlValue>>) -> Self {
        self.control_point_variables = Some(rows);
        self
    }

    pub fn with_weights(mut self, weights: Vec<ControlValue>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn build_bspline(&self) -> DefinitionResult<SplineDefinition> {
        if self.weights.is_some() {
            return Err(DefinitionError::InvalidValue {
                entity: "BSplineDefinition",
                field: "weights",
                message: "weights are only accepted for NURBS definitions".to_string(),
            });
        }
        let (space_dimensions, control_point_variables) = self.build_base(ENTITY)?;
        Ok(SplineDefinition {
            space_dimensions,
            control_point_variables,
            kind: SplineKind::BSpline,
        })
    }

    pub fn build_nurbs(&self) -> DefinitionResult<SplineDefinition> {
        let (space_dimensions, control_point_variables) = self.build_base(NURBS_ENTITY)?;
        let weights = resolve_weights(self.weights.as_deref(), control_point_variables.len())?;
        Ok(SplineDefinition {
            space_dimensions,
            control_point_variables,
            kind: SplineKind::Nurbs { weights },
        })
    }

    fn build_base(
        &self,
        entity: &'static str,
    ) -> DefinitionResult<(Vec<SplineSpaceDimension>, Vec<Vec<VariableLocation>>)> {
        if self.space_dimensions.is_empty() {
            return Err(DefinitionError::MissingPrerequisite {
                entity,
                field: "control_point_variables",
                requires: "space_dimensions",
            });
        }
        let dimensions = self
            .space_dimensions
            .iter()
            .map(SplineSpaceDimension::from_spec)
            .collect::<DefinitionResult<Vec<_>>>()?;
        let expected_points: usize = dimensions.iter().map(SplineSpaceDimension::number_of_points).product();

        let grid = match &self.control_point_variables {
            Some(rows) => resolve_explicit_grid(entity, rows, expected_points)?,
            None => {
                debug!("No control points given for {entity}, building the default grid.");
                grid::default_control_point_grid(&dimensions)?
            }
        };
        validate_unit_hypercube(entity, "control_point_variables", &grid)?;
        Ok((dimensions, grid))
    }
}

/// Which geometry a spline definition builds.
#[derive(Debug, Clone, PartialEq)]
pub enum SplineKind {
    BSpline,
    /// One weight per control point; weights may leave [0, 1].
    Nurbs { weights: Vec<VariableLocation> },
}

impl SplineKind {
    pub fn name(&self) -> &'static str {
        match self {
            SplineKind::BSpline => "b_spline",
            SplineKind::Nurbs { .. } => "nurbs",
        }
    }
}

/// A built B-spline or NURBS definition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineDefinition {
    space_dimensions: Vec<SplineSpaceDimension>,
    control_point_variables: Vec<Vec<VariableLocation>>,
    kind: SplineKind,
}

impl SplineDefinition {
    pub fn space_dimensions(&self) -> &[SplineSpaceDimension] {
        &self.space_dimensions
    }

    pub fn control_point_variables(&self) -> &[Vec<VariableLocation>] {
        &self.control_point_variables
    }

    pub fn kind(&self) -> &SplineKind {
        &self.kind
    }

    /// NURBS weights; empty for B-splines.
    pub fn weights(&self) -> &[VariableLocation] {
        match &self.kind {
            SplineKind::BSpline => &[],
            SplineKind::Nurbs { weights } => weights,
        }
    }

    fn bspline_geometry(&self) -> BSplineGeometry {
        BSplineGeometry::new(
            self.space_dimensions.iter().map(SplineSpaceDimension::degree).collect(),
            self.space_dimensions.iter().map(|d| d.knot_vector().to_vec()).collect(),
            self.space_dimensions.iter().map(SplineSpaceDimension::number_of_points).collect(),
            self.control_points(),
        )
    }
}

impl ShapeParameterization for SplineDefinition {
    fn number_of_points(&self) -> usize {
        self.space_dimensions
            .iter()
            .map(SplineSpaceDimension::number_of_points)
            .product()
    }

    fn control_points(&self) -> Vec<Vec<f64>> {
        current_positions(&self.control_point_variables)
    }

    fn targets(&self) -> Vec<ActionTarget> {
        let mut targets = grid_targets(&self.control_point_variables);
        targets.extend((0..self.weights().len()).map(ActionTarget::Weight));
        targets
    }

    fn variable(&self, target: ActionTarget) -> Option<&VariableLocation> {
        match target {
            ActionTarget::ControlPoint { point, axis } => {
                self.control_point_variables.get(point)?.get(axis)
            }
            ActionTarget::Weight(index) => self.weights().get(index),
        }
    }

    fn variable_mut(&mut self, target: ActionTarget) -> Option<&mut VariableLocation> {
        match target {
            ActionTarget::ControlPoint { point, axis } => {
                self.control_point_variables.get_mut(point)?.get_mut(axis)
            }
            ActionTarget::Weight(index) => match &mut self.kind {
                SplineKind::BSpline => None,
                SplineKind::Nurbs { weights } => weights.get_mut(index),
            },
        }
    }

    fn spline(&self) -> SplineGeometry {
        let bspline = self.bspline_geometry();
        match &self.kind {
            SplineKind::BSpline => SplineGeometry::BSpline(bspline),
            SplineKind::Nurbs { weights } => SplineGeometry::Nurbs(NurbsGeometry::new(
                bspline,
                weights.iter().map(VariableLocation::current_position).collect(),
            )),
        }
    }
}

fn resolve_explicit_grid(
    entity: &'static str,
    rows: &[Vec<ControlValue>],
    expected_points: usize,
) -> DefinitionResult<Vec<Vec<VariableLocation>>> {
    if rows.len() != expected_points {
        return Err(DefinitionError::GridShape {
            entity,
            field: "control_point_variables",
            message: format!(
                "expected {expected_points} control points from the space dimensions, found {}",
                rows.len()
            ),
        });
    }
    let width = rows.first().map_or(0, Vec::len);
    if width == 0 {
        return Err(DefinitionError::GridShape {
            entity,
            field: "control_point_variables",
            message: "control points need at least one coordinate".to_string(),
        });
    }
    if let Some(point) = rows.iter().position(|row| row.len() != width) {
        return Err(DefinitionError::GridShape {
            entity,
            field: "control_point_variables",
            message: format!(
                "control point {point} has {} coordinates, expected {width}",
                rows[point].len()
            ),
        });
    }
    rows.iter()
        .map(|row| row.iter().map(ControlValue::resolve).collect())
        .collect()
}

fn resolve_weights(
    weights: Option<&[ControlValue]>,
    n_points: usize,
) -> DefinitionResult<Vec<VariableLocation>> {
    match weights {
        None => {
            debug!("No weights given for {NURBS_ENTITY}, using 1.0 for all {n_points} control points.");
            (0..n_points).map(|_| VariableLocation::fixed(1.0)).collect()
        }
        Some(weights) if weights.len() != n_points => Err(DefinitionError::WeightCount {
            entity: NURBS_ENTITY,
            expected: n_points,
            found: weights.len(),
        }),
        Some(weights) => weights.iter().map(ControlValue::resolve).collect(),
    }
}
