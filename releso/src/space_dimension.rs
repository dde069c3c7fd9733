// src/space_dimension.rs
//
// Per-axis metadata of a parametric spline: number of control points,
// degree and knot vector.
//
// Knot vectors are resolved when the dimension is built:
// - a supplied vector of the expected length is used as-is,
// - a missing vector is synthesised in the open uniform format,
// - a supplied vector of the wrong length is kept and a warning is logged.
// User data is never truncated or padded.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, DefinitionResult};

const ENTITY: &str = "SplineSpaceDimension";

/// Declarative form of one parametric axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplineSpaceDimensionSpec {
    /// Name used in logs and error messages.
    pub name: String,
    pub number_of_points: usize,
    pub degree: usize,
    #[serde(default)]
    pub knot_vector: Option<Vec<f64>>,
}

impl SplineSpaceDimensionSpec {
    pub fn new(name: impl Into<String>, number_of_points: usize, degree: usize) -> Self {
        Self {
            name: name.into(),
            number_of_points,
            degree,
            knot_vector: None,
        }
    }
}

/// One resolved parametric axis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplineSpaceDimension {
    name: String,
    number_of_points: usize,
    degree: usize,
    knot_vector: Vec<f64>,
}

impl SplineSpaceDimension {
    pub fn new(
        name: impl Into<String>,
        number_of_points: usize,
        degree: usize,
        knot_vector: Option<Vec<f64>>,
    ) -> DefinitionResult<Self> {
        let name = name.into();
        if number_of_points == 0 {
            return Err(DefinitionError::InvalidValue {
                entity: ENTITY,
                field: "number_of_points",
                message: format!("dimension '{name}' needs at least one control point"),
            });
        }
        if degree == 0 {
            return Err(DefinitionError::InvalidValue {
                entity: ENTITY,
                field: "degree",
                message: format!("dimension '{name}' needs a degree of at least 1"),
            });
        }
        if let Some(knot) = knot_vector
            .as_ref()
            .and_then(|knots| knots.iter().find(|k| !k.is_finite()))
        {
            return Err(DefinitionError::InvalidValue {
                entity: ENTITY,
                field: "knot_vector",
                message: format!("dimension '{name}' has a non-finite knot {knot}"),
            });
        }

        let knot_vector = resolve_knot_vector(&name, number_of_points, degree, knot_vector);
        Ok(Self {
            name,
            number_of_points,
            degree,
            knot_vector,
        })
    }

    pub fn from_spec(spec: &SplineSpaceDimensionSpec) -> DefinitionResult<Self> {
        Self::new(
            spec.name.clone(),
            spec.number_of_points,
            spec.degree,
            spec.knot_vector.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_points(&self) -> usize {
        self.number_of_points
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knot_vector(&self) -> &[f64] {
        &self.knot_vector
    }

    /// `number_of_points + degree + 1`.
    pub fn expected_knot_count(&self) -> usize {
        expected_knot_count(self.number_of_points, self.degree)
    }

    /// Whether the resolved knot vector has the length a spline of this
    /// degree and point count needs.
    pub fn knot_vector_is_consistent(&self) -> bool {
        self.knot_vector.len() == self.expected_knot_count()
    }
}

pub fn expected_knot_count(number_of_points: usize, degree: usize) -> usize {
    number_of_points + degree + 1
}

/// Resolve the knot vector of one axis.
pub fn resolve_knot_vector(
    name: &str,
    number_of_points: usize,
    degree: usize,
    supplied: Option<Vec<f64>>,
) -> Vec<f64> {
    let n_knots = expected_knot_count(number_of_points, degree);
    match supplied {
        Some(knots) => {
            debug!("The knot_vector for dimension {name} is given.");
            if knots.len() != n_knots {
                warn!(
                    "The knot vector of dimension {name} does not contain the correct number of \
                     items for an open knot vector definition (is: {}, should_be: {n_knots}); \
                     keeping it unchanged.",
                    knots.len()
                );
            }
            knots
        }
        None => {
            debug!(
                "The knot_vector for dimension {name} is not given, generating one in the open format."
            );
            let knots = open_uniform_knot_vector(number_of_points, degree);
            if knots.len() != n_knots {
                warn!(
                    "The knot vector of dimension {name} is shorter ({n_knots}) than the length given \
                     by the open format ({}). Knot vector is created from the starting and ending \
                     parts only.",
                    knots.len()
                );
            }
            knots
        }
    }
}

/// Open uniform knot vector with endpoint multiplicity `degree + 1`.
///
/// When there are too few points for an open vector of this degree the
/// result is `degree + 1` zeros followed by `degree + 1` ones, which is
/// longer than `number_of_points + degree + 1`.
pub fn open_uniform_knot_vector(number_of_points: usize, degree: usize) -> Vec<f64> {
    let n_knots = expected_knot_count(number_of_points, degree);
    let multiplicity = degree + 1;

    if n_knots < 2 * multiplicity {
        let mut knots = vec![0.0; multiplicity];
        knots.extend(std::iter::repeat(1.0).take(multiplicity));
        return knots;
    }

    let middle = n_knots - 2 * multiplicity;
    let segments = (middle + 1) as f64;
    let mut knots = Vec::with_capacity(n_knots);
    knots.extend(std::iter::repeat(0.0).take(degree));
    knots.extend((0..middle + 2).map(|i| i as f64 / segments));
    knots.extend(std::iter::repeat(1.0).take(degree));
    knots
}
