// src/error.rs
//
// Error types for shape-definition construction, the geometry facade and
// config loading.
//
// Every construction failure names the entity and the field that caused it,
// so a config author can find the offending entry without a debugger.

use thiserror::Error;

/// Result alias for shape-definition construction.
pub type DefinitionResult<T> = std::result::Result<T, DefinitionError>;

/// Hard failures detected while resolving a declarative shape config.
///
/// None of these are raised once a definition has been built: actions and
/// resets are total over a validated instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    /// `max_value` is smaller than `min_value`.
    #[error("{entity}.{field}: the min_value {min} must be smaller or equal to the max_value {max}")]
    BoundsInversion {
        entity: &'static str,
        field: &'static str,
        min: f64,
        max: f64,
    },

    /// A derived field needs a value that has not been resolved.
    #[error("{entity}.{field}: prerequisite {requires} is not set")]
    MissingPrerequisite {
        entity: &'static str,
        field: &'static str,
        requires: &'static str,
    },

    /// A control-point coordinate lies outside the unit hypercube.
    #[error(
        "{entity}.{field}: value {value} at control point {point}, axis {axis} is outside the unit hypercube [0, 1]"
    )]
    OutOfDomain {
        entity: &'static str,
        field: &'static str,
        point: usize,
        axis: usize,
        value: f64,
    },

    /// The current position is not inside its own bounds.
    #[error("{entity}.current_position: {value} is outside [{min}, {max}]")]
    OutOfBounds {
        entity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The NURBS weight vector does not match the number of control points.
    #[error("{entity}.weights: the length of the weight vector {found} is not the same as the number of control points {expected}")]
    WeightCount {
        entity: &'static str,
        expected: usize,
        found: usize,
    },

    /// An explicit control-point grid has the wrong shape.
    #[error("{entity}.{field}: {message}")]
    GridShape {
        entity: &'static str,
        field: &'static str,
        message: String,
    },

    /// Any other rejected scalar (zero counts, negative steps, NaN, ...).
    #[error("{entity}.{field}: {message}")]
    InvalidValue {
        entity: &'static str,
        field: &'static str,
        message: String,
    },
}

/// Misuse of a built geometry: wrong action shape, bad evaluation input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("geometry expects {expected} actions but received a {received} action")]
    WrongActionMode {
        expected: &'static str,
        received: &'static str,
    },

    #[error("discrete action index {index} is out of range for an action space of size {size}")]
    ActionIndexOutOfRange { index: usize, size: usize },

    #[error("continuous action has length {found}, expected {expected}")]
    ActionLength { expected: usize, found: usize },

    #[error("spline has {expected} parametric dimensions but {found} parameters were given")]
    ParameterCount { expected: usize, found: usize },

    #[error("parameter {value} on axis {axis} is outside the knot domain [{start}, {end}]")]
    ParameterOutOfDomain {
        axis: usize,
        value: f64,
        start: f64,
        end: f64,
    },

    #[error("knot vector of axis {axis} has {found} entries, expected {expected}")]
    KnotVector {
        axis: usize,
        expected: usize,
        found: usize,
    },

    #[error("axis {axis} has {points} control points, too few for degree {degree}")]
    DegreeTooHigh {
        axis: usize,
        degree: usize,
        points: usize,
    },

    #[error("NURBS weights around {parameters:?} sum to zero")]
    ZeroWeightSum { parameters: Vec<f64> },

    #[error("raw control-point geometry has no parametric evaluation")]
    NotEvaluable,
}

/// Errors raised while loading a geometry configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
