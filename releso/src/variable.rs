// src/variable.rs
//
// A single bounded, resettable scalar: one coordinate of one control point
// (or one NURBS weight). This is the atomic unit of the action space.
//
// - Discrete actions move the position by +/- step and clamp to bounds.
// - Continuous actions map [-1, 1] onto [min_value, max_value] and clamp.
// - The original position is captured on the first mutation so reset can
//   rewind it; variables that were never moved have nothing to restore.

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, DefinitionResult};

/// Number of discrete steps the value range is divided into when neither
/// `step` nor `n_steps` is given.
pub const DEFAULT_N_STEPS: u32 = 10;

const ENTITY: &str = "VariableLocation";

/// Declarative form of a variable location as it appears in a config file.
///
/// Only `current_position` is required; bounds default to the current
/// position (no variability) and `step` is derived from `n_steps`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableLocationSpec {
    pub current_position: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub n_steps: Option<u32>,
    pub step: Option<f64>,
}

impl VariableLocationSpec {
    /// Spec for a variable at `current` that may move within `[min, max]`.
    pub fn bounded(current: f64, min: f64, max: f64) -> Self {
        Self {
            current_position: Some(current),
            min_value: Some(min),
            max_value: Some(max),
            ..Self::default()
        }
    }
}

/// A control-point coordinate or weight as written in a config: either a
/// bare number (fixed, never an action) or a full variable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Fixed(f64),
    Variable(VariableLocationSpec),
}

impl ControlValue {
    /// Resolve into a runtime variable.
    pub fn resolve(&self) -> DefinitionResult<VariableLocation> {
        match self {
            ControlValue::Fixed(value) => VariableLocation::fixed(*value),
            ControlValue::Variable(spec) => VariableLocation::from_spec(spec),
        }
    }
}

impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        ControlValue::Fixed(value)
    }
}

impl From<VariableLocationSpec> for ControlValue {
    fn from(spec: VariableLocationSpec) -> Self {
        ControlValue::Variable(spec)
    }
}

/// Runtime variable location.
///
/// Invariant: `min_value <= current_position <= max_value` holds after
/// construction and after every action.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLocation {
    current_position: f64,
    min_value: f64,
    max_value: f64,
    n_steps: u32,
    step: f64,
    /// Unset until the first `is_action` query.
    is_action: OnceCell<bool>,
    /// Unset until the first mutation.
    original_position: Option<f64>,
}

impl VariableLocation {
    /// A fixed coordinate: `min == max == value`, never an action.
    pub fn fixed(value: f64) -> DefinitionResult<Self> {
        Self::from_spec(&VariableLocationSpec {
            current_position: Some(value),
            ..VariableLocationSpec::default()
        })
    }

    /// A coordinate at `current` that may move within `[min, max]` using the
    /// default step count.
    pub fn with_bounds(current: f64, min: f64, max: f64) -> DefinitionResult<Self> {
        Self::from_spec(&VariableLocationSpec::bounded(current, min, max))
    }

    /// Resolve a declarative spec.
    ///
    /// Fields are resolved in order (position, min, max, n_steps, step) and
    /// each stage only reads stages resolved before it.
    pub fn from_spec(spec: &VariableLocationSpec) -> DefinitionResult<Self> {
        let current_position = match spec.current_position {
            Some(value) => finite("current_position", value)?,
            None => {
                let field = if spec.min_value.is_none() {
                    "min_value"
                } else if spec.max_value.is_none() {
                    "max_value"
                } else {
                    return Err(DefinitionError::InvalidValue {
                        entity: ENTITY,
                        field: "current_position",
                        message: "current_position is required".to_string(),
                    });
                };
                return Err(DefinitionError::MissingPrerequisite {
                    entity: ENTITY,
                    field,
                    requires: "current_position",
                });
            }
        };

        let min_value = finite("min_value", spec.min_value.unwrap_or(current_position))?;
        let max_value = finite("max_value", spec.max_value.unwrap_or(current_position))?;
        if max_value < min_value {
            return Err(DefinitionError::BoundsInversion {
                entity: ENTITY,
                field: "max_value",
                min: min_value,
                max: max_value,
            });
        }
        if current_position < min_value || current_position > max_value {
            return Err(DefinitionError::OutOfBounds {
                entity: ENTITY,
                value: current_position,
                min: min_value,
                max: max_value,
            });
        }

        let n_steps = spec.n_steps.unwrap_or(DEFAULT_N_STEPS);
        if n_steps == 0 {
            return Err(DefinitionError::InvalidValue {
                entity: ENTITY,
                field: "n_steps",
                message: "n_steps must be at least 1".to_string(),
            });
        }

        // An explicit step wins over n_steps.
        let step = match spec.step {
            Some(step) => {
                let step = finite("step", step)?;
                if step < 0.0 {
                    return Err(DefinitionError::InvalidValue {
                        entity: ENTITY,
                        field: "step",
                        message: format!("step must be non-negative, got {step}"),
                    });
                }
                step
            }
            None => (max_value - min_value) / n_steps as f64,
        };

        Ok(Self {
            current_position,
            min_value,
            max_value,
            n_steps,
            step,
            is_action: OnceCell::new(),
            original_position: None,
        })
    }

    pub fn current_position(&self) -> f64 {
        self.current_position
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn n_steps(&self) -> u32 {
        self.n_steps
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// The position the variable was constructed with.
    pub fn original_position(&self) -> f64 {
        self.original_position.unwrap_or(self.current_position)
    }

    /// Whether the variable has room to move.
    ///
    /// Computed on first call and cached for the lifetime of the variable,
    /// so the action mapping of an environment stays stable while the
    /// position moves.
    pub fn is_action(&self) -> bool {
        *self.is_action.get_or_init(|| {
            self.max_value > self.current_position || self.min_value < self.current_position
        })
    }

    /// True once the variable has been moved away from its original position.
    pub fn is_changed(&self) -> bool {
        self.original_position
            .is_some_and(|original| original != self.current_position)
    }

    /// Move one step up (`increasing`) or down, clamped to the bounds.
    ///
    /// Returns the new position.
    pub fn apply_discrete_action(&mut self, increasing: bool) -> f64 {
        self.snapshot();
        let step = if increasing { self.step } else { -self.step };
        self.current_position = (self.current_position + step).clamp(self.min_value, self.max_value);
        self.current_position
    }

    /// Set the position from a normalised value in [-1, 1].
    ///
    /// Values outside [-1, 1] are not rejected; they are rescaled and then
    /// clamped. NaN leaves the position untouched.
    pub fn apply_continuous_action(&mut self, value: f64) -> f64 {
        self.snapshot();
        if value.is_nan() {
            return self.current_position;
        }
        let delta = self.max_value - self.min_value;
        let descaled = ((value + 1.0) / 2.0) * delta;
        self.current_position = (self.min_value + descaled).clamp(self.min_value, self.max_value);
        self.current_position
    }

    /// Restore the original position. No-op if never mutated.
    pub fn reset(&mut self) {
        if let Some(original) = self.original_position {
            self.current_position = original;
        }
    }

    fn snapshot(&mut self) {
        if self.original_position.is_none() {
            self.original_position = Some(self.current_position);
        }
    }
}

fn finite(field: &'static str, value: f64) -> DefinitionResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DefinitionError::InvalidValue {
            entity: ENTITY,
            field,
            message: format!("{field} must be finite, got {value}"),
        })
    }
}
