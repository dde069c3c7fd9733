// src/rl/action_encoding.rs
//
// Action-index convention shared by shape definitions and the geometry
// facade.
//
// With k action-eligible variables collected in stable order:
// - Discrete: 2k actions. Index i moves variable i / 2, up when i is even
//   and down when i is odd.
// - Continuous: a vector of length k in [-1, 1], applied positionally.
//
// Space descriptors are serde types so they can be logged or handed to a
// Python Gym wrapper unchanged.

use serde::{Deserialize, Serialize};

/// Current action-space descriptor version.
/// Increment when changing the index convention.
pub const ACTION_SPACE_VERSION: u32 = 1;

/// Lower bound of every continuous action component.
pub const CONTINUOUS_LOW: f64 = -1.0;
/// Upper bound of every continuous action component.
pub const CONTINUOUS_HIGH: f64 = 1.0;

/// A decoded discrete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteAction {
    /// Position of the variable in the stable action order.
    pub variable: usize,
    /// Step up (`true`) or down (`false`).
    pub increasing: bool,
}

/// Size of the discrete action space for `k` action variables.
#[inline]
pub fn discrete_action_count(k: usize) -> usize {
    2 * k
}

/// Decode discrete index `index` for `k` action variables.
///
/// Returns `None` when the index is outside `0..2k`.
pub fn decode_discrete_action(index: usize, k: usize) -> Option<DiscreteAction> {
    if index >= discrete_action_count(k) {
        return None;
    }
    Some(DiscreteAction {
        variable: index / 2,
        increasing: index % 2 == 0,
    })
}

/// Inverse of `decode_discrete_action`.
#[inline]
pub fn encode_discrete_action(variable: usize, increasing: bool) -> usize {
    2 * variable + usize::from(!increasing)
}

/// Gym-style action space descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpaceSpec {
    Discrete {
        n: usize,
    },
    Box {
        low: f64,
        high: f64,
        shape: Vec<usize>,
    },
}

impl ActionSpaceSpec {
    /// `Discrete(2k)`.
    pub fn discrete(k: usize) -> Self {
        ActionSpaceSpec::Discrete {
            n: discrete_action_count(k),
        }
    }

    /// `Box([-1, 1], shape = [k])`.
    pub fn continuous(k: usize) -> Self {
        ActionSpaceSpec::Box {
            low: CONTINUOUS_LOW,
            high: CONTINUOUS_HIGH,
            shape: vec![k],
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, ActionSpaceSpec::Discrete { .. })
    }

    /// Number of discrete actions, or the length of a continuous action.
    pub fn size(&self) -> usize {
        match self {
            ActionSpaceSpec::Discrete { n } => *n,
            ActionSpaceSpec::Box { shape, .. } => shape.iter().product(),
        }
    }
}

/// Observation space descriptor: a named box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSpaceSpec {
    pub name: String,
    pub low: f64,
    pub high: f64,
    pub shape: Vec<usize>,
}
