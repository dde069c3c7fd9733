// src/rl/mod.rs
//
// RL-facing surface of the shape definitions.
//
// Key components:
// - ActionEncoding: discrete index convention and Gym-style space descriptors
// - Geometry: facade wrapping one shape definition (actions, observation, reset)
// - VecGeometry: independent copies for parallel rollouts

pub mod action_encoding;
pub mod geometry;

// Re-exports for convenience
pub use action_encoding::{
    decode_discrete_action, discrete_action_count, encode_discrete_action, ActionSpaceSpec,
    DiscreteAction, ObservationSpaceSpec, ACTION_SPACE_VERSION,
};
pub use geometry::{Geometry, GeometryAction, GeometryOptions, VecGeometry, OBSERVATION_NAME};
