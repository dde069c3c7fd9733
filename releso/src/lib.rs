//! ReLeSO core library: parametric action spaces for shape optimisation.
//!
//! A reinforcement-learning agent deforms a parametric geometry (B-spline,
//! NURBS or a plain control-point cube) by moving a subset of its
//! control-point coordinates, and for NURBS its weights, within bounds.
//! The binary (`src/main.rs`) is a thin harness around these components.
//!
//! # Layers
//!
//! - **Variables** (`variable`): bounded, resettable scalars with discrete
//!   and continuous action semantics.
//! - **Axes** (`space_dimension`): per-axis point count, degree and knot
//!   vector, with open uniform knot synthesis.
//! - **Shapes** (`spline`, `cube`, `shape`): construction pipeline from a
//!   declarative spec into a validated grid of variables, behind the
//!   `ShapeParameterization` trait.
//! - **Evaluation** (`spline::geometry`): B-spline / NURBS point evaluation
//!   of the current shape.
//!
//! # RL facade
//!
//! The `rl` module exposes what a Gym-style environment consumes:
//!
//! - **Geometry**: action/observation space descriptors, action dispatch,
//!   seeded random actions and resets
//! - **VecGeometry**: independent copies for parallel rollouts
//! - **Action encoding**: the `2k` discrete index convention
//!
//! Configs are loaded with `config`; snapshots are persisted with `export`.

pub mod config;
pub mod cube;
pub mod error;
pub mod export;
pub mod rl;
pub mod shape;
pub mod space_dimension;
pub mod spline;
pub mod variable;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::GeometryConfig;
pub use cube::{CubeDefinition, CubeSpec};
pub use error::{ConfigError, DefinitionError, DefinitionResult, GeometryError};
pub use export::{write_snapshot_json, GeometrySnapshot, SnapshotWriter};
pub use rl::{
    ActionSpaceSpec, DiscreteAction, Geometry, GeometryAction, GeometryOptions,
    ObservationSpaceSpec, VecGeometry, ACTION_SPACE_VERSION,
};
pub use shape::{ActionTarget, ShapeDefinition, ShapeParameterization, ShapeSpec};
pub use space_dimension::{SplineSpaceDimension, SplineSpaceDimensionSpec};
pub use spline::geometry::{BSplineGeometry, NurbsGeometry, SplineGeometry};
pub use spline::{SplineDefinition, SplineKind, SplineSpec};
pub use variable::{ControlValue, VariableLocation, VariableLocationSpec, DEFAULT_N_STEPS};
