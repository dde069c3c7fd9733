// src/rl/geometry.rs
//
// Geometry facade consumed by the RL environment.
//
// - Geometry: wraps one shape definition and exposes a stable action space,
//   an action-based observation and reset semantics
// - VecGeometry: N independent copies for parallel rollouts
// - Deterministic random actions and random resets given seeds
//
// The action mapping is collected once at construction. Because
// `VariableLocation::is_action` is cached on first query, the mapping never
// changes while variables move.

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::shape::{
    apply_continuous_to, apply_discrete_to, ActionTarget, ShapeDefinition, ShapeParameterization,
};
use crate::spline::geometry::SplineGeometry;

use super::action_encoding::{
    ActionSpaceSpec, ObservationSpaceSpec, CONTINUOUS_HIGH, CONTINUOUS_LOW,
};

/// Name of the observation produced by an action-based geometry.
pub const OBSERVATION_NAME: &str = "geometry_observation";

/// An action as received from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryAction {
    Discrete(usize),
    Continuous(Vec<f64>),
}

impl GeometryAction {
    fn mode(&self) -> &'static str {
        match self {
            GeometryAction::Discrete(_) => "discrete",
            GeometryAction::Continuous(_) => "continuous",
        }
    }
}

/// Behaviour switches of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryOptions {
    /// Discrete (`2k`) instead of continuous (`k`) actions.
    pub discrete_actions: bool,
    /// Expose the action variables' positions as an observation.
    pub action_based_observation: bool,
    /// Apply random continuous values to all action variables on reset.
    pub reset_with_random_action_values: bool,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            discrete_actions: true,
            action_based_observation: true,
            reset_with_random_action_values: false,
        }
    }
}

/// Parametric geometry driven by an RL agent.
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Shape being deformed.
    shape_definition: ShapeDefinition,
    options: GeometryOptions,
    /// Stable action mapping.
    actions: Vec<ActionTarget>,
    /// Random number generator for random resets.
    rng: ChaCha8Rng,
    /// Seed of the last reset.
    seed: u64,
    /// Identifier set by `setup`, used in logs.
    id: Option<String>,
}

impl Geometry {
    pub fn new(shape_definition: ShapeDefinition, options: GeometryOptions) -> Self {
        Self::with_seed(shape_definition, options, 0)
    }

    pub fn with_seed(shape_definition: ShapeDefinition, options: GeometryOptions, seed: u64) -> Self {
        let actions = shape_definition.action_targets();
        Self {
            shape_definition,
            options,
            actions,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            id: None,
        }
    }

    /// Attach an environment identifier and log the action mapping.
    pub fn setup(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.actions = self.shape_definition.action_targets();
        info!(
            "Geometry {id}: {} shape with {} action variables ({} actions).",
            self.shape_definition.kind(),
            self.actions.len(),
            if self.options.discrete_actions {
                "discrete"
            } else {
                "continuous"
            }
        );
        self.id = Some(id);
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn options(&self) -> GeometryOptions {
        self.options
    }

    pub fn shape_definition(&self) -> &ShapeDefinition {
        &self.shape_definition
    }

    pub fn action_targets(&self) -> &[ActionTarget] {
        &self.actions
    }

    /// Number of action variables `k`.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn action_space(&self) -> ActionSpaceSpec {
        if self.options.discrete_actions {
            ActionSpaceSpec::discrete(self.actions.len())
        } else {
            ActionSpaceSpec::continuous(self.actions.len())
        }
    }

    /// Observation descriptor; `None` when observations are not action based.
    pub fn observation_space(&self) -> Option<ObservationSpaceSpec> {
        if !self.options.action_based_observation {
            warn!("Observation space is accessed which should not happen.");
            return None;
        }
        Some(ObservationSpaceSpec {
            name: OBSERVATION_NAME.to_string(),
            low: 0.0,
            high: 1.0,
            shape: vec![self.actions.len()],
        })
    }

    /// Current positions of the action variables, in action order.
    pub fn observation(&self) -> Option<Vec<f64>> {
        if !self.options.action_based_observation {
            return None;
        }
        Some(
            self.actions
                .iter()
                .filter_map(|t| self.shape_definition.variable(*t))
                .map(|v| v.current_position())
                .collect(),
        )
    }

    /// Apply one agent action. Nothing is mutated when an error is returned.
    pub fn apply_action(&mut self, action: &GeometryAction) -> Result<(), GeometryError> {
        let expected = if self.options.discrete_actions {
            "discrete"
        } else {
            "continuous"
        };
        if action.mode() != expected {
            return Err(GeometryError::WrongActionMode {
                expected,
                received: action.mode(),
            });
        }

        match action {
            GeometryAction::Discrete(index) => {
                let value = apply_discrete_to(&mut self.shape_definition, &self.actions, *index)?;
                debug!("Discrete action {index} moved a variable to {value}.");
                Ok(())
            }
            GeometryAction::Continuous(values) => {
                apply_continuous_to(&mut self.shape_definition, &self.actions, values)
            }
        }
    }

    /// Current control points, as handed to a deformation step.
    pub fn apply(&self) -> Vec<Vec<f64>> {
        self.control_points()
    }

    /// Apply a uniform random vector in [-1, 1] to all action variables.
    ///
    /// Positions are set absolutely, so the same seed always yields the
    /// same shape regardless of the action mode.
    pub fn apply_random_action(&mut self, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.apply_random_values(&mut rng);
        self.apply()
    }

    fn apply_random_values(&mut self, rng: &mut ChaCha8Rng) {
        let values: Vec<f64> = (0..self.actions.len())
            .map(|_| rng.gen_range(CONTINUOUS_LOW..=CONTINUOUS_HIGH))
            .collect();
        // One value per cached target, so the lengths always agree.
        let _ = apply_continuous_to(&mut self.shape_definition, &self.actions, &values);
    }

    /// Whether any variable has moved away from its original position.
    pub fn is_geometry_changed(&self) -> bool {
        self.shape_definition.is_changed()
    }

    /// Restore the original shape and return its control points.
    ///
    /// With `reset_with_random_action_values` the shape is then moved to a
    /// random point of the action space drawn from `seed` (or from the
    /// internal generator when no seed is given).
    pub fn reset(&mut self, seed: Option<u64>) -> Vec<Vec<f64>> {
        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);

        self.shape_definition.reset();
        if self.options.reset_with_random_action_values {
            let mut rng = self.rng.clone();
            self.apply_random_values(&mut rng);
            self.rng = rng;
            debug!("Geometry reset with random action values (seed {seed}).");
        }
        self.control_points()
    }

    pub fn control_points(&self) -> Vec<Vec<f64>> {
        self.shape_definition.control_points()
    }

    pub fn spline(&self) -> SplineGeometry {
        self.shape_definition.spline()
    }
}

/// Vectorised geometry.
///
/// Manages N independent Geometry instances.
#[derive(Debug, Clone)]
pub struct VecGeometry {
    geometries: Vec<Geometry>,
}

impl VecGeometry {
    /// Create N deep copies of `geometry`.
    pub fn new(n: usize, geometry: &Geometry) -> Self {
        Self {
            geometries: vec![geometry.clone(); n],
        }
    }

    pub fn num_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    /// Reset all geometries with optional per-geometry seeds.
    ///
    /// Geometries without a seed draw one from their own generator.
    pub fn reset_all(&mut self, seeds: Option<&[u64]>) -> Vec<Vec<Vec<f64>>> {
        self.geometries
            .iter_mut()
            .enumerate()
            .map(|(i, geometry)| {
                let seed = seeds.and_then(|s| s.get(i).copied());
                geometry.reset(seed)
            })
            .collect()
    }

    /// Apply one action per geometry.
    ///
    /// Actions must have the same length as the geometries.
    pub fn apply_all(&mut self, actions: &[GeometryAction]) -> Vec<Result<(), GeometryError>> {
        assert_eq!(
            actions.len(),
            self.geometries.len(),
            "Actions length must match number of geometries"
        );
        self.geometries
            .iter_mut()
            .zip(actions)
            .map(|(geometry, action)| geometry.apply_action(action))
            .collect()
    }

    pub fn control_points_all(&self) -> Vec<Vec<Vec<f64>>> {
        self.geometries.iter().map(Geometry::control_points).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{CubeDefinition, CubeSpec};
    use crate::variable::{ControlValue, VariableLocationSpec};

    fn two_variable_cube() -> ShapeDefinition {
        CubeDefinition::from_spec(&CubeSpec {
            control_points: vec![
                vec![
                    VariableLocationSpec::bounded(0.5, 0.0, 1.0).into(),
                    ControlValue::Fixed(0.1),
                ],
                vec![
                    ControlValue::Fixed(0.9),
                    VariableLocationSpec::bounded(0.5, 0.25, 0.75).into(),
                ],
            ],
        })
        .unwrap()
        .into()
    }

    #[test]
    fn test_default_options() {
        let options = GeometryOptions::default();
        assert!(options.discrete_actions);
        assert!(options.action_based_observation);
        assert!(!options.reset_with_random_action_values);
    }

    #[test]
    fn test_discrete_geometry_round_trip() {
        let mut geometry = Geometry::new(two_variable_cube(), GeometryOptions::default());
        geometry.setup("id");
        assert_eq!(geometry.id(), Some("id"));
        assert_eq!(geometry.action_count(), 2);
        assert_eq!(geometry.action_space(), ActionSpaceSpec::Discrete { n: 4 });

        let original = geometry.control_points();
        assert_eq!(geometry.apply(), original);
        assert!(!geometry.is_geometry_changed());

        // index 3: second variable, decreasing by 0.05
        geometry.apply_action(&GeometryAction::Discrete(3)).unwrap();
        assert!(geometry.is_geometry_changed());
        let obs = geometry.observation().unwrap();
        assert_eq!(obs[0], 0.5);
        assert!((obs[1] - 0.45).abs() < 1e-12);

        assert_eq!(geometry.reset(None), original);
        assert!(!geometry.is_geometry_changed());
    }

    #[test]
    fn test_wrong_actions_leave_shape_untouched() {
        let mut geometry = Geometry::new(two_variable_cube(), GeometryOptions::default());
        assert_eq!(
            geometry.apply_action(&GeometryAction::Continuous(vec![0.0, 0.0])),
            Err(GeometryError::WrongActionMode {
                expected: "discrete",
                received: "continuous"
            })
        );
        assert_eq!(
            geometry.apply_action(&GeometryAction::Discrete(4)),
            Err(GeometryError::ActionIndexOutOfRange { index: 4, size: 4 })
        );

        let mut continuous = Geometry::new(
            two_variable_cube(),
            GeometryOptions {
                discrete_actions: false,
                ..GeometryOptions::default()
            },
        );
        assert_eq!(
            continuous.apply_action(&GeometryAction::Continuous(vec![1.0])),
            Err(GeometryError::ActionLength {
                expected: 2,
                found: 1
            })
        );
        assert!(!geometry.is_geometry_changed());
        assert!(!continuous.is_geometry_changed());
    }

    #[test]
    fn test_observation_disabled() {
        let geometry = Geometry::new(
            two_variable_cube(),
            GeometryOptions {
                action_based_observation: false,
                ..GeometryOptions::default()
            },
        );
        assert!(geometry.observation_space().is_none());
        assert!(geometry.observation().is_none());
    }

    #[test]
    fn test_observation_space_shape() {
        let geometry = Geometry::new(two_variable_cube(), GeometryOptions::default());
        let space = geometry.observation_space().unwrap();
        assert_eq!(space.name, OBSERVATION_NAME);
        assert_eq!(space.shape, vec![2]);
        assert_eq!((space.low, space.high), (0.0, 1.0));
    }

    #[test]
    fn test_random_action_is_deterministic() {
        let mut geometry = Geometry::new(two_variable_cube(), GeometryOptions::default());
        let first = geometry.apply_random_action(7);
        let second = geometry.apply_random_action(7);
        assert_eq!(first, second);
        assert!(geometry.is_geometry_changed());
        // Fixed coordinates never move.
        assert_eq!(first[0][1], 0.1);
        assert_eq!(first[1][0], 0.9);
    }

    #[test]
    fn test_random_reset() {
        let mut geometry = Geometry::new(
            two_variable_cube(),
            GeometryOptions {
                reset_with_random_action_values: true,
                ..GeometryOptions::default()
            },
        );
        let original = geometry.control_points();
        let a = geometry.reset(Some(42));
        assert_ne!(a, original);
        assert_eq!(geometry.seed(), 42);

        let b = geometry.reset(Some(42));
        assert_eq!(a, b);
        let c = geometry.reset(Some(43));
        assert_ne!(a, c);
    }

    #[test]
    fn test_vec_geometry_copies_are_independent() {
        let geometry = Geometry::new(two_variable_cube(), GeometryOptions::default());
        let mut vec_geometry = VecGeometry::new(3, &geometry);
        assert_eq!(vec_geometry.num_geometries(), 3);

        let results = vec_geometry.apply_all(&[
            GeometryAction::Discrete(0),
            GeometryAction::Discrete(1),
            GeometryAction::Discrete(9),
        ]);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());

        let cps = vec_geometry.control_points_all();
        assert!((cps[0][0][0] - 0.6).abs() < 1e-12);
        assert!((cps[1][0][0] - 0.4).abs() < 1e-12);
        assert_eq!(cps[2], geometry.control_points());

        let reset = vec_geometry.reset_all(Some(&[1, 2, 3]));
        assert!(reset.iter().all(|cp| *cp == geometry.control_points()));
        assert_eq!(
            vec_geometry.geometries().iter().map(Geometry::seed).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_facade_and_definition_dispatch_agree() {
        let mut geometry = Geometry::new(two_variable_cube(), GeometryOptions::default());
        let mut shape = two_variable_cube();
        for index in [0, 3, 3, 1, 2] {
            geometry.apply_action(&GeometryAction::Discrete(index)).unwrap();
            shape.apply_discrete_action(index).unwrap();
            assert_eq!(geometry.control_points(), shape.control_points());
        }
        assert_eq!(
            shape.apply_discrete_action(4),
            Err(GeometryError::ActionIndexOutOfRange { index: 4, size: 4 })
        );

        let mut continuous = Geometry::new(
            two_variable_cube(),
            GeometryOptions {
                discrete_actions: false,
                ..GeometryOptions::default()
            },
        );
        let mut shape = two_variable_cube();
        let values = [0.25, -2.0];
        continuous
            .apply_action(&GeometryAction::Continuous(values.to_vec()))
            .unwrap();
        shape.apply_continuous_action(&values).unwrap();
        assert_eq!(continuous.control_points(), shape.control_points());
    }
}
