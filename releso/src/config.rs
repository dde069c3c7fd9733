// src/config.rs
//
// Declarative geometry configuration.
//
// A config document names the shape (tagged by `type`) and the facade
// switches. Example:
//
//   shape_definition:
//     type: b_spline
//     space_dimensions:
//       - { name: x, number_of_points: 3, degree: 2 }
//       - { name: y, number_of_points: 2, degree: 1 }
//   discrete_actions: false
//   seed: 42
//
// Loading only parses; `build` runs the construction pipeline.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rl::geometry::{Geometry, GeometryOptions};
use crate::shape::{ShapeDefinition, ShapeSpec};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryConfig {
    pub shape_definition: ShapeSpec,
    #[serde(default = "default_true")]
    pub discrete_actions: bool,
    #[serde(default = "default_true")]
    pub action_based_observation: bool,
    #[serde(default)]
    pub reset_with_random_action_values: bool,
    /// Seed of the geometry's random generator.
    #[serde(default)]
    pub seed: u64,
}

impl GeometryConfig {
    /// Config with default facade switches.
    pub fn new(shape_definition: ShapeSpec) -> Self {
        let options = GeometryOptions::default();
        Self {
            shape_definition,
            discrete_actions: options.discrete_actions,
            action_based_observation: options.action_based_observation,
            reset_with_random_action_values: options.reset_with_random_action_values,
            seed: 0,
        }
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as
    /// YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        debug!(
            "Loading geometry config from {} as {}.",
            path.display(),
            if is_json { "JSON" } else { "YAML" }
        );
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn options(&self) -> GeometryOptions {
        GeometryOptions {
            discrete_actions: self.discrete_actions,
            action_based_observation: self.action_based_observation,
            reset_with_random_action_values: self.reset_with_random_action_values,
        }
    }

    pub fn build_shape(&self) -> Result<ShapeDefinition, ConfigError> {
        Ok(self.shape_definition.build()?)
    }

    /// Build the shape and wrap it in a geometry facade.
    pub fn build(&self) -> Result<Geometry, ConfigError> {
        let shape = self.build_shape()?;
        Ok(Geometry::with_seed(shape, self.options(), self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DefinitionError;
    use crate::rl::action_encoding::ActionSpaceSpec;

    #[test]
    fn test_parse_bspline_with_defaults() {
        let yaml = r#"
shape_definition:
  type: b_spline
  space_dimensions:
    - name: x
      number_of_points: 3
      degree: 2
    - name: y
      number_of_points: 2
      degree: 1
"#;
        let config = GeometryConfig::from_yaml_str(yaml).unwrap();
        assert!(config.discrete_actions);
        assert!(config.action_based_observation);
        assert!(!config.reset_with_random_action_values);
        assert_eq!(config.seed, 0);

        let geometry = config.build().unwrap();
        assert_eq!(geometry.shape_definition().kind(), "b_spline");
        assert_eq!(geometry.action_space(), ActionSpaceSpec::Discrete { n: 24 });
    }

    #[test]
    fn test_parse_nurbs_with_variable_weights() {
        let yaml = r#"
shape_definition:
  type: nurbs
  space_dimensions:
    - { name: x, number_of_points: 2, degree: 1 }
  control_point_variables:
    - [0.0]
    - { current_position: 1.0, min_value: 0.5, max_value: 1.0 }
  weights:
    - 1.0
    - { current_position: 1.0, min_value: 0.5, max_value: 2.0, n_steps: 4 }
discrete_actions: false
seed: 9
"#;
        let config = GeometryConfig::from_yaml_str(yaml);
        // A control point must be a list of coordinates.
        assert!(matches!(config, Err(ConfigError::Parse(_))));

        let fixed = yaml.replace(
            "- { current_position: 1.0, min_value: 0.5, max_value: 1.0 }",
            "- [{ current_position: 1.0, min_value: 0.5, max_value: 1.0 }]",
        );
        let config = GeometryConfig::from_yaml_str(&fixed).unwrap();
        let geometry = config.build().unwrap();
        assert_eq!(geometry.seed(), 9);
        assert_eq!(geometry.action_space(), ActionSpaceSpec::continuous(2));
    }

    #[test]
    fn test_json_and_unknown_fields() {
        let json = r#"{
            "shape_definition": {"type": "cube", "control_points": [[0.2, 0.3]]},
            "action_based_observation": false
        }"#;
        let config = GeometryConfig::from_json_str(json).unwrap();
        assert!(!config.action_based_observation);
        assert!(config.build().unwrap().observation().is_none());

        let err = GeometryConfig::from_json_str(
            r#"{"shape_definition": {"type": "cube", "control_points": [[0.2]]}, "colour": 1}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_build_surfaces_definition_errors() {
        let yaml = r#"
shape_definition:
  type: nurbs
  space_dimensions:
    - { name: x, number_of_points: 3, degree: 2 }
  weights: [1.0, 1.0]
"#;
        let err = GeometryConfig::from_yaml_str(yaml).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Definition(DefinitionError::WeightCount {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("shape.json");
        fs::write(
            &json_path,
            r#"{"shape_definition": {"type": "cube", "control_points": [[0.5]]}}"#,
        )
        .unwrap();
        let yaml_path = dir.path().join("shape.yaml");
        fs::write(
            &yaml_path,
            "shape_definition:\n  type: cube\n  control_points: [[0.5]]\n",
        )
        .unwrap();

        assert_eq!(
            GeometryConfig::from_file(&json_path).unwrap(),
            GeometryConfig::from_file(&yaml_path).unwrap()
        );

        let err = GeometryConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.yaml"));
    }
}
