// releso_env/src/lib.rs
//
// Python bindings for the ReLeSO geometry facade.
//
// Provides what a Gym-style shape-optimisation environment needs:
// - Geometry: one parametric shape with reset(seed) and apply_action(action)
// - VecGeometry: independent copies for parallel rollouts
//
// Actions are plain Python values: an int for discrete geometries, a list
// of floats for continuous ones. All operations are deterministic given
// seeds.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use releso::{
    ActionSpaceSpec, Geometry as RustGeometry, GeometryAction, GeometryConfig,
    ObservationSpaceSpec, ShapeParameterization, VecGeometry as RustVecGeometry,
    ACTION_SPACE_VERSION,
};

fn to_py_err(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Convert an action space descriptor to a Python dictionary.
fn action_space_to_dict(py: Python<'_>, space: &ActionSpaceSpec) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    match space {
        ActionSpaceSpec::Discrete { n } => {
            dict.set_item("type", "discrete")?;
            dict.set_item("n", *n)?;
        }
        ActionSpaceSpec::Box { low, high, shape } => {
            dict.set_item("type", "box")?;
            dict.set_item("low", *low)?;
            dict.set_item("high", *high)?;
            dict.set_item("shape", shape.clone())?;
        }
    }
    Ok(dict.into())
}

fn observation_space_to_dict(py: Python<'_>, space: &ObservationSpaceSpec) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("name", &space.name)?;
    dict.set_item("low", space.low)?;
    dict.set_item("high", space.high)?;
    dict.set_item("shape", space.shape.clone())?;
    Ok(dict.into())
}

/// Parse a Python action: int -> discrete, sequence of floats -> continuous.
fn parse_action(action: &Bound<'_, PyAny>) -> PyResult<GeometryAction> {
    if let Ok(index) = action.extract::<usize>() {
        return Ok(GeometryAction::Discrete(index));
    }
    let values: Vec<f64> = action.extract().map_err(|_| {
        PyValueError::new_err("action must be an int (discrete) or a sequence of floats (continuous)")
    })?;
    Ok(GeometryAction::Continuous(values))
}

/// Parametric geometry driven by an agent.
#[pyclass]
pub struct Geometry {
    inner: RustGeometry,
}

#[pymethods]
impl Geometry {
    /// Build a geometry from a YAML config string.
    #[staticmethod]
    fn from_yaml(yaml: &str) -> PyResult<Self> {
        let config = GeometryConfig::from_yaml_str(yaml).map_err(to_py_err)?;
        let inner = config.build().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Build a geometry from a YAML or JSON config file.
    #[staticmethod]
    fn from_file(path: &str) -> PyResult<Self> {
        let config = GeometryConfig::from_file(path).map_err(to_py_err)?;
        let inner = config.build().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Attach an identifier used in log messages.
    fn setup(&mut self, id: &str) {
        self.inner.setup(id);
    }

    /// Reset to the original shape.
    ///
    /// Args:
    ///     seed: Optional seed for random resets
    ///
    /// Returns:
    ///     control points after the reset
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, seed: Option<u64>) -> Vec<Vec<f64>> {
        self.inner.reset(seed)
    }

    /// Apply one action (int for discrete, list of floats for continuous).
    fn apply_action<'py>(&mut self, action: &Bound<'py, PyAny>) -> PyResult<()> {
        let action = parse_action(action)?;
        self.inner.apply_action(&action).map_err(to_py_err)
    }

    /// Apply a seeded random continuous action; returns the control points.
    fn apply_random_action(&mut self, seed: u64) -> Vec<Vec<f64>> {
        self.inner.apply_random_action(seed)
    }

    fn control_points(&self) -> Vec<Vec<f64>> {
        self.inner.control_points()
    }

    /// Positions of the action variables, or None when observations are
    /// not action based.
    fn observation(&self) -> Option<Vec<f64>> {
        self.inner.observation()
    }

    fn action_space(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        action_space_to_dict(py, &self.inner.action_space())
    }

    fn observation_space(&self, py: Python<'_>) -> PyResult<Option<Py<PyDict>>> {
        self.inner
            .observation_space()
            .map(|space| observation_space_to_dict(py, &space))
            .transpose()
    }

    fn is_geometry_changed(&self) -> bool {
        self.inner.is_geometry_changed()
    }

    /// Number of action variables.
    #[getter]
    fn action_count(&self) -> usize {
        self.inner.action_count()
    }

    /// Shape kind: "b_spline", "nurbs" or "cube".
    #[getter]
    fn kind(&self) -> &'static str {
        self.inner.shape_definition().kind()
    }

    #[getter]
    fn number_of_points(&self) -> usize {
        self.inner.shape_definition().number_of_points()
    }

    /// Seed of the last reset.
    #[getter]
    fn seed(&self) -> u64 {
        self.inner.seed()
    }
}

/// Vectorised geometry for parallel rollouts.
///
/// Manages N independent Geometry instances.
#[pyclass]
pub struct VecGeometry {
    inner: RustVecGeometry,
}

#[pymethods]
impl VecGeometry {
    /// Create N copies of a geometry.
    #[new]
    fn new(n: usize, geometry: &Geometry) -> Self {
        Self {
            inner: RustVecGeometry::new(n, &geometry.inner),
        }
    }

    /// Reset all geometries with optional per-geometry seeds.
    #[pyo3(signature = (seeds=None))]
    fn reset_all(&mut self, seeds: Option<Vec<u64>>) -> Vec<Vec<Vec<f64>>> {
        self.inner.reset_all(seeds.as_deref())
    }

    /// Apply one action per geometry.
    fn apply_all<'py>(&mut self, actions: Vec<Bound<'py, PyAny>>) -> PyResult<()> {
        if actions.len() != self.inner.num_geometries() {
            return Err(PyValueError::new_err(format!(
                "actions length {} must match num_geometries {}",
                actions.len(),
                self.inner.num_geometries()
            )));
        }
        let actions = actions
            .iter()
            .map(parse_action)
            .collect::<PyResult<Vec<_>>>()?;
        for result in self.inner.apply_all(&actions) {
            result.map_err(to_py_err)?;
        }
        Ok(())
    }

    fn control_points_all(&self) -> Vec<Vec<Vec<f64>>> {
        self.inner.control_points_all()
    }

    #[getter]
    fn num_geometries(&self) -> usize {
        self.inner.num_geometries()
    }
}

/// Get the action-space descriptor version.
#[pyfunction]
fn action_space_version() -> u32 {
    ACTION_SPACE_VERSION
}

#[pymodule]
fn releso_env(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Geometry>()?;
    m.add_class::<VecGeometry>()?;
    m.add_function(wrap_pyfunction!(action_space_version, m)?)?;
    Ok(())
}
