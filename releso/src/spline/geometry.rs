// src/spline/geometry.rs
//
// Geometry handles produced by shape definitions.
//
// A handle is a snapshot of the current shape (degrees, knots, control
// points, weights) that can be passed to a deformation or export
// collaborator. B-spline and NURBS handles can also be evaluated at a
// parametric location:
// - knot span by binary search,
// - Cox-de Boor basis functions per axis,
// - tensor-product sum with the first parametric axis varying fastest in
//   the flattened control-point index.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Geometry produced by `ShapeParameterization::spline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplineGeometry {
    #[serde(rename = "b_spline")]
    BSpline(BSplineGeometry),
    Nurbs(NurbsGeometry),
    /// Cube definitions fit no spline; the control points are the geometry.
    ControlPoints { control_points: Vec<Vec<f64>> },
}

impl SplineGeometry {
    pub fn control_points(&self) -> &[Vec<f64>] {
        match self {
            SplineGeometry::BSpline(b) => &b.control_points,
            SplineGeometry::Nurbs(n) => &n.bspline.control_points,
            SplineGeometry::ControlPoints { control_points } => control_points,
        }
    }

    /// Weights of a NURBS; `None` for the other variants.
    pub fn weights(&self) -> Option<&[f64]> {
        match self {
            SplineGeometry::Nurbs(n) => Some(&n.weights),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SplineGeometry::BSpline(_) => "b_spline",
            SplineGeometry::Nurbs(_) => "nurbs",
            SplineGeometry::ControlPoints { .. } => "control_points",
        }
    }

    pub fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, GeometryError> {
        match self {
            SplineGeometry::BSpline(b) => b.evaluate(parameters),
            SplineGeometry::Nurbs(n) => n.evaluate(parameters),
            SplineGeometry::ControlPoints { .. } => Err(GeometryError::NotEvaluable),
        }
    }
}

/// Tensor-product B-spline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineGeometry {
    degrees: Vec<usize>,
    knot_vectors: Vec<Vec<f64>>,
    points_per_axis: Vec<usize>,
    control_points: Vec<Vec<f64>>,
}

impl BSplineGeometry {
    pub(crate) fn new(
        degrees: Vec<usize>,
        knot_vectors: Vec<Vec<f64>>,
        points_per_axis: Vec<usize>,
        control_points: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            degrees,
            knot_vectors,
            points_per_axis,
            control_points,
        }
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    pub fn knot_vectors(&self) -> &[Vec<f64>] {
        &self.knot_vectors
    }

    pub fn control_points(&self) -> &[Vec<f64>] {
        &self.control_points
    }

    pub fn parametric_dimension(&self) -> usize {
        self.degrees.len()
    }

    pub fn control_point_count(&self) -> usize {
        self.control_points.len()
    }

    /// Parametric domain `[knots[p], knots[n]]` of every axis.
    pub fn domain(&self) -> Vec<(f64, f64)> {
        self.degrees
            .iter()
            .zip(&self.knot_vectors)
            .zip(&self.points_per_axis)
            .map(|((&p, knots), &n)| match (knots.get(p), knots.get(n)) {
                (Some(&start), Some(&end)) => (start, end),
                _ => (f64::NAN, f64::NAN),
            })
            .collect()
    }

    pub fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, GeometryError> {
        self.evaluate_weighted(parameters, None)
    }

    fn evaluate_weighted(
        &self,
        parameters: &[f64],
        weights: Option<&[f64]>,
    ) -> Result<Vec<f64>, GeometryError> {
        let dim = self.parametric_dimension();
        if parameters.len() != dim {
            return Err(GeometryError::ParameterCount {
                expected: dim,
                found: parameters.len(),
            });
        }

        // (first contributing control point index, basis values) per axis
        let mut local = Vec::with_capacity(dim);
        for (axis, &u) in parameters.iter().enumerate() {
            let p = self.degrees[axis];
            let n = self.points_per_axis[axis];
            let knots = &self.knot_vectors[axis];
            if n <= p {
                return Err(GeometryError::DegreeTooHigh {
                    axis,
                    degree: p,
                    points: n,
                });
            }
            let expected = n + p + 1;
            if knots.len() != expected {
                return Err(GeometryError::KnotVector {
                    axis,
                    expected,
                    found: knots.len(),
                });
            }
            let (start, end) = (knots[p], knots[n]);
            if !(start..=end).contains(&u) {
                return Err(GeometryError::ParameterOutOfDomain {
                    axis,
                    value: u,
                    start,
                    end,
                });
            }
            let span = find_span(n, p, u, knots);
            local.push((span - p, basis_functions(span, u, p, knots)));
        }

        let width = self.control_points.first().map_or(0, Vec::len);
        let mut point = vec![0.0; width];
        let mut denominator = 0.0;

        // Odometer over the (p_k + 1) local basis functions of every axis.
        let mut offsets = vec![0usize; dim];
        loop {
            let mut basis = 1.0;
            let mut flat = 0;
            let mut stride = 1;
            for axis in 0..dim {
                let (first, values) = &local[axis];
                let first = *first;
                basis *= values[offsets[axis]];
                flat += (first + offsets[axis]) * stride;
                stride *= self.points_per_axis[axis];
            }
            let weight = weights.map_or(1.0, |w| w[flat]);
            let factor = basis * weight;
            for (acc, coord) in point.iter_mut().zip(&self.control_points[flat]) {
                *acc += factor * coord;
            }
            denominator += factor;

            let mut axis = 0;
            loop {
                if axis == dim {
                    if weights.is_some() {
                        if denominator == 0.0 {
                            return Err(GeometryError::ZeroWeightSum {
                                parameters: parameters.to_vec(),
                            });
                        }
                        point.iter_mut().for_each(|c| *c /= denominator);
                    }
                    return Ok(point);
                }
                offsets[axis] += 1;
                if offsets[axis] <= self.degrees[axis] {
                    break;
                }
                offsets[axis] = 0;
                axis += 1;
            }
        }
    }
}

/// Tensor-product NURBS: a B-spline plus one weight per control point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurbsGeometry {
    #[serde(flatten)]
    bspline: BSplineGeometry,
    weights: Vec<f64>,
}

impl NurbsGeometry {
    pub(crate) fn new(bspline: BSplineGeometry, weights: Vec<f64>) -> Self {
        Self { bspline, weights }
    }

    pub fn bspline(&self) -> &BSplineGeometry {
        &self.bspline
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, GeometryError> {
        self.bspline.evaluate_weighted(parameters, Some(&self.weights))
    }
}

/// Index of the knot span containing `u` for `n` control points of
/// degree `p`. The end of the domain maps to the last non-empty span.
fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n] {
        // Step back over repeated end knots.
        let mut span = n - 1;
        while span > p && knots[span] >= knots[n] {
            span -= 1;
        }
        return span;
    }
    if u <= knots[p] {
        let mut span = p;
        while span + 1 < n && knots[span + 1] <= u {
            span += 1;
        }
        return span;
    }

    let mut low = p;
    let mut high = n;
    while low < high {
        let mid = (low + high) / 2;
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    low - 1
}

/// The `p + 1` non-vanishing basis functions on `span` at `u`.
fn basis_functions(span: usize, u: f64, p: usize, knots: &[f64]) -> Vec<f64> {
    let mut values = vec![0.0; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];
    values[0] = 1.0;

    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom == 0.0 { 0.0 } else { values[r] / denom };
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }
    values
}
