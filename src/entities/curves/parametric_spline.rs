//! Parametric spline curve entity (type 112): piecewise per-coordinate
//! polynomials.
//!
//! Grounded on `SPEC_FULL.md` §4.5 "Parametric spline curve": `N`
//! segments, each a polynomial of degree `H` (1, 2, or 3) in each of
//! `X(t), Y(t), Z(t)` on its own breakpoint sub-interval. Breakpoints
//! are strictly increasing; validation enforces `H`-appropriate zero
//! coefficients (a linear segment's quadratic/cubic terms must vanish)
//! and, for the 2D flavor (`NDIM = 2`), that every Z-coefficient is
//! zero and `AZ` is constant across segments.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::directory_entry::DirectoryEntry;
use crate::entities::entity_base::{Entity, EntityBase, EntityKind};
use crate::entities::interfaces::{Curve, CurveDerivatives, ParameterRange};
use crate::entities::parameter_vector::{Parameter, ParameterVector};
use crate::error::{IgesError, Result, ValidationResult};
use crate::identity::ObjectID;

/// One segment's cubic coefficients for a single coordinate:
/// `A + B*dt + C*dt^2 + D*dt^3`, `dt = t - breakpoint`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AxisCoefficients {
    /// Constant term.
    pub a: f64,
    /// Linear term.
    pub b: f64,
    /// Quadratic term.
    pub c: f64,
    /// Cubic term.
    pub d: f64,
}

impl AxisCoefficients {
    fn eval(&self, dt: f64, order: usize) -> f64 {
        match order {
            0 => self.a + dt * (self.b + dt * (self.c + dt * self.d)),
            1 => self.b + dt * (2.0 * self.c + dt * 3.0 * self.d),
            2 => 2.0 * self.c + dt * 6.0 * self.d,
            3 => 6.0 * self.d,
            _ => 0.0,
        }
    }

    fn highest_nonzero_degree(&self) -> usize {
        if self.d != 0.0 {
            3
        } else if self.c != 0.0 {
            2
        } else if self.b != 0.0 {
            1
        } else {
            0
        }
    }
}

/// One breakpoint sub-interval's per-axis polynomial coefficients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplineSegment {
    /// Breakpoint `t` at which this segment starts.
    pub breakpoint: f64,
    /// X-coordinate polynomial.
    pub x: AxisCoefficients,
    /// Y-coordinate polynomial.
    pub y: AxisCoefficients,
    /// Z-coordinate polynomial.
    pub z: AxisCoefficients,
}

/// A piecewise polynomial curve defined segment-by-segment over
/// strictly increasing breakpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametricSplineCurve {
    base: EntityBase,
    spline_type: i32,
    degree: usize,
    dimensions: u8,
    segments: Vec<SplineSegment>,
    terminate: f64,
}

impl ParametricSplineCurve {
    /// Construct and validate. `segments` must be non-empty with
    /// strictly increasing breakpoints, and `terminate` must exceed the
    /// last breakpoint. Per-segment coefficients above `degree` must be
    /// zero, and when `dimensions == 2` every Z-coefficient across all
    /// segments must be zero and `AZ` constant.
    pub fn new(
        id: ObjectID,
        spline_type: i32,
        degree: usize,
        dimensions: u8,
        segments: Vec<SplineSegment>,
        terminate: f64,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(IgesError::DataFormatError(
                "parametric spline curve must have at least one segment".to_string(),
            ));
        }
        if !(1..=3).contains(&degree) {
            return Err(IgesError::DataFormatError(format!(
                "parametric spline degree must be 1, 2, or 3, got {degree}"
            )));
        }
        if segments.windows(2).any(|w| w[0].breakpoint >= w[1].breakpoint) {
            return Err(IgesError::DataFormatError(
                "spline breakpoints must be strictly increasing".to_string(),
            ));
        }
        if terminate <= segments.last().unwrap().breakpoint {
            return Err(IgesError::DataFormatError(
                "terminate parameter must exceed the last breakpoint".to_string(),
            ));
        }
        let curve = Self {
            base: {
                let mut de = DirectoryEntry::new(112);
                de.form_number = spline_type;
                EntityBase::new(id, EntityKind::ParametricSplineCurve, de)
            },
            spline_type,
            degree,
            dimensions,
            segments,
            terminate,
        };
        let messages = curve.coefficient_messages();
        if let Some(first) = messages.into_iter().next() {
            return Err(IgesError::DataFormatError(first));
        }
        Ok(curve)
    }

    fn coefficient_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (i, seg) in self.segments.iter().enumerate() {
            for (axis_name, axis) in [("X", &seg.x), ("Y", &seg.y), ("Z", &seg.z)] {
                if axis.highest_nonzero_degree() > self.degree {
                    messages.push(format!(
                        "segment {i} {axis_name}-polynomial has nonzero terms above degree {}",
                        self.degree
                    ));
                }
            }
        }
        if self.dimensions == 2 {
            let az0 = self.segments[0].z.a;
            for (i, seg) in self.segments.iter().enumerate() {
                if seg.z.a != 0.0 && seg.z.a != az0
                    || seg.z.b != 0.0
                    || seg.z.c != 0.0
                    || seg.z.d != 0.0
                {
                    messages.push(format!(
                        "segment {i}: NDIM=2 requires Z-column zero coefficients and a constant AZ"
                    ));
                }
            }
        }
        messages
    }

    /// Build from the raw main-parameter vector `{spline_type, H, NDIM,
    /// N, breakpoints(N+1), per-segment AX..DZ}`.
    pub fn from_parameters(id: ObjectID, params: &ParameterVector, form_number: i32) -> Result<Self> {
        let degree = params.integer(0)? as usize;
        let dimensions = params.integer(1)? as u8;
        let n = params.integer(2)? as usize;
        let mut cursor = 3;
        let mut breakpoints = Vec::with_capacity(n + 1);
        for _ in 0..=n {
            breakpoints.push(params.real(cursor)?);
            cursor += 1;
        }
        let mut segments = Vec::with_capacity(n);
        for i in 0..n {
            let mut axis = |name_offset: usize| -> Result<AxisCoefficients> {
                let _ = name_offset;
                let c = AxisCoefficients {
                    a: params.real(cursor)?,
                    b: params.real(cursor + 1)?,
                    c: params.real(cursor + 2)?,
                    d: params.real(cursor + 3)?,
                };
                cursor += 4;
                Ok(c)
            };
            let x = axis(0)?;
            let y = axis(0)?;
            let z = axis(0)?;
            segments.push(SplineSegment {
                breakpoint: breakpoints[i],
                x,
                y,
                z,
            });
        }
        let terminate = breakpoints[n];
        Self::new(id, form_number, degree, dimensions, segments, terminate)
    }

    fn segment_for(&self, t: f64) -> (usize, f64) {
        let mut index = 0;
        for (i, seg) in self.segments.iter().enumerate() {
            if t >= seg.breakpoint {
                index = i;
            }
        }
        (index, t - self.segments[index].breakpoint)
    }
}

impl Entity for ParametricSplineCurve {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn main_pd_parameters(&self) -> ParameterVector {
        let mut v = vec![
            Parameter::Integer(self.degree as i64),
            Parameter::Integer(self.dimensions as i64),
            Parameter::Integer(self.segments.len() as i64),
        ];
        for seg in &self.segments {
            v.push(Parameter::Real(seg.breakpoint));
        }
        v.push(Parameter::Real(self.terminate));
        for seg in &self.segments {
            for axis in [&seg.x, &seg.y, &seg.z] {
                v.push(Parameter::Real(axis.a));
                v.push(Parameter::Real(axis.b));
                v.push(Parameter::Real(axis.c));
                v.push(Parameter::Real(axis.d));
            }
        }
        ParameterVector::from_values(v)
    }

    fn validate_pd(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for message in self.coefficient_messages() {
            result.push(message);
        }
        result
    }
}

impl Curve for ParametricSplineCurve {
    fn parameter_range(&self) -> ParameterRange {
        ParameterRange {
            start: self.segments[0].breakpoint,
            end: self.terminate,
        }
    }

    fn is_closed(&self) -> bool {
        match (self.point_at(self.parameter_range().start), self.point_at(self.parameter_range().end)) {
            (Ok(a), Ok(b)) => (a - b).norm() < crate::core::precision::GEOMETRIC_TOLERANCE,
            _ => false,
        }
    }

    fn derivatives(&self, t: f64, n: usize) -> Result<CurveDerivatives> {
        if !self.parameter_range().contains(t) {
            return Err(IgesError::OutOfRange(format!(
                "parameter {t} outside parametric spline curve's domain"
            )));
        }
        let (index, dt) = self.segment_for(t);
        let seg = &self.segments[index];
        let mut values = Vec::with_capacity(n + 1);
        for k in 0..=n {
            values.push(Vector3::new(seg.x.eval(dt, k), seg.y.eval(dt, k), seg.z.eval(dt, k)));
        }
        Ok(CurveDerivatives::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdGenerator, ObjectKind};

    fn new_id() -> ObjectID {
        IdGenerator::generate_entity(ObjectKind::EntityNew, 112).unwrap().0
    }

    fn linear_segment(start: f64, p0: Vector3<f64>, p1: Vector3<f64>) -> SplineSegment {
        let d = p1 - p0;
        SplineSegment {
            breakpoint: start,
            x: AxisCoefficients { a: p0.x, b: d.x, c: 0.0, d: 0.0 },
            y: AxisCoefficients { a: p0.y, b: d.y, c: 0.0, d: 0.0 },
            z: AxisCoefficients { a: p0.z, b: d.z, c: 0.0, d: 0.0 },
        }
    }

    #[test]
    fn single_linear_segment_evaluates_endpoints() {
        let seg = linear_segment(0.0, Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 4.0, 0.0));
        let curve = ParametricSplineCurve::new(new_id(), 1, 1, 3, vec![seg], 1.0).unwrap();
        assert!((curve.point_at(0.0).unwrap() - Vector3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((curve.point_at(1.0).unwrap() - Vector3::new(2.0, 4.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn nonzero_coefficient_above_degree_is_rejected() {
        let mut seg = linear_segment(0.0, Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        seg.x.d = 1.0;
        assert!(ParametricSplineCurve::new(new_id(), 1, 1, 3, vec![seg], 1.0).is_err());
    }

    #[test]
    fn ndim_two_requires_zero_z_column() {
        let mut seg = linear_segment(0.0, Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 1.0));
        seg.z.b = 0.5;
        assert!(ParametricSplineCurve::new(new_id(), 1, 1, 2, vec![seg], 1.0).is_err());
    }
}
