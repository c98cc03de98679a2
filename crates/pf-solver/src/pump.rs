//! Pump characteristic curves.

use pf_core::advisory::Advisory;
use pf_core::units::constants::G0_MPS2;
use pf_core::units::{Power, watts};
use pf_core::{CalcError, CalcResult, Curve, Point2D, ensure_finite, interpolate};
use serde::{Deserialize, Serialize};

/// One sample of a pump characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpPoint {
    /// Volumetric flow
    pub flow: f64,
    /// Head (m)
    pub head: f64,
    /// Efficiency as a fraction in (0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

impl PumpPoint {
    pub fn new(flow: f64, head: f64) -> Self {
        Self {
            flow,
            head,
            efficiency: None,
        }
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = Some(efficiency);
        self
    }
}

impl From<(f64, f64)> for PumpPoint {
    fn from((flow, head): (f64, f64)) -> Self {
        Self::new(flow, head)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PumpCurveData {
    points: Vec<PumpPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
}

/// Head/flow characteristic of a single pump, sorted by flow.
///
/// Flows are unique and finite. A relative `speed` (1.0 = rated) is applied
/// through the affinity laws when the operating point is solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PumpCurveData", into = "PumpCurveData")]
pub struct PumpCurve {
    points: Vec<PumpPoint>,
    speed: Option<f64>,
}

impl PumpCurve {
    /// Build a curve from points in any order.
    ///
    /// # Errors
    /// - `InsufficientCurveData` for an empty point list
    /// - `NonFinite` for non-finite flow or head
    /// - `DuplicateAbscissa` for repeated flows
    /// - `InvalidModelConfig` for an efficiency outside (0, 1]
    pub fn new(points: Vec<PumpPoint>) -> CalcResult<Self> {
        if points.is_empty() {
            return Err(CalcError::InsufficientCurveData {
                what: "pump curve",
                required: 1,
                actual: 0,
            });
        }
        for p in &points {
            ensure_finite(p.flow, "pump curve flow")?;
            ensure_finite(p.head, "pump curve head")?;
            if let Some(eta) = p.efficiency {
                if !(eta > 0.0 && eta <= 1.0) {
                    return Err(CalcError::config(format!(
                        "pump efficiency {eta} outside (0, 1]"
                    )));
                }
            }
        }

        let mut points = points;
        points.sort_by(|a, b| a.flow.total_cmp(&b.flow));
        if let Some(pair) = points.windows(2).find(|w| w[0].flow == w[1].flow) {
            return Err(CalcError::DuplicateAbscissa {
                what: "pump curve",
                x: pair[0].flow,
            });
        }
        Ok(Self {
            points,
            speed: None,
        })
    }

    /// Build a curve from (flow, head) pairs without efficiency data.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> CalcResult<Self> {
        Self::new(pairs.iter().copied().map(PumpPoint::from).collect())
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Relative speed, 1.0 when unset.
    pub fn speed(&self) -> f64 {
        self.speed.unwrap_or(1.0)
    }

    pub fn points(&self) -> &[PumpPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn flow_range(&self) -> (f64, f64) {
        let first = self.points.first().map_or(f64::NAN, |p| p.flow);
        let last = self.points.last().map_or(f64::NAN, |p| p.flow);
        (first, last)
    }

    pub fn head_points(&self) -> Vec<Point2D> {
        self.points
            .iter()
            .map(|p| Point2D::new(p.flow, p.head))
            .collect()
    }

    /// Flow → head as a validated [`Curve`].
    pub fn head_curve(&self) -> CalcResult<Curve> {
        Curve::new(&self.head_points())
    }

    pub fn head_at(&self, flow: f64) -> f64 {
        interpolate(&self.head_points(), flow)
    }

    /// Efficiency interpolated over the points that carry one.
    pub fn efficiency_at(&self, flow: f64) -> Option<f64> {
        let eff: Vec<Point2D> = self
            .points
            .iter()
            .filter_map(|p| p.efficiency.map(|e| Point2D::new(p.flow, e)))
            .collect();
        if eff.is_empty() {
            return None;
        }
        Some(interpolate(&eff, flow))
    }

    /// Curve at `ratio` times its current speed (affinity laws).
    ///
    /// ```text
    /// Q₂ = Q₁·n        H₂ = H₁·n²        η₂ = η₁
    /// ```
    pub fn scaled(&self, ratio: f64) -> CalcResult<Self> {
        if !(ratio > 0.0) || !ratio.is_finite() {
            return Err(CalcError::config(format!(
                "speed ratio must be positive and finite, got {ratio}"
            )));
        }
        let points = self
            .points
            .iter()
            .map(|p| PumpPoint {
                flow: p.flow * ratio,
                head: p.head * ratio * ratio,
                efficiency: p.efficiency,
            })
            .collect();
        Ok(Self {
            points,
            speed: None,
        })
    }

    /// Sampled point with the highest efficiency.
    pub fn best_efficiency_point(&self) -> Option<PumpPoint> {
        self.points
            .iter()
            .filter(|p| p.efficiency.is_some())
            .copied()
            .max_by(|a, b| {
                let (ea, eb) = (a.efficiency.unwrap_or(0.0), b.efficiency.unwrap_or(0.0));
                ea.total_cmp(&eb)
            })
    }
}

impl TryFrom<PumpCurveData> for PumpCurve {
    type Error = CalcError;

    fn try_from(data: PumpCurveData) -> CalcResult<Self> {
        let curve = PumpCurve::new(data.points)?;
        Ok(match data.speed {
            Some(speed) => curve.with_speed(speed),
            None => curve,
        })
    }
}

impl From<PumpCurve> for PumpCurveData {
    fn from(curve: PumpCurve) -> Self {
        Self {
            points: curve.points,
            speed: curve.speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpPowerResult {
    /// ρ·g·Q·H (W)
    pub hydraulic_power: f64,
    /// Shaft power hydraulic/η (W)
    pub brake_power: f64,
    pub warnings: Vec<String>,
}

impl PumpPowerResult {
    pub fn brake(&self) -> Power {
        watts(self.brake_power)
    }
}

/// Hydraulic and brake power for a duty point.
///
/// An efficiency outside (0, 1] leaves the brake power as NaN and adds an
/// advisory.
pub fn pump_power(flow: f64, head: f64, density: f64, efficiency: f64) -> PumpPowerResult {
    let hydraulic_power = density * G0_MPS2 * flow * head;
    let mut warnings = Vec::new();

    if !(density > 0.0) {
        warnings.push(
            Advisory::NonPhysicalInput {
                what: "density must be positive",
            }
            .to_string(),
        );
    }
    let brake_power = if efficiency > 0.0 && efficiency <= 1.0 {
        hydraulic_power / efficiency
    } else {
        warnings.push(
            Advisory::NonPhysicalInput {
                what: "pump efficiency must be in (0, 1]",
            }
            .to_string(),
        );
        f64::NAN
    };

    PumpPowerResult {
        hydraulic_power,
        brake_power,
        warnings,
    }
}
