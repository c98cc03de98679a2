//! Intersection of the combined pump curve with the system curve.

use crate::arrangement::{Arrangement, at_shutoff, combine, inverse_head_points, parallel_share};
use crate::pump::PumpCurve;
use crate::system::{ResolvedSystemCurve, SystemCurve};
use pf_core::advisory::{Advisory, BEP_WINDOW};
use pf_core::{
    BisectionConfig, CalcError, CalcResult, ConvergenceRecord, Curve, FunctionRegistry, Point2D,
    bisect,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Uniform samples taken across the flow domain when the curves never cross.
const CLOSEST_APPROACH_SAMPLES: usize = 64;

fn unit_speed() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingPointRequest {
    pub pumps: Vec<PumpCurve>,
    #[serde(default)]
    pub arrangement: Arrangement,
    pub system: SystemCurve,
    /// Global speed multiplier applied on top of each pump's own speed
    #[serde(default = "unit_speed")]
    pub speed: f64,
    #[serde(default)]
    pub config: BisectionConfig,
}

impl OperatingPointRequest {
    pub fn new(pumps: Vec<PumpCurve>, arrangement: Arrangement, system: SystemCurve) -> Self {
        Self {
            pumps,
            arrangement,
            system,
            speed: 1.0,
            config: BisectionConfig::default(),
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_config(mut self, config: BisectionConfig) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub flow: f64,
    pub head: f64,
    pub pump_head: f64,
    pub system_head: f64,
    /// Combined efficiency when every running pump has efficiency data
    pub efficiency: Option<f64>,
}

/// Share of the operating point carried by one pump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpDuty {
    pub pump: usize,
    pub flow: f64,
    pub head: f64,
    pub efficiency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingPointSolution {
    pub operating_point: OperatingPoint,
    pub duties: Vec<PumpDuty>,
    /// Combined flow → head points the system curve was intersected with
    pub combined_curve: Vec<Point2D>,
    pub convergence: ConvergenceRecord,
    pub warnings: Vec<String>,
}

/// Solve for the flow where the combined pump head meets the system head.
///
/// ## Method
///
/// 1. Scale each pump by `pump.speed · request.speed` (affinity laws)
/// 2. Combine the scaled curves per the arrangement
/// 3. Bisect `pump_head(Q) − system_head(Q)` over the combined flow domain
///
/// When the residual never changes sign the point of closest approach is
/// returned with `converged = false`.
///
/// # Errors
/// - `InvalidArrangement` with no pumps
/// - `InsufficientCurveData` for a pump curve with fewer than two points
/// - `InvalidModelConfig` for a bad speed, system curve or solver config
/// - `NonMonotonicCurve` for a parallel pump whose head does not fall with flow
pub fn solve_operating_point(
    request: &OperatingPointRequest,
    registry: &FunctionRegistry,
) -> CalcResult<OperatingPointSolution> {
    if request.pumps.is_empty() {
        return Err(CalcError::arrangement("at least one pump is required"));
    }
    for pump in &request.pumps {
        if pump.len() < 2 {
            return Err(CalcError::InsufficientCurveData {
                what: "pump curve",
                required: 2,
                actual: pump.len(),
            });
        }
    }
    let config = &request.config;
    if !(config.tolerance > 0.0) || config.max_iterations == 0 {
        return Err(CalcError::config(
            "bisection tolerance must be positive and max_iterations non-zero",
        ));
    }
    let system = request.system.resolve(registry)?;

    let mut warnings = Vec::new();
    let running: &[PumpCurve] = match request.arrangement {
        Arrangement::Single if request.pumps.len() > 1 => {
            warnings.push(
                Advisory::ExtraPumpsIgnored {
                    count: request.pumps.len() - 1,
                }
                .to_string(),
            );
            &request.pumps[..1]
        }
        _ => &request.pumps,
    };

    let pumps = running
        .iter()
        .map(|p| {
            let ratio = p.speed() * request.speed;
            if ratio == 1.0 { Ok(p.clone()) } else { p.scaled(ratio) }
        })
        .collect::<CalcResult<Vec<_>>>()?;

    let combined = combine(request.arrangement, &pumps)?;
    let Some((lo, hi)) = combined.domain() else {
        return Err(CalcError::InsufficientCurveData {
            what: "combined pump curve",
            required: 2,
            actual: 0,
        });
    };

    debug!(
        arrangement = ?request.arrangement,
        pumps = pumps.len(),
        lo,
        hi,
        "solving operating point"
    );

    let residual = |q: f64| combined.interpolate(q) - system.head_at(q);
    let outcome = bisect(residual, lo, hi, config);

    let (flow, convergence) = if outcome.bracketed {
        (outcome.root, outcome.record())
    } else {
        let (q, r) = closest_approach(&combined, &system);
        warnings.push(
            Advisory::NoOperatingPoint {
                closest_residual: r,
            }
            .to_string(),
        );
        (q, ConvergenceRecord::bisection(outcome.iterations, r, false))
    };

    if convergence.converged {
        debug!(
            flow,
            iterations = convergence.iterations,
            "operating point found"
        );
    } else {
        warn!(
            flow,
            residual = convergence.residual,
            "operating point did not converge"
        );
    }

    let pump_head = combined.interpolate(flow);
    let system_head = system.head_at(flow);

    let edge = 1e-9 * (hi - lo);
    let at_edge = (flow - lo).abs() <= edge || (hi - flow).abs() <= edge;
    if outcome.bracketed && at_edge {
        warnings.push(Advisory::OperatingPointAtCurveEdge { flow }.to_string());
    }

    let duties = pump_duties(request.arrangement, &pumps, flow, pump_head)?;
    for duty in &duties {
        let Some(bep) = pumps[duty.pump].best_efficiency_point() else {
            continue;
        };
        if bep.flow > 0.0 {
            let ratio = duty.flow / bep.flow;
            if ratio < BEP_WINDOW.0 || ratio > BEP_WINDOW.1 {
                warnings.push(
                    Advisory::FarFromBestEfficiency {
                        pump: duty.pump,
                        ratio,
                    }
                    .to_string(),
                );
            }
        }
    }

    Ok(OperatingPointSolution {
        operating_point: OperatingPoint {
            flow,
            head: pump_head,
            pump_head,
            system_head,
            efficiency: combined_efficiency(&duties),
        },
        duties,
        combined_curve: combined.points().to_vec(),
        convergence,
        warnings,
    })
}

/// Minimum |residual| over the curve vertices and a uniform sample.
fn closest_approach(combined: &Curve, system: &ResolvedSystemCurve<'_>) -> (f64, f64) {
    let (lo, hi) = combined.domain().unwrap_or((0.0, 0.0));
    let step = (hi - lo) / CLOSEST_APPROACH_SAMPLES as f64;

    combined
        .points()
        .iter()
        .map(|p| p.x)
        .chain((0..=CLOSEST_APPROACH_SAMPLES).map(|i| lo + step * i as f64))
        .map(|q| (q, combined.interpolate(q) - system.head_at(q)))
        .filter(|(_, r)| r.is_finite())
        .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .unwrap_or((lo, f64::NAN))
}

fn pump_duties(
    arrangement: Arrangement,
    pumps: &[PumpCurve],
    flow: f64,
    head: f64,
) -> CalcResult<Vec<PumpDuty>> {
    let duty = |pump: usize, flow: f64, head: f64| PumpDuty {
        pump,
        flow,
        head,
        efficiency: pumps[pump].efficiency_at(flow),
    };

    Ok(match arrangement {
        Arrangement::Single => vec![duty(0, flow, head)],
        Arrangement::Parallel => {
            let inverses = pumps
                .iter()
                .map(inverse_head_points)
                .collect::<CalcResult<Vec<_>>>()?;
            let mut shares: Vec<f64> = inverses
                .iter()
                .map(|inv| parallel_share(inv, head))
                .collect();

            // On a shutoff step the stepping pumps carry whatever the others don't
            let stepping: Vec<bool> = inverses.iter().map(|inv| at_shutoff(inv, head)).collect();
            let (mut fixed, mut stepped) = (0.0, 0.0);
            for (share, step) in shares.iter().zip(&stepping) {
                if *step {
                    stepped += *share;
                } else {
                    fixed += *share;
                }
            }
            if stepped > 0.0 {
                let fraction = ((flow - fixed) / stepped).clamp(0.0, 1.0);
                for (share, step) in shares.iter_mut().zip(&stepping) {
                    if *step {
                        *share *= fraction;
                    }
                }
            }

            shares
                .into_iter()
                .enumerate()
                .map(|(i, q)| duty(i, q, head))
                .collect()
        }
        Arrangement::Series => pumps
            .iter()
            .enumerate()
            .map(|(i, p)| duty(i, flow, p.head_at(flow)))
            .collect(),
    })
}

/// Σ Q·H / Σ (Q·H/η) over the running pumps.
fn combined_efficiency(duties: &[PumpDuty]) -> Option<f64> {
    let mut hydraulic = 0.0;
    let mut shaft = 0.0;
    for d in duties {
        let eta = d.efficiency?;
        hydraulic += d.flow * d.head;
        shaft += d.flow * d.head / eta;
    }
    if shaft > 0.0 {
        Some(hydraulic / shaft)
    } else {
        duties.first().and_then(|d| d.efficiency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pump() -> PumpCurve {
        PumpCurve::from_pairs(&[(0.0, 50.0), (10.0, 45.0), (20.0, 30.0), (30.0, 10.0)]).unwrap()
    }

    fn solve(request: OperatingPointRequest) -> OperatingPointSolution {
        solve_operating_point(&request, &FunctionRegistry::new()).unwrap()
    }

    #[test]
    fn single_pump_against_quadratic_system() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump()],
            Arrangement::Single,
            SystemCurve::quadratic(10.0, 0.05),
        ));
        let op = sol.operating_point;
        assert!(sol.convergence.converged);
        assert!((op.flow - 20.0).abs() < 1e-4, "flow = {}", op.flow);
        assert!((op.head - 30.0).abs() < 1e-4);
        assert!((op.pump_head - op.system_head).abs() <= 1e-6);
    }

    #[test]
    fn single_pump_against_constant_system() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump()],
            Arrangement::Single,
            SystemCurve::Constant { head: 20.0 },
        ));
        assert!(sol.convergence.converged);
        assert!((sol.operating_point.flow - 25.0).abs() < 1e-5);
        assert!((sol.operating_point.head - 20.0).abs() < 1e-5);
    }

    #[test]
    fn pump_above_system_does_not_converge() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump()],
            Arrangement::Single,
            SystemCurve::Constant { head: 5.0 },
        ));
        assert!(!sol.convergence.converged);
        // Closest approach is the end of the curve, 10 m vs 5 m
        assert_eq!(sol.operating_point.flow, 30.0);
        assert_eq!(sol.convergence.residual, 5.0);
        assert!(sol.warnings.iter().any(|w| w.contains("do not intersect")));
    }

    #[test]
    fn pump_below_system_does_not_converge() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump()],
            Arrangement::Single,
            SystemCurve::quadratic(60.0, 0.05),
        ));
        assert!(!sol.convergence.converged);
        // Shutoff head 50 m against 60 m static head
        assert_eq!(sol.operating_point.flow, 0.0);
        assert_eq!(sol.convergence.residual, -10.0);
        assert!(sol.warnings.iter().any(|w| w.contains("do not intersect")));
    }

    #[test]
    fn parallel_duties_add_up_across_shutoff_step() {
        let late_start = PumpCurve::from_pairs(&[(5.0, 30.0), (10.0, 20.0)]).unwrap();
        for head in [35.0, 30.0, 25.0] {
            let sol = solve(OperatingPointRequest::new(
                vec![pump(), late_start.clone()],
                Arrangement::Parallel,
                SystemCurve::Constant { head },
            ));
            assert!(sol.convergence.converged, "head {head}");
            let total: f64 = sol.duties.iter().map(|d| d.flow).sum();
            let flow = sol.operating_point.flow;
            assert!(
                (total - flow).abs() < 1e-4,
                "head {head}: {total} vs {flow}"
            );
        }
    }

    #[test]
    fn parallel_identical_pumps_split_flow() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump(), pump()],
            Arrangement::Parallel,
            SystemCurve::quadratic(10.0, 0.05),
        ));
        let op = sol.operating_point;
        assert!((op.flow - 25.0).abs() < 1e-4, "flow = {}", op.flow);
        assert!((op.head - 41.25).abs() < 1e-4);
        for d in &sol.duties {
            assert!((d.flow - 12.5).abs() < 1e-4);
            assert_eq!(d.head, op.head);
        }
    }

    #[test]
    fn series_pumps_split_head() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump(), pump()],
            Arrangement::Series,
            SystemCurve::quadratic(10.0, 0.05),
        ));
        let op = sol.operating_point;
        // 140 − 4Q = 10 + 0.05Q²
        let expected = (-80.0 + (6400.0_f64 + 10_400.0).sqrt()) / 2.0;
        assert!((op.flow - expected).abs() < 1e-4, "flow = {}", op.flow);
        let total: f64 = sol.duties.iter().map(|d| d.head).sum();
        assert!((total - op.head).abs() < 1e-9);
    }

    #[test]
    fn global_speed_scales_curve() {
        let sol = solve(
            OperatingPointRequest::new(
                vec![pump()],
                Arrangement::Single,
                SystemCurve::Constant { head: 5.0 },
            )
            .with_speed(0.5),
        );
        assert!(sol.convergence.converged);
        assert!((sol.operating_point.flow - 12.5).abs() < 1e-5);
    }

    #[test]
    fn structural_errors() {
        let reg = FunctionRegistry::new();
        let one_point = PumpCurve::from_pairs(&[(0.0, 10.0)]).unwrap();
        let req = OperatingPointRequest::new(
            vec![one_point],
            Arrangement::Single,
            SystemCurve::Constant { head: 5.0 },
        );
        assert!(matches!(
            solve_operating_point(&req, &reg),
            Err(CalcError::InsufficientCurveData { .. })
        ));

        let req = OperatingPointRequest::new(
            vec![],
            Arrangement::Parallel,
            SystemCurve::Constant { head: 5.0 },
        );
        assert!(matches!(
            solve_operating_point(&req, &reg),
            Err(CalcError::InvalidArrangement { .. })
        ));

        let req = OperatingPointRequest::new(
            vec![pump()],
            Arrangement::Single,
            SystemCurve::Named {
                name: "nope".into(),
            },
        );
        assert!(matches!(
            solve_operating_point(&req, &reg),
            Err(CalcError::InvalidModelConfig { .. })
        ));

        let req = OperatingPointRequest::new(
            vec![pump()],
            Arrangement::Single,
            SystemCurve::Constant { head: 5.0 },
        )
        .with_speed(-1.0);
        assert!(matches!(
            solve_operating_point(&req, &reg),
            Err(CalcError::InvalidModelConfig { .. })
        ));
    }

    #[test]
    fn extra_pumps_in_single_arrangement_are_flagged() {
        let sol = solve(OperatingPointRequest::new(
            vec![pump(), pump()],
            Arrangement::Single,
            SystemCurve::Constant { head: 20.0 },
        ));
        assert_eq!(sol.duties.len(), 1);
        assert!(sol.warnings.iter().any(|w| w.contains("1 ignored")));
    }
}
