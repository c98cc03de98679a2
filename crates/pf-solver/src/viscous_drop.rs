//! Pressure drop with temperature-dependent viscosity.
//!
//! Viscosity follows the Andrade relation evaluated at the mean of inlet and
//! outlet temperature. When no outlet temperature is given, frictional
//! heating sets it:
//!
//! ```text
//! T_out = T_in + Δp / (ρ·c_p)
//! ```
//!
//! The loop is a plain fixed-point iteration on Δp.

use pf_core::advisory::Advisory;
use pf_core::{CalcError, CalcResult, ConvergenceRecord};
use pf_fluids::cache::{CorrelationCache, friction_factor_with, reynolds_with};
use pf_fluids::correlations::{andrade_viscosity, darcy_pressure_drop, mean_velocity};
use pf_fluids::pipe::pipe_advisories;
use pf_fluids::{FluidProperties, PipeSegment};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Specific heat of water near room temperature (J/(kg·K)).
pub const DEFAULT_SPECIFIC_HEAT: f64 = 4186.0;

fn default_specific_heat() -> f64 {
    DEFAULT_SPECIFIC_HEAT
}

/// μ(T) = μ₀·exp[β(1/T − 1/T₀)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AndradeModel {
    /// μ₀ (Pa·s)
    pub reference_viscosity: f64,
    /// T₀ (K)
    pub reference_temperature: f64,
    /// β (K)
    pub coefficient: f64,
}

impl AndradeModel {
    pub fn viscosity_at(&self, temperature: f64) -> f64 {
        andrade_viscosity(
            self.reference_viscosity,
            self.reference_temperature,
            temperature,
            self.coefficient,
        )
    }
}

/// Fixed-point iteration settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedPointConfig {
    /// Absolute tolerance on successive pressure drops (Pa)
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for FixedPointConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViscousDropRequest {
    /// m³/s
    pub flow_rate: f64,
    pub segment: PipeSegment,
    /// kg/m³
    pub density: f64,
    pub viscosity: AndradeModel,
    /// K
    pub inlet_temperature: f64,
    /// K; re-estimated from frictional heating when absent
    #[serde(default)]
    pub outlet_temperature: Option<f64>,
    /// J/(kg·K)
    #[serde(default = "default_specific_heat")]
    pub specific_heat: f64,
    /// Pa, used only for advisories
    #[serde(default)]
    pub inlet_pressure: Option<f64>,
    #[serde(default)]
    pub config: FixedPointConfig,
}

/// State after one fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropIteration {
    pub iteration: usize,
    pub pressure_drop: f64,
    pub average_temperature: f64,
    pub average_viscosity: f64,
    pub reynolds_number: f64,
    pub friction_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViscousDropResult {
    pub pressure_drop: f64,
    pub outlet_temperature: f64,
    pub average_temperature: f64,
    pub average_viscosity: f64,
    pub reynolds_number: f64,
    pub friction_factor: f64,
    pub velocity: f64,
    pub history: Vec<DropIteration>,
    pub convergence: ConvergenceRecord,
    pub warnings: Vec<String>,
}

/// Iterate viscosity, friction factor and pressure drop to a fixed point.
///
/// # Errors
/// `InvalidModelConfig` for a non-positive tolerance, a zero iteration cap,
/// or a non-positive specific heat when the outlet temperature must be
/// estimated.
pub fn solve_viscosity_adjusted_drop(
    request: &ViscousDropRequest,
    cache: Option<&CorrelationCache>,
) -> CalcResult<ViscousDropResult> {
    let config = request.config;
    if !(config.tolerance > 0.0) {
        return Err(CalcError::config(format!(
            "fixed-point tolerance must be positive, got {}",
            config.tolerance
        )));
    }
    if config.max_iterations == 0 {
        return Err(CalcError::config("max_iterations must be non-zero"));
    }
    let estimate_outlet = request.outlet_temperature.is_none();
    if estimate_outlet && !(request.specific_heat > 0.0) {
        return Err(CalcError::config(format!(
            "specific heat must be positive, got {}",
            request.specific_heat
        )));
    }

    let segment = &request.segment;
    let t_in = request.inlet_temperature;
    let mut t_out = request.outlet_temperature.unwrap_or(t_in);
    let velocity = mean_velocity(request.flow_rate, segment.diameter);

    let mut history: Vec<DropIteration> = Vec::with_capacity(config.max_iterations.min(16));
    let mut previous: Option<f64> = None;
    let mut residual = f64::INFINITY;
    let mut converged = false;
    let mut warnings = Vec::new();

    debug!(t_in, estimate_outlet, "viscosity-adjusted pressure drop");

    for iteration in 1..=config.max_iterations {
        let t_avg = 0.5 * (t_in + t_out);
        let mu = request.viscosity.viscosity_at(t_avg);
        let re = reynolds_with(cache, request.density, velocity, segment.diameter, mu);
        let f = friction_factor_with(cache, re, segment.roughness, segment.diameter);
        let dp = darcy_pressure_drop(
            f,
            segment.length,
            segment.diameter,
            request.density,
            velocity,
        );

        history.push(DropIteration {
            iteration,
            pressure_drop: dp,
            average_temperature: t_avg,
            average_viscosity: mu,
            reynolds_number: re,
            friction_factor: f,
        });
        trace!(iteration, dp, t_avg, mu, "fixed-point step");

        if !dp.is_finite() {
            warnings.push(
                Advisory::NonPhysicalInput {
                    what: "pressure drop became non-finite",
                }
                .to_string(),
            );
            residual = f64::NAN;
            break;
        }
        if estimate_outlet {
            t_out = t_in + dp / (request.density * request.specific_heat);
        }
        if let Some(prev) = previous {
            residual = (dp - prev).abs();
            if residual < config.tolerance {
                converged = true;
                break;
            }
        }
        previous = Some(dp);
    }

    let iterations = history.len();
    if converged {
        debug!(iterations, residual, "viscosity-adjusted drop converged");
    } else {
        warn!(
            iterations,
            residual,
            "viscosity-adjusted drop did not converge"
        );
    }

    let last = history
        .last()
        .copied()
        .ok_or_else(|| CalcError::config("fixed-point loop produced no steps"))?;
    let fluid = FluidProperties::new(request.density, last.average_viscosity);
    warnings.extend(pipe_advisories(
        segment,
        &fluid,
        last.reynolds_number,
        last.pressure_drop,
        request.inlet_pressure,
    ));

    Ok(ViscousDropResult {
        pressure_drop: last.pressure_drop,
        outlet_temperature: t_out,
        average_temperature: last.average_temperature,
        average_viscosity: last.average_viscosity,
        reynolds_number: last.reynolds_number,
        friction_factor: last.friction_factor,
        velocity,
        history,
        convergence: ConvergenceRecord::fixed_point(iterations, residual, converged),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water_request(inlet_temperature: f64) -> ViscousDropRequest {
        ViscousDropRequest {
            flow_rate: 0.01,
            segment: PipeSegment::new(0.1, 100.0).with_roughness(1e-4),
            density: 1000.0,
            viscosity: AndradeModel {
                reference_viscosity: 1.0e-3,
                reference_temperature: 293.15,
                coefficient: 1800.0,
            },
            inlet_temperature,
            outlet_temperature: None,
            specific_heat: DEFAULT_SPECIFIC_HEAT,
            inlet_pressure: None,
            config: FixedPointConfig::default(),
        }
    }

    #[test]
    fn converges_near_isothermal_value() {
        let r = solve_viscosity_adjusted_drop(&water_request(293.15), None).unwrap();
        assert!(r.convergence.converged);
        assert!(r.history.len() >= 2);
        assert!((r.pressure_drop - 17_731.0).abs() / 17_731.0 < 0.01);
        // Frictional heating of a few mK
        assert!(r.outlet_temperature > 293.15);
        assert!(r.outlet_temperature - 293.15 < 0.01);
    }

    #[test]
    fn hotter_fluid_drops_less_pressure() {
        let cold = solve_viscosity_adjusted_drop(&water_request(293.15), None).unwrap();
        let hot = solve_viscosity_adjusted_drop(&water_request(333.15), None).unwrap();
        assert!(hot.average_viscosity < cold.average_viscosity);
        assert!(hot.pressure_drop < cold.pressure_drop);
    }

    #[test]
    fn fixed_outlet_converges_in_two_steps() {
        let req = ViscousDropRequest {
            outlet_temperature: Some(303.15),
            ..water_request(293.15)
        };
        let r = solve_viscosity_adjusted_drop(&req, None).unwrap();
        assert!(r.convergence.converged);
        assert_eq!(r.history.len(), 2);
        assert!((r.average_temperature - 298.15).abs() < 1e-9);
        assert_eq!(r.outlet_temperature, 303.15);
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let req = ViscousDropRequest {
            config: FixedPointConfig {
                tolerance: 1e-6,
                max_iterations: 1,
            },
            ..water_request(293.15)
        };
        let r = solve_viscosity_adjusted_drop(&req, None).unwrap();
        assert!(!r.convergence.converged);
        assert_eq!(r.convergence.iterations, 1);
    }

    #[test]
    fn non_finite_drop_stops_early() {
        let mut req = water_request(293.15);
        req.segment.diameter = 0.0;
        let r = solve_viscosity_adjusted_drop(&req, None).unwrap();
        assert!(!r.convergence.converged);
        assert_eq!(r.history.len(), 1);
        assert!(r.pressure_drop.is_nan());
        assert!(r.warnings.iter().any(|w| w.contains("non-finite")));
    }

    #[test]
    fn rejects_bad_config() {
        let mut req = water_request(293.15);
        req.config.tolerance = 0.0;
        assert!(matches!(
            solve_viscosity_adjusted_drop(&req, None),
            Err(CalcError::InvalidModelConfig { .. })
        ));

        let mut req = water_request(293.15);
        req.config.max_iterations = 0;
        assert!(solve_viscosity_adjusted_drop(&req, None).is_err());

        let mut req = water_request(293.15);
        req.specific_heat = 0.0;
        assert!(solve_viscosity_adjusted_drop(&req, None).is_err());
    }

    #[test]
    fn history_records_every_iteration() {
        let cache = CorrelationCache::default();
        let r = solve_viscosity_adjusted_drop(&water_request(293.15), Some(&cache)).unwrap();
        for (i, step) in r.history.iter().enumerate() {
            assert_eq!(step.iteration, i + 1);
            assert!(step.friction_factor > 0.0);
        }
        assert_eq!(r.convergence.iterations, r.history.len());
    }
}
