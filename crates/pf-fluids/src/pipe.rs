//! Straight-pipe hydraulics: pressure drop for a flow and flow for a drop.

use crate::cache::{CorrelationCache, friction_factor_with, reynolds_with};
use crate::correlations::{FlowRegime, darcy_pressure_drop, head_from_pressure, mean_velocity};
use pf_core::advisory::{Advisory, HIGH_PRESSURE_DROP_FRACTION, HIGH_RELATIVE_ROUGHNESS};
use pf_core::units::{Density, DynVisc, Length, Pressure, VolumeRate};
use pf_core::{BisectionConfig, ConvergenceRecord, bisect};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Absolute roughness used when none is given (m).
pub const DEFAULT_ROUGHNESS: f64 = 1.5e-4;

fn default_roughness() -> f64 {
    DEFAULT_ROUGHNESS
}

/// Pipe geometry (SI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeSegment {
    /// Inner diameter (m)
    pub diameter: f64,
    /// Length (m)
    pub length: f64,
    /// Absolute roughness (m)
    #[serde(default = "default_roughness")]
    pub roughness: f64,
}

impl PipeSegment {
    pub fn new(diameter: f64, length: f64) -> Self {
        Self {
            diameter,
            length,
            roughness: DEFAULT_ROUGHNESS,
        }
    }

    pub fn with_roughness(mut self, roughness: f64) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn from_quantities(diameter: Length, length: Length, roughness: Length) -> Self {
        Self {
            diameter: diameter.value,
            length: length.value,
            roughness: roughness.value,
        }
    }

    pub fn flow_area(&self) -> f64 {
        std::f64::consts::PI * self.diameter * self.diameter / 4.0
    }

    pub fn relative_roughness(&self) -> f64 {
        self.roughness / self.diameter
    }
}

/// Constant fluid properties (SI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidProperties {
    /// Density (kg/m³)
    pub density: f64,
    /// Dynamic viscosity (Pa·s)
    pub viscosity: f64,
}

impl FluidProperties {
    pub fn new(density: f64, viscosity: f64) -> Self {
        Self { density, viscosity }
    }

    pub fn from_quantities(density: Density, viscosity: DynVisc) -> Self {
        Self {
            density: density.value,
            viscosity: viscosity.value,
        }
    }
}

/// Volumetric flow through a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeFlow {
    /// Volumetric flow rate (m³/s)
    pub flow_rate: f64,
    pub segment: PipeSegment,
    pub fluid: FluidProperties,
    /// Absolute inlet pressure (Pa), used only for advisories
    #[serde(default)]
    pub inlet_pressure: Option<f64>,
}

impl PipeFlow {
    pub fn new(flow_rate: f64, diameter: f64, length: f64, density: f64, viscosity: f64) -> Self {
        Self {
            flow_rate,
            segment: PipeSegment::new(diameter, length),
            fluid: FluidProperties::new(density, viscosity),
            inlet_pressure: None,
        }
    }

    pub fn from_quantities(
        flow_rate: VolumeRate,
        segment: PipeSegment,
        fluid: FluidProperties,
    ) -> Self {
        Self {
            flow_rate: flow_rate.value,
            segment,
            fluid,
            inlet_pressure: None,
        }
    }

    pub fn with_roughness(mut self, roughness: f64) -> Self {
        self.segment.roughness = roughness;
        self
    }

    pub fn with_inlet_pressure(mut self, inlet_pressure: Pressure) -> Self {
        self.inlet_pressure = Some(inlet_pressure.value);
        self
    }

    pub fn velocity(&self) -> f64 {
        mean_velocity(self.flow_rate, self.segment.diameter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureDropResult {
    /// Pa
    pub pressure_drop: f64,
    /// Equivalent fluid column (m)
    pub head_loss: f64,
    pub reynolds_number: f64,
    pub friction_factor: f64,
    /// m/s
    pub velocity: f64,
    pub regime: FlowRegime,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRateResult {
    /// m³/s, signed like the requested pressure drop
    pub flow_rate: f64,
    pub velocity: f64,
    pub reynolds_number: f64,
    pub friction_factor: f64,
    pub convergence: ConvergenceRecord,
    pub warnings: Vec<String>,
}

/// Advisories shared by every straight-pipe calculation.
pub fn pipe_advisories(
    segment: &PipeSegment,
    fluid: &FluidProperties,
    reynolds: f64,
    pressure_drop: f64,
    inlet_pressure: Option<f64>,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if !(segment.diameter > 0.0) {
        warnings.push(
            Advisory::NonPhysicalInput {
                what: "pipe diameter must be positive",
            }
            .to_string(),
        );
    }
    if !(fluid.density > 0.0) {
        warnings.push(
            Advisory::NonPhysicalInput {
                what: "density must be positive",
            }
            .to_string(),
        );
    }
    if !(fluid.viscosity > 0.0) {
        warnings.push(
            Advisory::NonPhysicalInput {
                what: "viscosity must be positive",
            }
            .to_string(),
        );
    }

    let relative_roughness = segment.relative_roughness();
    if relative_roughness.is_finite() && relative_roughness > HIGH_RELATIVE_ROUGHNESS {
        warnings.push(
            Advisory::HighRelativeRoughness { relative_roughness }.to_string(),
        );
    }
    if reynolds.is_finite() && FlowRegime::from_reynolds(reynolds) == FlowRegime::Transitional {
        warnings.push(Advisory::TransitionalFlow { reynolds }.to_string());
    }
    if let Some(p_in) = inlet_pressure.filter(|p| *p > 0.0) {
        let fraction = pressure_drop / p_in;
        if fraction > HIGH_PRESSURE_DROP_FRACTION {
            warnings.push(Advisory::HighPressureDropFraction { fraction }.to_string());
        }
    }
    warnings
}

/// Darcy-Weisbach pressure drop with the Churchill friction factor.
pub fn pressure_drop(flow: &PipeFlow, cache: Option<&CorrelationCache>) -> PressureDropResult {
    let PipeFlow { segment, fluid, .. } = flow;
    let velocity = flow.velocity();
    let re = reynolds_with(
        cache,
        fluid.density,
        velocity,
        segment.diameter,
        fluid.viscosity,
    );
    let f = friction_factor_with(cache, re, segment.roughness, segment.diameter);
    let dp = darcy_pressure_drop(f, segment.length, segment.diameter, fluid.density, velocity);

    PressureDropResult {
        pressure_drop: dp,
        head_loss: head_from_pressure(dp, fluid.density),
        reynolds_number: re,
        friction_factor: f,
        velocity,
        regime: FlowRegime::from_reynolds(re),
        warnings: pipe_advisories(segment, fluid, re, dp, flow.inlet_pressure),
    }
}

/// Evaluate many independent pipe flows in parallel.
///
/// Output order matches input order.
pub fn pressure_drop_batch(
    flows: &[PipeFlow],
    cache: Option<&CorrelationCache>,
) -> Vec<PressureDropResult> {
    flows.par_iter().map(|f| pressure_drop(f, cache)).collect()
}

/// Flow rate that produces `target_drop` across the pipe.
///
/// Bisection on Q over an expanding bracket. The residual is the relative
/// pressure-drop error, so `config.tolerance` is relative. A negative target
/// gives a negative (reverse) flow.
pub fn flow_rate_from_pressure_drop(
    segment: &PipeSegment,
    fluid: &FluidProperties,
    target_drop: f64,
    config: &BisectionConfig,
    cache: Option<&CorrelationCache>,
) -> FlowRateResult {
    const MAX_EXPANSIONS: usize = 60;

    let sign = target_drop.signum();
    let target = target_drop.abs();
    let physical = segment.diameter > 0.0 && fluid.density > 0.0 && fluid.viscosity > 0.0;

    if target == 0.0 || !physical || !target.is_finite() {
        let flow_rate = if target == 0.0 && physical { 0.0 } else { f64::NAN };
        let mut warnings = pipe_advisories(segment, fluid, f64::NAN, target, None);
        if !target.is_finite() {
            warnings.push(
                Advisory::NonPhysicalInput {
                    what: "pressure drop must be finite",
                }
                .to_string(),
            );
        }
        return FlowRateResult {
            flow_rate,
            velocity: mean_velocity(flow_rate, segment.diameter),
            reynolds_number: 0.0,
            friction_factor: 0.0,
            convergence: ConvergenceRecord::bisection(0, 0.0, flow_rate == 0.0),
            warnings,
        };
    }

    let drop_at = |q: f64| {
        let v = mean_velocity(q, segment.diameter);
        let re = reynolds_with(cache, fluid.density, v, segment.diameter, fluid.viscosity);
        let f = friction_factor_with(cache, re, segment.roughness, segment.diameter);
        darcy_pressure_drop(f, segment.length, segment.diameter, fluid.density, v)
    };
    let residual = |q: f64| (drop_at(q) - target) / target;

    // Velocity if the whole drop became kinetic head, then grow until bracketed
    let mut q_hi = segment.flow_area() * (2.0 * target / fluid.density).sqrt();
    let mut expansions = 0;
    while residual(q_hi) < 0.0 && expansions < MAX_EXPANSIONS {
        q_hi *= 2.0;
        expansions += 1;
    }

    let outcome = bisect(residual, 0.0, q_hi, config);
    debug!(
        iterations = outcome.iterations,
        converged = outcome.converged,
        expansions,
        "flow rate from pressure drop"
    );

    let q = outcome.root;
    let velocity = mean_velocity(q, segment.diameter);
    let re = reynolds_with(
        cache,
        fluid.density,
        velocity,
        segment.diameter,
        fluid.viscosity,
    );
    let f = friction_factor_with(cache, re, segment.roughness, segment.diameter);

    FlowRateResult {
        flow_rate: sign * q,
        velocity: sign * velocity,
        reynolds_number: re,
        friction_factor: f,
        convergence: outcome.record(),
        warnings: pipe_advisories(segment, fluid, re, target, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{kgpm3, m, m3ps, pa, pas};

    fn reference_flow() -> PipeFlow {
        PipeFlow::new(0.01, 0.1, 100.0, 1000.0, 0.001).with_roughness(1e-4)
    }

    #[test]
    fn reference_pressure_drop() {
        let r = pressure_drop(&reference_flow(), None);
        let dp = r.pressure_drop;
        assert!((dp - 17_731.1).abs() < 1.0, "dp = {dp}");
        assert!((r.reynolds_number - 127_324.0).abs() < 1.0);
        assert!((r.friction_factor - 0.0218749).abs() < 1e-5);
        assert!((r.velocity - 1.27324).abs() < 1e-4);
        assert_eq!(r.regime, FlowRegime::Turbulent);
        assert!(r.warnings.is_empty(), "{:?}", r.warnings);
    }

    #[test]
    fn quantities_constructor_converts_units() {
        use uom::si::length::millimeter;
        let segment = PipeSegment::from_quantities(
            Length::new::<millimeter>(100.0),
            m(100.0),
            Length::new::<millimeter>(0.1),
        );
        let flow = PipeFlow::from_quantities(
            m3ps(0.01),
            segment,
            FluidProperties::from_quantities(kgpm3(1000.0), pas(0.001)),
        );
        let a = pressure_drop(&flow, None);
        let b = pressure_drop(&reference_flow(), None);
        assert!((a.pressure_drop - b.pressure_drop).abs() < 1e-6);
    }

    #[test]
    fn high_drop_fraction_warns() {
        let flow = reference_flow().with_inlet_pressure(pa(30_000.0));
        let r = pressure_drop(&flow, None);
        assert!(r.warnings.iter().any(|w| w.contains("40% of inlet")));
    }

    #[test]
    fn non_physical_inputs_are_sentinels() {
        let flow = PipeFlow::new(0.01, 0.1, 100.0, 1000.0, 0.0);
        let r = pressure_drop(&flow, None);
        assert!(r.reynolds_number.is_infinite());
        assert!(r.warnings.iter().any(|w| w.contains("viscosity")));

        let flow = PipeFlow::new(0.01, -0.1, 100.0, 1000.0, 0.001);
        assert!(pressure_drop(&flow, None).pressure_drop.is_nan());
    }

    #[test]
    fn zero_flow_has_no_drop() {
        let flow = PipeFlow::new(0.0, 0.1, 100.0, 1000.0, 0.001);
        let r = pressure_drop(&flow, None);
        assert_eq!(r.pressure_drop, 0.0);
        assert_eq!(r.friction_factor, 0.0);
    }

    #[test]
    fn flow_rate_inverts_pressure_drop() {
        let flow = reference_flow();
        let dp = pressure_drop(&flow, None).pressure_drop;
        let config = BisectionConfig {
            tolerance: 1e-9,
            max_iterations: 200,
        };
        let r = flow_rate_from_pressure_drop(&flow.segment, &flow.fluid, dp, &config, None);
        assert!(r.convergence.converged);
        assert!((r.flow_rate - 0.01).abs() < 1e-7, "q = {}", r.flow_rate);

        let rev = flow_rate_from_pressure_drop(&flow.segment, &flow.fluid, -dp, &config, None);
        assert!((rev.flow_rate + 0.01).abs() < 1e-7);
    }

    #[test]
    fn flow_rate_zero_drop() {
        let flow = reference_flow();
        let r = flow_rate_from_pressure_drop(
            &flow.segment,
            &flow.fluid,
            0.0,
            &BisectionConfig::default(),
            None,
        );
        assert_eq!(r.flow_rate, 0.0);
        assert!(r.convergence.converged);
    }

    #[test]
    fn batch_preserves_order_and_uses_cache() {
        let cache = CorrelationCache::default();
        let flows: Vec<PipeFlow> = (1..=20)
            .map(|i| reference_flow().with_roughness(1e-5 * i as f64))
            .collect();
        let batch = pressure_drop_batch(&flows, Some(&cache));
        assert_eq!(batch.len(), flows.len());
        for (flow, result) in flows.iter().zip(&batch) {
            let single = pressure_drop(flow, None);
            assert_eq!(
                single.pressure_drop.to_bits(),
                result.pressure_drop.to_bits()
            );
        }
        assert!(!cache.is_empty());
    }
}
