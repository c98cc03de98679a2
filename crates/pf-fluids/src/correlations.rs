//! Closed-form fluid correlations.
//!
//! All functions take SI values as `f64` and report non-physical input through
//! NaN/infinite sentinels.

use pf_core::units::constants::G0_MPS2;
use serde::{Deserialize, Serialize};

/// Reynolds number below which flow is taken as laminar.
pub const LAMINAR_LIMIT: f64 = 2300.0;

/// Reynolds number above which flow is taken as fully turbulent.
pub const TURBULENT_LIMIT: f64 = 4000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowRegime {
    Laminar,
    Transitional,
    Turbulent,
}

impl FlowRegime {
    /// Classify a Reynolds number; the sign is ignored.
    pub fn from_reynolds(re: f64) -> Self {
        let re = re.abs();
        if re < LAMINAR_LIMIT {
            FlowRegime::Laminar
        } else if re < TURBULENT_LIMIT {
            FlowRegime::Transitional
        } else {
            FlowRegime::Turbulent
        }
    }
}

/// Reynolds number ρ·v·D/μ.
///
/// Returns +∞ when viscosity or diameter is not positive.
pub fn reynolds(density: f64, velocity: f64, diameter: f64, viscosity: f64) -> f64 {
    if !(viscosity > 0.0) || !(diameter > 0.0) {
        return f64::INFINITY;
    }
    density * velocity * diameter / viscosity
}

/// Darcy friction factor from the Churchill (1977) correlation.
///
/// Valid across laminar, transitional and turbulent flow:
///
/// ```text
/// f = 8 [ (8/Re)^12 + (A + B)^-1.5 ]^(1/12)
/// A = [ 2.457 ln( 1 / ((7/Re)^0.9 + 0.27 ε/D) ) ]^16
/// B = (37530 / Re)^16
/// ```
///
/// Zero Reynolds gives zero friction. Friction does not depend on flow
/// direction, so the sign of `reynolds` is dropped. NaN when the diameter is
/// not positive.
pub fn friction_factor(reynolds: f64, roughness: f64, diameter: f64) -> f64 {
    if reynolds == 0.0 {
        return 0.0;
    }
    let re = reynolds.abs();
    if !(diameter > 0.0) {
        return f64::NAN;
    }

    let relative_roughness = roughness / diameter;
    let laminar = (8.0 / re).powi(12);
    let inner = 1.0 / ((7.0 / re).powf(0.9) + 0.27 * relative_roughness);
    let a = (2.457 * inner.ln()).powi(16);
    let b = (37_530.0 / re).powi(16);

    8.0 * (laminar + (a + b).powf(-1.5)).powf(1.0 / 12.0)
}

/// Darcy-Weisbach pressure drop f·(L/D)·ρ·v²/2, always non-negative.
///
/// NaN when the diameter is not positive.
pub fn darcy_pressure_drop(
    friction_factor: f64,
    length: f64,
    diameter: f64,
    density: f64,
    velocity: f64,
) -> f64 {
    if !(diameter > 0.0) {
        return f64::NAN;
    }
    (friction_factor * (length / diameter) * density * velocity * velocity / 2.0).abs()
}

/// Andrade viscosity-temperature relation μ(T) = μ₀·exp[β(1/T − 1/T₀)].
///
/// Temperatures are absolute (K). NaN for non-positive temperatures.
pub fn andrade_viscosity(
    reference_viscosity: f64,
    reference_temperature: f64,
    temperature: f64,
    coefficient: f64,
) -> f64 {
    if !(temperature > 0.0) || !(reference_temperature > 0.0) {
        return f64::NAN;
    }
    reference_viscosity * (coefficient * (1.0 / temperature - 1.0 / reference_temperature)).exp()
}

/// Mean velocity of a volumetric flow through a circular pipe.
///
/// +∞ for a non-positive diameter.
pub fn mean_velocity(flow_rate: f64, diameter: f64) -> f64 {
    if !(diameter > 0.0) {
        return f64::INFINITY;
    }
    flow_rate / (std::f64::consts::PI * diameter * diameter / 4.0)
}

/// Convert a pressure difference to an equivalent fluid column (m).
pub fn head_from_pressure(pressure: f64, density: f64) -> f64 {
    if !(density > 0.0) {
        return f64::NAN;
    }
    pressure / (density * G0_MPS2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reynolds_basic_and_sentinels() {
        assert!((reynolds(1000.0, 1.0, 0.1, 0.001) - 100_000.0).abs() < 1e-6);
        assert!(reynolds(1000.0, 1.0, 0.1, 0.0).is_infinite());
        assert!(reynolds(1000.0, 1.0, -0.1, 0.001).is_infinite());
        assert!(reynolds(1000.0, 1.0, 0.1, f64::NAN).is_infinite());
    }

    #[test]
    fn friction_zero_flow() {
        assert_eq!(friction_factor(0.0, 1e-4, 0.1), 0.0);
    }

    #[test]
    fn friction_laminar_matches_64_over_re() {
        let f = friction_factor(1000.0, 1e-4, 0.1);
        assert!((f - 0.064).abs() < 1e-6, "f = {f}");
    }

    #[test]
    fn friction_turbulent_reference_values() {
        let f = friction_factor(127_323.954, 1e-4, 0.1);
        assert!((f - 0.02187).abs() < 5e-5, "f = {f}");

        // Re = 1e5, e/D = 1e-3
        let f = friction_factor(1e5, 1e-4, 0.1);
        assert!((f - 0.02234).abs() < 5e-5, "f = {f}");
    }

    #[test]
    fn friction_nan_for_bad_diameter() {
        assert!(friction_factor(5000.0, 1e-4, 0.0).is_nan());
        assert!(friction_factor(-5000.0, 1e-4, -1.0).is_nan());
    }

    #[test]
    fn darcy_is_unsigned() {
        let dp = darcy_pressure_drop(0.02, 100.0, 0.1, 1000.0, -2.0);
        assert!((dp - 40_000.0).abs() < 1e-6);
        assert!(darcy_pressure_drop(0.02, 100.0, 0.0, 1000.0, 2.0).is_nan());
    }

    #[test]
    fn andrade_reference_point_and_trend() {
        let mu0 = 1.0e-3;
        let same = andrade_viscosity(mu0, 293.15, 293.15, 1800.0);
        assert!((same - mu0).abs() < 1e-15);
        // Liquids thin out when heated
        assert!(andrade_viscosity(mu0, 293.15, 333.15, 1800.0) < mu0);
        assert!(andrade_viscosity(mu0, 293.15, 0.0, 1800.0).is_nan());
    }

    #[test]
    fn regime_classification() {
        assert_eq!(FlowRegime::from_reynolds(1500.0), FlowRegime::Laminar);
        assert_eq!(FlowRegime::from_reynolds(-3000.0), FlowRegime::Transitional);
        assert_eq!(FlowRegime::from_reynolds(1e5), FlowRegime::Turbulent);
    }

    proptest! {
        #[test]
        fn friction_is_direction_independent(
            re in 1.0_f64..1e7,
            roughness in 0.0_f64..1e-3,
            diameter in 0.01_f64..1.0,
        ) {
            let fwd = friction_factor(re, roughness, diameter);
            let rev = friction_factor(-re, roughness, diameter);
            prop_assert_eq!(fwd.to_bits(), rev.to_bits());
            prop_assert!(fwd > 0.0);
        }
    }
}
