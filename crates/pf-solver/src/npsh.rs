//! Net positive suction head check.

use pf_core::advisory::{Advisory, MIN_NPSH_MARGIN_RATIO};
use pf_core::units::constants::G0_MPS2;
use pf_core::units::{Density, Pressure};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Conditions at the pump suction flange (SI, absolute pressures).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuctionConditions {
    /// Absolute suction pressure (Pa)
    pub suction_pressure: f64,
    /// Vapour pressure at the pumping temperature (Pa)
    pub vapor_pressure: f64,
    /// kg/m³
    pub density: f64,
    /// Suction velocity (m/s)
    #[serde(default)]
    pub velocity: f64,
    /// Liquid level above the impeller eye (m), negative for suction lift
    #[serde(default)]
    pub static_head: f64,
    /// Suction line losses (m)
    #[serde(default)]
    pub losses: f64,
}

impl SuctionConditions {
    pub fn from_quantities(suction: Pressure, vapor: Pressure, density: Density) -> Self {
        Self {
            suction_pressure: suction.value,
            vapor_pressure: vapor.value,
            density: density.value,
            velocity: 0.0,
            static_head: 0.0,
            losses: 0.0,
        }
    }

    /// NPSHa = (Ps − Pv)/(ρg) + v²/(2g) + z − losses
    pub fn npsh_available(&self) -> f64 {
        if !(self.density > 0.0) {
            return f64::NAN;
        }
        (self.suction_pressure - self.vapor_pressure) / (self.density * G0_MPS2)
            + self.velocity * self.velocity / (2.0 * G0_MPS2)
            + self.static_head
            - self.losses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpshResult {
    /// m
    pub available: f64,
    /// m
    pub required: f64,
    /// available − required (m)
    pub margin: f64,
    /// available / required; +∞ when nothing is required
    pub margin_ratio: f64,
    pub cavitation_risk: bool,
    pub warnings: Vec<String>,
}

/// Compare available NPSH against the pump's requirement.
///
/// Risk is flagged when the ratio drops below 1.1 or the margin goes
/// negative. A NaN NPSHa (non-positive density) is always flagged.
pub fn check_npsh(suction: &SuctionConditions, npsh_required: f64) -> NpshResult {
    let available = suction.npsh_available();
    let margin = available - npsh_required;
    let margin_ratio = if npsh_required > 0.0 {
        available / npsh_required
    } else {
        f64::INFINITY
    };
    let safe = margin_ratio >= MIN_NPSH_MARGIN_RATIO && margin >= 0.0;

    let mut warnings = Vec::new();
    if !(suction.density > 0.0) {
        warnings.push(
            Advisory::NonPhysicalInput {
                what: "density must be positive",
            }
            .to_string(),
        );
    }
    if !safe {
        warnings.push(
            Advisory::CavitationMarginLow {
                margin,
                ratio: margin_ratio,
            }
            .to_string(),
        );
    }
    debug!(available, npsh_required, margin_ratio, "npsh check");

    NpshResult {
        available,
        required: npsh_required,
        margin,
        margin_ratio,
        cavitation_risk: !safe,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::units::{kgpm3, pa};

    fn open_tank() -> SuctionConditions {
        // Atmospheric tank, water at ~20 °C
        SuctionConditions::from_quantities(pa(101_325.0), pa(2_339.0), kgpm3(998.0))
    }

    #[test]
    fn atmospheric_suction_has_ample_margin() {
        let r = check_npsh(&open_tank(), 3.0);
        let available = r.available;
        assert!((available - 10.114).abs() < 1e-2, "NPSHa = {available}");
        assert!(!r.cavitation_risk);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn suction_lift_and_losses_reduce_margin() {
        let suction = SuctionConditions {
            static_head: -5.0,
            losses: 1.5,
            ..open_tank()
        };
        let r = check_npsh(&suction, 3.5);
        assert!(r.margin_ratio < MIN_NPSH_MARGIN_RATIO);
        assert!(r.cavitation_risk);
        assert!(r.warnings[0].starts_with("cavitation margin low"));
    }

    #[test]
    fn zero_requirement_is_unbounded_ratio() {
        let r = check_npsh(&open_tank(), 0.0);
        assert!(r.margin_ratio.is_infinite());
        assert!(!r.cavitation_risk);
    }

    #[test]
    fn bad_density_is_flagged_not_fatal() {
        let suction = SuctionConditions {
            density: 0.0,
            ..open_tank()
        };
        let r = check_npsh(&suction, 2.0);
        assert!(r.available.is_nan());
        assert!(r.cavitation_risk);
        assert_eq!(r.warnings.len(), 2);
    }
}
