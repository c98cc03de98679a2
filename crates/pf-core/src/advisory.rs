//! Non-fatal engineering advisories.
//!
//! Advisories annotate a result; they never change the numbers in it.

use core::fmt;

/// Relative roughness (ε/D) above which a pipe is flagged as unusually rough.
pub const HIGH_RELATIVE_ROUGHNESS: f64 = 0.05;

/// Fraction of inlet pressure above which a pressure drop is flagged.
pub const HIGH_PRESSURE_DROP_FRACTION: f64 = 0.4;

/// NPSHa / NPSHr ratio below which cavitation is considered likely.
pub const MIN_NPSH_MARGIN_RATIO: f64 = 1.1;

/// Preferred operating window around the best efficiency point, as a
/// fraction of BEP flow.
pub const BEP_WINDOW: (f64, f64) = (0.7, 1.2);

#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    CavitationMarginLow { margin: f64, ratio: f64 },
    HighRelativeRoughness { relative_roughness: f64 },
    HighPressureDropFraction { fraction: f64 },
    TransitionalFlow { reynolds: f64 },
    NoOperatingPoint { closest_residual: f64 },
    OperatingPointAtCurveEdge { flow: f64 },
    FarFromBestEfficiency { pump: usize, ratio: f64 },
    ExtraPumpsIgnored { count: usize },
    TankOverflow,
    TankEmptied,
    NonPhysicalInput { what: &'static str },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::CavitationMarginLow { margin, ratio } => write!(
                f,
                "cavitation margin low: {margin:.2} m (ratio {ratio:.2} < {MIN_NPSH_MARGIN_RATIO})"
            ),
            Advisory::HighRelativeRoughness { relative_roughness } => write!(
                f,
                "relative roughness e/D = {relative_roughness:.4} exceeds {HIGH_RELATIVE_ROUGHNESS}"
            ),
            Advisory::HighPressureDropFraction { fraction } => write!(
                f,
                "pressure drop exceeds 40% of inlet pressure ({:.1}%)",
                fraction * 100.0
            ),
            Advisory::TransitionalFlow { reynolds } => write!(
                f,
                "transitional flow regime (Re = {reynolds:.0}); friction factor is uncertain"
            ),
            Advisory::NoOperatingPoint { closest_residual } => write!(
                f,
                "pump and system curves do not intersect; closest approach {closest_residual:.3} m"
            ),
            Advisory::OperatingPointAtCurveEdge { flow } => write!(
                f,
                "operating point at the edge of the pump curve (flow {flow:.4})"
            ),
            Advisory::FarFromBestEfficiency { pump, ratio } => write!(
                f,
                "pump {pump} operates at {:.0}% of its best-efficiency flow",
                ratio * 100.0
            ),
            Advisory::ExtraPumpsIgnored { count } => {
                write!(f, "single arrangement uses the first pump; {count} ignored")
            }
            Advisory::TankOverflow => write!(f, "tank level reached the maximum level (overflow)"),
            Advisory::TankEmptied => write!(f, "tank level reached the minimum level (empty)"),
            Advisory::NonPhysicalInput { what } => write!(f, "non-physical input: {what}"),
        }
    }
}
