//! System resistance curves.

use pf_core::{CalcError, CalcResult, FunctionRegistry, ScalarFn, eval_polynomial};
use serde::{Deserialize, Serialize};

/// Head required by the piping system as a function of flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemCurve {
    /// Flow-independent head
    Constant { head: f64 },
    /// H = static_head + k·Q²
    Quadratic {
        static_head: f64,
        resistance_coefficient: f64,
    },
    /// H = Σ cᵢ·Qⁱ, lowest degree first
    Polynomial { coefficients: Vec<f64> },
    /// Caller-supplied function looked up in a [`FunctionRegistry`]
    Named { name: String },
}

impl SystemCurve {
    pub fn quadratic(static_head: f64, resistance_coefficient: f64) -> Self {
        SystemCurve::Quadratic {
            static_head,
            resistance_coefficient,
        }
    }

    /// Check parameters and resolve named functions.
    ///
    /// # Errors
    /// `InvalidModelConfig` for negative or non-finite quadratic parameters,
    /// an empty polynomial, or a name missing from `registry`.
    pub fn resolve<'a>(
        &'a self,
        registry: &FunctionRegistry,
    ) -> CalcResult<ResolvedSystemCurve<'a>> {
        let function = match self {
            SystemCurve::Constant { head } => {
                if !head.is_finite() {
                    return Err(CalcError::config("constant system head must be finite"));
                }
                None
            }
            SystemCurve::Quadratic {
                static_head,
                resistance_coefficient,
            } => {
                if !(*static_head >= 0.0) || !static_head.is_finite() {
                    return Err(CalcError::config(format!(
                        "static head must be non-negative, got {static_head}"
                    )));
                }
                if !(*resistance_coefficient >= 0.0) || !resistance_coefficient.is_finite() {
                    return Err(CalcError::config(format!(
                        "resistance coefficient must be non-negative, got {resistance_coefficient}"
                    )));
                }
                None
            }
            SystemCurve::Polynomial { coefficients } => {
                if coefficients.is_empty() {
                    return Err(CalcError::config("polynomial system curve is empty"));
                }
                if coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(CalcError::config("polynomial coefficients must be finite"));
                }
                None
            }
            SystemCurve::Named { name } => match registry.get(name) {
                Some(f) => Some(f.clone()),
                None => {
                    return Err(CalcError::config(format!(
                        "system curve function '{name}' is not registered"
                    )));
                }
            },
        };
        Ok(ResolvedSystemCurve {
            curve: self,
            function,
        })
    }
}

/// A [`SystemCurve`] whose parameters are validated and whose named function
/// is bound.
#[derive(Clone)]
pub struct ResolvedSystemCurve<'a> {
    curve: &'a SystemCurve,
    function: Option<ScalarFn>,
}

impl ResolvedSystemCurve<'_> {
    pub fn head_at(&self, flow: f64) -> f64 {
        match (self.curve, &self.function) {
            (_, Some(f)) => f(flow),
            (SystemCurve::Constant { head }, None) => *head,
            (
                SystemCurve::Quadratic {
                    static_head,
                    resistance_coefficient,
                },
                None,
            ) => static_head + resistance_coefficient * flow * flow,
            (SystemCurve::Polynomial { coefficients }, None) => eval_polynomial(coefficients, flow),
            (SystemCurve::Named { .. }, None) => f64::NAN,
        }
    }
}

impl std::fmt::Debug for ResolvedSystemCurve<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSystemCurve")
            .field("curve", self.curve)
            .finish_non_exhaustive()
    }
}
