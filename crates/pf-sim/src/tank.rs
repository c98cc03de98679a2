//! Single-tank level model.
//!
//! ## Model
//!
//! ```text
//! A·dh/dt = Q_in(t) − Q_out(h, pump_on)
//! ```
//!
//! - Inflow: constant, a time → flow curve, or a caller-registered function
//! - Outflow: constant, an orifice `Cd·a·√(2·g·h)`, or a pump following a
//!   level → flow curve, optionally gated by on/off hysteresis
//!
//! The level is clamped to `[min_level, max_level]` after every step; a
//! clamped step raises the overflow or emptied flag.

use crate::control::OnOffControl;
use crate::integrator::{ForwardEuler, Integrator};
use crate::model::TransientModel;
use pf_core::units::constants::G0_MPS2;
use pf_core::{
    CalcError, CalcResult, Curve, FunctionRegistry, Point2D, ScalarFn, Tolerances, nearly_equal,
};
use serde::{Deserialize, Serialize};

/// Step limit applied when a config does not set one.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InflowModel {
    Constant { flow: f64 },
    /// Time (s) → flow, linearly interpolated
    Curve { points: Vec<Point2D> },
    /// Looked up in the [`FunctionRegistry`] passed to [`TankModel::new`]
    Function { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutflowModel {
    Constant {
        flow: f64,
    },
    Orifice {
        /// Discharge coefficient in [0, 1]
        coefficient: f64,
        /// m²
        area: f64,
    },
    Pump {
        /// Pump flow (m³/s) against tank level (m), interpolated at the
        /// current level. The level is the abscissa: a flow → head pump
        /// characteristic must be inverted by the caller first.
        curve: Vec<Point2D>,
        #[serde(default)]
        control: Option<OnOffControl>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankConfig {
    /// Cross-section (m²)
    pub area: f64,
    /// m
    pub initial_level: f64,
    #[serde(default)]
    pub min_level: f64,
    #[serde(default)]
    pub max_level: Option<f64>,
    /// s
    pub time_step: f64,
    /// s
    pub end_time: f64,
    pub inflow: InflowModel,
    pub outflow: OutflowModel,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

/// One sample of the simulated tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankState {
    pub time: f64,
    pub level: f64,
    pub inflow: f64,
    pub outflow: f64,
    pub pump_on: bool,
}

/// Integrated part of the tank state; `pump_on` is held over a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelState {
    pub level: f64,
    pub pump_on: bool,
}

/// Result of a single [`TankModel::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankStep {
    pub state: TankState,
    pub overflow: bool,
    pub emptied: bool,
}

enum Inflow {
    Constant(f64),
    Curve(Curve),
    Function(ScalarFn),
}

enum Outflow {
    Constant(f64),
    Orifice {
        coefficient: f64,
        area: f64,
    },
    Pump {
        curve: Curve,
        control: Option<OnOffControl>,
    },
}

/// A validated tank with its inflow/outflow models resolved.
pub struct TankModel {
    config: TankConfig,
    inflow: Inflow,
    outflow: Outflow,
    steps: usize,
}

fn require(ok: bool, what: impl FnOnce() -> String) -> CalcResult<()> {
    if ok { Ok(()) } else { Err(CalcError::config(what())) }
}

impl TankModel {
    /// Validate `config` and bind named functions from `registry`.
    ///
    /// # Errors
    /// - `InsufficientCurveData` for an empty inflow or pump curve
    /// - `InvalidModelConfig` for any other out-of-range parameter, an
    ///   unregistered inflow function, or more than `max_steps` steps
    pub fn new(config: TankConfig, registry: &FunctionRegistry) -> CalcResult<Self> {
        let c = &config;
        require(c.area > 0.0 && c.area.is_finite(), || {
            format!("tank area must be positive, got {}", c.area)
        })?;
        require(c.time_step > 0.0 && c.time_step.is_finite(), || {
            format!("time step must be positive, got {}", c.time_step)
        })?;
        require(c.end_time >= 0.0 && c.end_time.is_finite(), || {
            format!("end time must be non-negative, got {}", c.end_time)
        })?;
        require(c.min_level.is_finite(), || {
            "minimum level must be finite".to_string()
        })?;
        let upper = c.max_level.unwrap_or(f64::INFINITY);
        require(c.min_level < upper, || {
            format!(
                "minimum level {} must be below maximum level {upper}",
                c.min_level
            )
        })?;
        require(c.initial_level >= c.min_level && c.initial_level <= upper, || {
            format!(
                "initial level {} outside [{}, {upper}]",
                c.initial_level, c.min_level
            )
        })?;

        let inflow = match &c.inflow {
            InflowModel::Constant { flow } => {
                require(flow.is_finite(), || {
                    "constant inflow must be finite".to_string()
                })?;
                Inflow::Constant(*flow)
            }
            InflowModel::Curve { points } => {
                Inflow::Curve(Curve::with_min_points(points, 1, "tank inflow curve")?)
            }
            InflowModel::Function { name } => match registry.get(name) {
                Some(f) => Inflow::Function(f.clone()),
                None => {
                    return Err(CalcError::config(format!(
                        "inflow function '{name}' is not registered"
                    )));
                }
            },
        };

        let outflow = match &c.outflow {
            OutflowModel::Constant { flow } => {
                require(flow.is_finite(), || {
                    "constant outflow must be finite".to_string()
                })?;
                Outflow::Constant(*flow)
            }
            OutflowModel::Orifice { coefficient, area } => {
                require((0.0..=1.0).contains(coefficient), || {
                    format!("orifice coefficient must be in [0, 1], got {coefficient}")
                })?;
                require(*area > 0.0 && area.is_finite(), || {
                    format!("orifice area must be positive, got {area}")
                })?;
                Outflow::Orifice {
                    coefficient: *coefficient,
                    area: *area,
                }
            }
            OutflowModel::Pump { curve, control } => {
                if let Some(control) = control {
                    control.validate()?;
                }
                Outflow::Pump {
                    curve: Curve::with_min_points(curve, 1, "tank pump curve")?,
                    control: *control,
                }
            }
        };

        let steps = step_count(c.end_time, c.time_step);
        require(steps <= c.max_steps as f64, || {
            format!(
                "simulation needs {steps} steps, more than max_steps = {}",
                c.max_steps
            )
        })?;

        Ok(Self {
            steps: steps as usize,
            config,
            inflow,
            outflow,
        })
    }

    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    /// Number of steps to reach `end_time`; the last one may be shorter.
    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn inflow_at(&self, time: f64) -> f64 {
        match &self.inflow {
            Inflow::Constant(q) => *q,
            Inflow::Curve(curve) => curve.interpolate(time),
            Inflow::Function(f) => f(time),
        }
    }

    pub fn outflow_at(&self, level: f64, pump_on: bool) -> f64 {
        match &self.outflow {
            Outflow::Constant(q) => *q,
            Outflow::Orifice { coefficient, area } => {
                if level <= 0.0 {
                    0.0
                } else {
                    coefficient * area * (2.0 * G0_MPS2 * level).sqrt()
                }
            }
            Outflow::Pump { curve, .. } => {
                if pump_on {
                    curve.interpolate(level)
                } else {
                    0.0
                }
            }
        }
    }

    /// Pump state after observing `level`.
    fn next_pump_state(&self, running: bool, level: f64) -> bool {
        match &self.outflow {
            Outflow::Pump {
                control: Some(control),
                ..
            } => control.update(running, level),
            Outflow::Pump { control: None, .. } => true,
            _ => false,
        }
    }

    /// Sample at t = 0.
    pub fn initial_sample(&self) -> TankState {
        let level = self.config.initial_level;
        let pump_on = match &self.outflow {
            Outflow::Pump {
                control: Some(control),
                ..
            } => control.initial_state(level),
            Outflow::Pump { control: None, .. } => true,
            _ => false,
        };
        TankState {
            time: 0.0,
            level,
            inflow: self.inflow_at(0.0),
            outflow: self.outflow_at(level, pump_on),
            pump_on,
        }
    }

    /// Advance one explicit Euler step of length `dt`.
    pub fn step(&self, state: &TankState, dt: f64) -> TankStep {
        let x = LevelState {
            level: state.level,
            pump_on: state.pump_on,
        };
        let raw = ForwardEuler.step(self, state.time, &x, dt).level;

        let upper = self.config.max_level.unwrap_or(f64::INFINITY);
        let overflow = raw > upper;
        let emptied = raw < self.config.min_level;
        let level = raw.clamp(self.config.min_level, upper);

        let time = state.time + dt;
        let pump_on = self.next_pump_state(state.pump_on, level);
        TankStep {
            state: TankState {
                time,
                level,
                inflow: self.inflow_at(time),
                outflow: self.outflow_at(level, pump_on),
                pump_on,
            },
            overflow,
            emptied,
        }
    }
}

impl TransientModel for TankModel {
    type State = LevelState;

    fn initial_state(&self) -> LevelState {
        let s = self.initial_sample();
        LevelState {
            level: s.level,
            pump_on: s.pump_on,
        }
    }

    fn rhs(&self, t: f64, x: &LevelState) -> LevelState {
        let net = self.inflow_at(t) - self.outflow_at(x.level, x.pump_on);
        LevelState {
            level: net / self.config.area,
            pump_on: x.pump_on,
        }
    }

    fn add(&self, a: &LevelState, b: &LevelState) -> LevelState {
        LevelState {
            level: a.level + b.level,
            pump_on: a.pump_on,
        }
    }

    fn scale(&self, a: &LevelState, scale: f64) -> LevelState {
        LevelState {
            level: a.level * scale,
            pump_on: a.pump_on,
        }
    }
}

/// ⌈end / dt⌉, treating ratios within rounding noise of an integer as exact.
fn step_count(end_time: f64, time_step: f64) -> f64 {
    let ratio = end_time / time_step;
    let nearest = ratio.round();
    let tol = Tolerances {
        abs: 1e-9,
        rel: 1e-9,
    };
    if nearly_equal(ratio, nearest, tol) {
        nearest
    } else {
        ratio.ceil()
    }
}
