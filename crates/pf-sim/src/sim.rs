//! Tank simulation runner and summary.

use crate::tank::{TankConfig, TankModel, TankState};
use pf_core::advisory::Advisory;
use pf_core::{CalcResult, FunctionRegistry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankSummary {
    pub final_level: f64,
    pub minimum_level: f64,
    pub maximum_level: f64,
    /// Time-weighted over the run; the initial flow for a zero-length run
    pub average_inflow: f64,
    pub average_outflow: f64,
    pub total_inflow_volume: f64,
    pub total_outflow_volume: f64,
    pub overflow: bool,
    pub empty: bool,
    /// Off → on transitions after t = 0
    pub pump_starts: usize,
    /// s
    pub pump_run_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSimulation {
    /// Initial sample plus one per step
    pub series: Vec<TankState>,
    pub summary: TankSummary,
    pub warnings: Vec<String>,
}

/// Validate `config` and integrate it to `end_time`.
///
/// # Errors
/// Whatever [`TankModel::new`] rejects. Overflow and emptying are reported in
/// the summary, never as errors.
pub fn run_tank_simulation(
    config: TankConfig,
    registry: &FunctionRegistry,
) -> CalcResult<TankSimulation> {
    let model = TankModel::new(config, registry)?;
    let steps = model.step_count();
    let dt = model.config().time_step;
    let end_time = model.config().end_time;

    debug!(steps, dt, end_time, "tank simulation start");

    let mut state = model.initial_sample();
    let mut series = Vec::with_capacity(steps + 1);
    series.push(state);

    let mut minimum_level = state.level;
    let mut maximum_level = state.level;
    let mut total_inflow_volume = 0.0;
    let mut total_outflow_volume = 0.0;
    let mut pump_run_time = 0.0;
    let mut pump_starts = 0;
    let mut overflow = false;
    let mut emptied = false;

    for k in 0..steps {
        let t_next = ((k + 1) as f64 * dt).min(end_time);
        let h = t_next - state.time;

        total_inflow_volume += state.inflow * h;
        total_outflow_volume += state.outflow * h;
        if state.pump_on {
            pump_run_time += h;
        }

        let step = model.step(&state, h);
        overflow |= step.overflow;
        emptied |= step.emptied;
        if step.state.pump_on && !state.pump_on {
            pump_starts += 1;
        }

        state = step.state;
        minimum_level = minimum_level.min(state.level);
        maximum_level = maximum_level.max(state.level);
        series.push(state);
    }

    let (average_inflow, average_outflow) = if end_time > 0.0 {
        (total_inflow_volume / end_time, total_outflow_volume / end_time)
    } else {
        (state.inflow, state.outflow)
    };

    let mut warnings = Vec::new();
    if overflow {
        warnings.push(Advisory::TankOverflow.to_string());
    }
    if emptied {
        warnings.push(Advisory::TankEmptied.to_string());
    }
    if overflow || emptied {
        warn!(overflow, emptied, "tank level hit a bound");
    }
    debug!(
        final_level = state.level,
        pump_starts, "tank simulation complete"
    );

    Ok(TankSimulation {
        series,
        summary: TankSummary {
            final_level: state.level,
            minimum_level,
            maximum_level,
            average_inflow,
            average_outflow,
            total_inflow_volume,
            total_outflow_volume,
            overflow,
            empty: emptied,
            pump_starts,
            pump_run_time,
        },
        warnings,
    })
}
