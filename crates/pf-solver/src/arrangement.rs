//! Combining several pump curves into one equivalent curve.

use crate::pump::PumpCurve;
use pf_core::{
    CalcError, CalcResult, Curve, Monotonicity, Point2D, interpolate, validate_monotonic,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    /// Only the first pump runs
    #[default]
    Single,
    /// Common head, flows add
    Parallel,
    /// Common flow, heads add
    Series,
}

impl FromStr for Arrangement {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Arrangement::Single),
            "parallel" => Ok(Arrangement::Parallel),
            "series" => Ok(Arrangement::Series),
            other => Err(CalcError::arrangement(format!(
                "unknown arrangement '{other}' (expected single, parallel or series)"
            ))),
        }
    }
}

/// Flow a pump delivers against `head`, or zero above its shutoff head.
pub(crate) fn parallel_share(inverse: &[Point2D], head: f64) -> f64 {
    match inverse.last() {
        Some(top) if head > top.x => 0.0,
        _ => interpolate(inverse, head),
    }
}

/// Whether `head` is the shutoff head of the pump behind `inverse`.
pub(crate) fn at_shutoff(inverse: &[Point2D], head: f64) -> bool {
    inverse.last().is_some_and(|top| top.x == head)
}

/// Head → flow lookup for a pump curve that must fall strictly with flow.
pub(crate) fn inverse_head_points(curve: &PumpCurve) -> CalcResult<Vec<Point2D>> {
    let points = curve.head_points();
    match validate_monotonic(&points, "parallel pump curve")? {
        Monotonicity::Decreasing => {}
        Monotonicity::Increasing => {
            return Err(CalcError::NonMonotonicCurve {
                what: "parallel pump curve",
            });
        }
    }
    let mut inverse: Vec<Point2D> = points.iter().map(|p| Point2D::new(p.y, p.x)).collect();
    inverse.reverse();
    Ok(inverse)
}

/// Equivalent flow → head curve of `curves` in the given arrangement.
///
/// Parallel: every distinct vertex head at or above the highest minimum head
/// becomes a candidate; pumps add their flow at that head (zero above their
/// shutoff head). A pump whose curve starts above zero flow drops out in a
/// step at its shutoff head, so both sides of the step are emitted as
/// points at that head. Series: every vertex flow inside the shared flow range
/// becomes a candidate and heads add.
///
/// # Errors
/// - `InvalidArrangement` when `curves` is empty, or series curves share no
///   flow range
/// - `NonMonotonicCurve` when a parallel pump curve is not strictly falling
pub fn combine(arrangement: Arrangement, curves: &[PumpCurve]) -> CalcResult<Curve> {
    let Some(first) = curves.first() else {
        return Err(CalcError::arrangement("at least one pump is required"));
    };

    match arrangement {
        Arrangement::Single => first.head_curve(),
        Arrangement::Parallel => combine_parallel(curves),
        Arrangement::Series => combine_series(curves),
    }
}

fn combine_parallel(curves: &[PumpCurve]) -> CalcResult<Curve> {
    let inverses = curves
        .iter()
        .map(inverse_head_points)
        .collect::<CalcResult<Vec<_>>>()?;

    let floor = inverses
        .iter()
        .filter_map(|inv| inv.first().map(|p| p.x))
        .fold(f64::NEG_INFINITY, f64::max);

    let mut heads: Vec<f64> = inverses
        .iter()
        .flat_map(|inv| inv.iter().map(|p| p.x))
        .filter(|h| *h >= floor)
        .collect();
    heads.sort_by(|a, b| a.total_cmp(b));
    heads.dedup();

    let mut points = Vec::with_capacity(2 * heads.len());
    for &h in &heads {
        let at: f64 = inverses.iter().map(|inv| parallel_share(inv, h)).sum();
        let above: f64 = inverses
            .iter()
            .filter(|inv| !at_shutoff(inv, h))
            .map(|inv| parallel_share(inv, h))
            .sum();
        points.push(Point2D::new(at, h));
        if above != at {
            points.push(Point2D::new(above, h));
        }
    }

    // Equal total flow at two heads: keep the higher head
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(b.y.total_cmp(&a.y)));
    points.dedup_by(|later, earlier| later.x == earlier.x);
    Curve::new(&points)
}

fn combine_series(curves: &[PumpCurve]) -> CalcResult<Curve> {
    let (lo, hi) = curves.iter().map(PumpCurve::flow_range).fold(
        (f64::NEG_INFINITY, f64::INFINITY),
        |(lo, hi), (a, b)| (lo.max(a), hi.min(b)),
    );
    if !(lo <= hi) {
        return Err(CalcError::arrangement(format!(
            "series pump curves share no flow range (max start {lo}, min end {hi})"
        )));
    }

    let mut flows: Vec<f64> = curves
        .iter()
        .flat_map(|c| c.points().iter().map(|p| p.flow))
        .filter(|q| (lo..=hi).contains(q))
        .collect();
    flows.sort_by(|a, b| a.total_cmp(b));
    flows.dedup();

    let points: Vec<Point2D> = flows
        .iter()
        .map(|&q| {
            let head: f64 = curves.iter().map(|c| c.head_at(q)).sum();
            Point2D::new(q, head)
        })
        .collect();
    Curve::new(&points)
}
