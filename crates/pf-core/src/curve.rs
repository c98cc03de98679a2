//! Piecewise-linear curve math over ordered (x, y) point sets.
//!
//! Every lookup in the workspace goes through here: pump heads, inverse
//! head-to-flow lookups, tank inflow tables and pump drain tables.

use crate::error::{CalcError, CalcResult};
use crate::numeric::ensure_finite;
use serde::{Deserialize, Serialize};

/// Immutable sample of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Direction of a strictly monotonic curve (y against x).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monotonicity {
    Increasing,
    Decreasing,
}

/// Return a copy of `points` sorted by x ascending.
///
/// # Errors
/// `DuplicateAbscissa` if two points share an x value, `NonFinite` if any
/// coordinate is NaN or infinite.
pub fn sort_by_x(points: &[Point2D]) -> CalcResult<Vec<Point2D>> {
    for p in points {
        ensure_finite(p.x, "curve x")?;
        ensure_finite(p.y, "curve y")?;
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    if let Some(pair) = sorted.windows(2).find(|w| w[0].x == w[1].x) {
        return Err(CalcError::DuplicateAbscissa {
            what: "curve",
            x: pair[0].x,
        });
    }
    Ok(sorted)
}

/// Linear interpolation over points sorted by x.
///
/// Outside the domain the nearest boundary value is returned (flat
/// extrapolation). An empty slice or a NaN abscissa yields NaN.
pub fn interpolate(points: &[Point2D], x: f64) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return f64::NAN;
    };
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= first.x {
        return first.y;
    }
    if x >= last.x {
        return last.y;
    }

    // first >= 2 points here, bracket is [hi-1, hi]
    let hi = points
        .partition_point(|p| p.x <= x)
        .clamp(1, points.len() - 1);
    let a = points[hi - 1];
    let b = points[hi];
    let dx = b.x - a.x;
    if dx == 0.0 {
        return a.y;
    }
    a.y + (x - a.x) / dx * (b.y - a.y)
}

/// Classify a curve as strictly increasing or strictly decreasing in y.
///
/// Returns `None` for fewer than two points or when the direction changes
/// (including flat segments).
pub fn monotonicity(points: &[Point2D]) -> Option<Monotonicity> {
    if points.len() < 2 {
        return None;
    }
    if points.windows(2).all(|w| w[1].y > w[0].y) {
        Some(Monotonicity::Increasing)
    } else if points.windows(2).all(|w| w[1].y < w[0].y) {
        Some(Monotonicity::Decreasing)
    } else {
        None
    }
}

pub fn validate_monotonic(points: &[Point2D], what: &'static str) -> CalcResult<Monotonicity> {
    monotonicity(points).ok_or(CalcError::NonMonotonicCurve { what })
}

/// Ordered point set with unique abscissae, sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct Curve {
    points: Vec<Point2D>,
}

impl Curve {
    /// Build a curve from points in any order.
    pub fn new(points: &[Point2D]) -> CalcResult<Self> {
        Ok(Self {
            points: sort_by_x(points)?,
        })
    }

    /// Build a curve that must hold at least `required` points.
    pub fn with_min_points(
        points: &[Point2D],
        required: usize,
        what: &'static str,
    ) -> CalcResult<Self> {
        if points.len() < required {
            return Err(CalcError::InsufficientCurveData {
                what,
                required,
                actual: points.len(),
            });
        }
        Self::new(points)
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inclusive x range covered by the curve.
    pub fn domain(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.x, self.points.last()?.x))
    }

    pub fn interpolate(&self, x: f64) -> f64 {
        interpolate(&self.points, x)
    }

    pub fn monotonicity(&self) -> Option<Monotonicity> {
        monotonicity(&self.points)
    }

    /// Swap the axes of a strictly monotonic curve, giving x as a function of y.
    pub fn inverse(&self, what: &'static str) -> CalcResult<Curve> {
        validate_monotonic(&self.points, what)?;
        let swapped: Vec<Point2D> = self.points.iter().map(|p| Point2D::new(p.y, p.x)).collect();
        Curve::new(&swapped)
    }
}

impl TryFrom<Vec<Point2D>> for Curve {
    type Error = CalcError;

    fn try_from(points: Vec<Point2D>) -> CalcResult<Self> {
        Curve::new(&points)
    }
}

impl From<Curve> for Vec<Point2D> {
    fn from(curve: Curve) -> Self {
        curve.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pump_points() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 50.0),
            Point2D::new(10.0, 45.0),
            Point2D::new(20.0, 30.0),
            Point2D::new(30.0, 10.0),
        ]
    }

    #[test]
    fn interpolates_between_bracketing_points() {
        let pts = pump_points();
        assert!((interpolate(&pts, 25.0) - 20.0).abs() < 1e-12);
        assert!((interpolate(&pts, 5.0) - 47.5).abs() < 1e-12);
        assert_eq!(interpolate(&pts, 20.0), 30.0);
    }

    #[test]
    fn extrapolation_is_flat() {
        let pts = pump_points();
        assert_eq!(interpolate(&pts, -5.0), 50.0);
        assert_eq!(interpolate(&pts, 100.0), 10.0);
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        assert!(interpolate(&[], 1.0).is_nan());
        assert_eq!(interpolate(&[Point2D::new(2.0, 7.0)], -1.0), 7.0);
        assert!(interpolate(&pump_points(), f64::NAN).is_nan());
    }

    #[test]
    fn sort_rejects_duplicates() {
        let pts = vec![Point2D::new(1.0, 1.0), Point2D::new(1.0, 2.0)];
        let err = sort_by_x(&pts).unwrap_err();
        assert!(matches!(
            err,
            CalcError::DuplicateAbscissa { x, .. } if x == 1.0
        ));
    }

    #[test]
    fn sort_orders_ascending() {
        let pts = vec![
            Point2D::new(3.0, 0.0),
            Point2D::new(-1.0, 2.0),
            Point2D::new(1.0, 1.0),
        ];
        let sorted = sort_by_x(&pts).unwrap();
        let xs: Vec<f64> = sorted.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-1.0, 1.0, 3.0]);
    }

    #[test]
    fn monotonicity_classification() {
        assert_eq!(monotonicity(&pump_points()), Some(Monotonicity::Decreasing));
        let flat = [Point2D::new(0.0, 1.0), Point2D::new(1.0, 1.0)];
        assert_eq!(monotonicity(&flat), None);
        assert!(validate_monotonic(&flat, "flat").is_err());
    }

    #[test]
    fn inverse_swaps_axes() {
        let curve = Curve::new(&pump_points()).unwrap();
        let inv = curve.inverse("pump head").unwrap();
        assert_eq!(inv.domain(), Some((10.0, 50.0)));
        assert!((inv.interpolate(20.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn curve_deserialization_validates() {
        let ok: Curve = serde_json::from_str(r#"[{"x":2,"y":1},{"x":1,"y":3}]"#).unwrap();
        assert_eq!(ok.points()[0].x, 1.0);

        let bad = serde_json::from_str::<Curve>(r#"[{"x":1,"y":1},{"x":1,"y":3}]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn min_points_enforced() {
        let err = Curve::with_min_points(&[Point2D::new(0.0, 1.0)], 2, "pump curve").unwrap_err();
        assert!(matches!(
            err,
            CalcError::InsufficientCurveData {
                required: 2,
                actual: 1,
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn interpolation_is_stable_and_bounded(
            ys in prop::collection::vec(-100.0_f64..100.0, 2..8),
            x in -10.0_f64..20.0,
        ) {
            let pts: Vec<Point2D> = ys
                .iter()
                .enumerate()
                .map(|(i, &y)| Point2D::new(i as f64 * 1.5, y))
                .collect();
            let sorted = sort_by_x(&pts).unwrap();
            let first = interpolate(&sorted, x);
            let second = interpolate(&sort_by_x(&pts).unwrap(), x);
            prop_assert_eq!(first.to_bits(), second.to_bits());

            let lo = ys.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(first >= lo - 1e-9 && first <= hi + 1e-9);
        }
    }
}
