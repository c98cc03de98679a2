//! TransientModel trait for explicitly integrated systems.

/// A dynamic system x' = f(t, x).
///
/// Discrete parts of the state (switch positions, modes) are carried through
/// `add` and `scale` unchanged from the base state, so they stay constant
/// across a single integration step.
pub trait TransientModel {
    type State: Clone;

    fn initial_state(&self) -> Self::State;

    /// State derivative at (t, x).
    fn rhs(&self, t: f64, x: &Self::State) -> Self::State;

    /// a + b, keeping the discrete part of `a`.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// scale · a
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
