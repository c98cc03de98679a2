//! On/off level control with hysteresis.

use pf_core::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};

/// Starts the pump at `high_level`, stops it at `low_level`.
///
/// Between the two levels the pump keeps its previous state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnOffControl {
    pub high_level: f64,
    pub low_level: f64,
}

impl OnOffControl {
    pub fn new(high_level: f64, low_level: f64) -> CalcResult<Self> {
        let control = Self {
            high_level,
            low_level,
        };
        control.validate()?;
        Ok(control)
    }

    /// Check a control that may have been deserialized directly.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.high_level.is_finite() || !self.low_level.is_finite() {
            return Err(CalcError::config("on/off control levels must be finite"));
        }
        if self.high_level <= self.low_level {
            return Err(CalcError::config(format!(
                "on/off control high level {} must exceed low level {}",
                self.high_level, self.low_level
            )));
        }
        Ok(())
    }

    /// Pump state before any history exists.
    pub fn initial_state(&self, level: f64) -> bool {
        level >= self.high_level
    }

    /// Next pump state given the current one and the tank level.
    pub fn update(&self, running: bool, level: f64) -> bool {
        if level >= self.high_level {
            true
        } else if level <= self.low_level {
            false
        } else {
            running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_inverted_levels() {
        assert!(OnOffControl::new(1.0, 2.0).is_err());
        assert!(OnOffControl::new(1.0, 1.0).is_err());
        assert!(OnOffControl::new(f64::NAN, 1.0).is_err());
        assert!(OnOffControl::new(2.0, 1.0).is_ok());
    }

    #[test]
    fn hysteresis_cycle() {
        let c = OnOffControl::new(2.0, 1.0).unwrap();
        let mut on = c.initial_state(1.5);
        assert!(!on);
        let steps = [
            (1.8, false),
            (2.0, true),
            (1.5, true),
            (1.0, false),
            (1.5, false),
        ];
        for (level, expected) in steps {
            on = c.update(on, level);
            assert_eq!(on, expected, "level {level}");
        }
    }

    proptest! {
        #[test]
        fn state_only_changes_outside_band(
            running in any::<bool>(),
            level in -1.0_f64..4.0,
        ) {
            let c = OnOffControl::new(2.0, 1.0).unwrap();
            let next = c.update(running, level);
            if level >= 2.0 {
                prop_assert!(next);
            } else if level <= 1.0 {
                prop_assert!(!next);
            } else {
                prop_assert_eq!(next, running);
            }
        }
    }
}
