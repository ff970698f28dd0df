//! Binarization of analog stick samples into discrete directions.
//!
//! Raw stick samples arrive as unsigned bytes centered around 127. The
//! normalizer converts them to one of {-1, 0, +1} with a hysteresis band
//! around the threshold so a stick resting near the boundary does not
//! oscillate between pressed and released. The d-pad hat is carried through
//! the same tracking as two always-digital axes.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rest position of a raw stick sample.
pub const AXIS_CENTER: i32 = 127;

/// Threshold and hysteresis for stick binarization, in raw sample units.
///
/// A deflection enters the +1/-1 state once it exceeds
/// `threshold + hysteresis` from center and returns to neutral once it drops
/// below `threshold - hysteresis`. Samples between the two boundaries keep
/// the previous state.
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct AxisSettings {
    pub threshold: i32,
    pub hysteresis: i32,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            threshold: 64,
            hysteresis: 20,
        }
    }
}

impl AxisSettings {
    /// Returns settings guaranteed to binarize correctly, replacing an
    /// unusable pair with the defaults.
    ///
    /// `hysteresis >= threshold` puts the exit bound at or below zero, so a
    /// deflected stick could never release again; a non-positive threshold
    /// breaks the band the same way.
    pub fn sanitized(self) -> Self {
        if self.threshold > 0 && self.hysteresis >= 0 && self.hysteresis < self.threshold {
            self
        } else {
            warn!(
                "Unusable axis settings (threshold={}, hysteresis={}), using defaults",
                self.threshold, self.hysteresis
            );
            Self::default()
        }
    }
}

/// The six tracked axes: two sticks with two axes each, plus the d-pad hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisId {
    LeftX,
    LeftY,
    RightX,
    RightY,
    HatX,
    HatY,
}

impl AxisId {
    /// Maps an EV_ABS event code to a tracked axis.
    pub fn from_abs(code: u16) -> Option<Self> {
        use evdev::AbsoluteAxisType;
        match code {
            c if c == AbsoluteAxisType::ABS_X.0 => Some(AxisId::LeftX),
            c if c == AbsoluteAxisType::ABS_Y.0 => Some(AxisId::LeftY),
            c if c == AbsoluteAxisType::ABS_RX.0 => Some(AxisId::RightX),
            c if c == AbsoluteAxisType::ABS_RY.0 => Some(AxisId::RightY),
            c if c == AbsoluteAxisType::ABS_HAT0X.0 => Some(AxisId::HatX),
            c if c == AbsoluteAxisType::ABS_HAT0Y.0 => Some(AxisId::HatY),
            _ => None,
        }
    }

    /// Hat axes carry -1/0/+1 directly and skip thresholding.
    pub fn is_hat(self) -> bool {
        matches!(self, AxisId::HatX | AxisId::HatY)
    }

    fn index(self) -> usize {
        match self {
            AxisId::LeftX => 0,
            AxisId::LeftY => 1,
            AxisId::RightX => 2,
            AxisId::RightY => 3,
            AxisId::HatX => 4,
            AxisId::HatY => 5,
        }
    }
}

/// One normalized transition on an axis.
///
/// `previous` is the state the axis left; consumers release the direction of
/// `previous` when `value` is 0 and press the direction of `value` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisStep {
    pub axis: AxisId,
    pub previous: i8,
    pub value: i8,
}

/// Per-axis binarization state. One instance lives in the engine for the
/// process lifetime; trackers deliberately survive mode exits.
#[derive(Debug)]
pub struct AxisNormalizer {
    settings: AxisSettings,
    last: [i8; 6],
}

impl AxisNormalizer {
    pub fn new(settings: AxisSettings) -> Self {
        Self {
            settings,
            last: [0; 6],
        }
    }

    /// Feeds one raw sample and returns the resulting transitions.
    ///
    /// Returns an empty vec when the sample does not change the normalized
    /// state (dedup) or falls inside the hysteresis band. A direct flip
    /// between +1 and -1 yields two steps, the intermediate release first,
    /// because downstream consumers assume press/release alternation.
    pub fn feed(&mut self, axis: AxisId, raw: i32) -> Vec<AxisStep> {
        let normalized = if axis.is_hat() {
            raw.signum() as i8
        } else {
            match self.binarize(raw) {
                Some(value) => value,
                None => return Vec::new(),
            }
        };

        let previous = self.last[axis.index()];
        if normalized == previous {
            return Vec::new();
        }
        self.last[axis.index()] = normalized;

        if previous != 0 && normalized != 0 {
            vec![
                AxisStep {
                    axis,
                    previous,
                    value: 0,
                },
                AxisStep {
                    axis,
                    previous: 0,
                    value: normalized,
                },
            ]
        } else {
            vec![AxisStep {
                axis,
                previous,
                value: normalized,
            }]
        }
    }

    fn binarize(&self, raw: i32) -> Option<i8> {
        let d = raw.clamp(0, 255) - AXIS_CENTER;
        let enter = self.settings.threshold + self.settings.hysteresis;
        let exit = self.settings.threshold - self.settings.hysteresis;
        if d > enter {
            Some(1)
        } else if d < -enter {
            Some(-1)
        } else if d.abs() < exit {
            Some(0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> AxisNormalizer {
        AxisNormalizer::new(AxisSettings::default())
    }

    #[test]
    fn constant_value_produces_single_transition() {
        let mut n = normalizer();
        let steps = n.feed(AxisId::LeftX, 255);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].value, 1);
        for _ in 0..5 {
            assert!(n.feed(AxisId::LeftX, 255).is_empty());
        }
    }

    #[test]
    fn dead_band_retains_previous_state() {
        let mut n = normalizer();
        assert_eq!(n.feed(AxisId::LeftX, 255).len(), 1);
        // d = 50 sits between exit (44) and enter (84): no event either way.
        assert!(n.feed(AxisId::LeftX, 177).is_empty());
        assert!(n.feed(AxisId::LeftX, 180).is_empty());
        // Back to center releases.
        let steps = n.feed(AxisId::LeftX, 127);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].previous, 1);
        assert_eq!(steps[0].value, 0);
    }

    #[test]
    fn enter_boundary_is_exclusive() {
        let mut n = normalizer();
        // d = 84 == threshold + hysteresis: still inside the band.
        assert!(n.feed(AxisId::RightY, 211).is_empty());
        // d = 85: past the band, press.
        assert_eq!(n.feed(AxisId::RightY, 212).len(), 1);
    }

    #[test]
    fn direct_flip_synthesizes_release_first() {
        let mut n = normalizer();
        assert_eq!(n.feed(AxisId::LeftY, 255).len(), 1);
        let steps = n.feed(AxisId::LeftY, 0);
        assert_eq!(steps.len(), 2);
        assert_eq!((steps[0].previous, steps[0].value), (1, 0));
        assert_eq!((steps[1].previous, steps[1].value), (0, -1));
    }

    #[test]
    fn hat_axes_skip_thresholding_but_dedup() {
        let mut n = normalizer();
        let steps = n.feed(AxisId::HatY, -1);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].value, -1);
        assert!(n.feed(AxisId::HatY, -1).is_empty());
        // Direct up -> down flip.
        let steps = n.feed(AxisId::HatY, 1);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].value, 0);
        assert_eq!(steps[1].value, 1);
    }

    #[test]
    fn inverted_settings_fall_back_so_release_still_fires() {
        let settings = AxisSettings {
            threshold: 40,
            hysteresis: 50,
        }
        .sanitized();
        let mut n = AxisNormalizer::new(settings);
        assert_eq!(n.feed(AxisId::LeftX, 255).len(), 1);
        // Centering must release; with the raw pair the exit bound would be
        // negative and the direction key would stay latched.
        let steps = n.feed(AxisId::LeftX, 127);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].value, 0);
    }

    #[test]
    fn non_positive_threshold_falls_back_to_defaults() {
        let settings = AxisSettings {
            threshold: 0,
            hysteresis: 0,
        }
        .sanitized();
        assert_eq!(settings.threshold, 64);
        assert_eq!(settings.hysteresis, 20);
    }

    #[test]
    fn axes_are_tracked_independently() {
        let mut n = normalizer();
        assert_eq!(n.feed(AxisId::LeftX, 255).len(), 1);
        assert_eq!(n.feed(AxisId::RightX, 255).len(), 1);
        assert_eq!(n.feed(AxisId::LeftX, 127).len(), 1);
        assert!(n.feed(AxisId::RightX, 255).is_empty());
    }
}
