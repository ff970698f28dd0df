//! Keyboard-mode toggling.
//!
//! The translator starts passive: gamepad events flow to the system
//! untouched and only the toggle button is watched. Activating grabs the
//! input device exclusively and routes everything through the chord logic.
//! Deactivating first releases every held synthetic key, then gives the
//! device back. Capture transitions that fail are fatal; running with an
//! uncertain grab state would either swallow or double-deliver every event.

use crate::chord::ChordState;
use crate::device::emitter::{EmitterError, OutputEmitter};
use crate::device::source::{ExclusiveCapture, SourceError};
use evdev::Key;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModeError {
    #[error("Capture transition failed: {0}")]
    Capture(#[from] SourceError),

    #[error("Failed to release held keys: {0}")]
    Emitter(#[from] EmitterError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Passive,
    Active,
}

/// Owns the passive/active flag and drives the transition sequences.
#[derive(Debug)]
pub struct ModeController {
    mode: DeviceMode,
    toggle: Key,
}

impl ModeController {
    pub fn new(toggle: Key) -> Self {
        Self {
            mode: DeviceMode::Passive,
            toggle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode == DeviceMode::Active
    }

    pub fn toggle_key(&self) -> Key {
        self.toggle
    }

    /// Flips the mode, running the matching transition sequence.
    pub fn toggle(
        &mut self,
        state: &mut ChordState,
        capture: &mut dyn ExclusiveCapture,
        emitter: &mut dyn OutputEmitter,
    ) -> Result<(), ModeError> {
        match self.mode {
            DeviceMode::Passive => self.activate(capture),
            DeviceMode::Active => self.deactivate(state, capture, emitter),
        }
    }

    fn activate(&mut self, capture: &mut dyn ExclusiveCapture) -> Result<(), ModeError> {
        capture.acquire_exclusive()?;
        self.mode = DeviceMode::Active;
        info!("Keyboard mode activated");
        Ok(())
    }

    /// Held keys are released before the capture so the key-up events still
    /// reach consumers of the virtual device in order.
    pub fn deactivate(
        &mut self,
        state: &mut ChordState,
        capture: &mut dyn ExclusiveCapture,
        emitter: &mut dyn OutputEmitter,
    ) -> Result<(), ModeError> {
        state.release_held(emitter)?;
        capture.release_exclusive()?;
        self.mode = DeviceMode::Passive;
        info!("Keyboard mode deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::controls::{Control, ModifierControl};
    use crate::device::emitter::testing::RecordingEmitter;
    use crate::device::source::testing::FakeCapture;

    fn controller() -> ModeController {
        ModeController::new(Key::BTN_MODE)
    }

    #[test]
    fn toggle_alternates_between_modes() {
        let mut mode = controller();
        let mut state = ChordState::default();
        let mut capture = FakeCapture::default();
        let mut emitter = RecordingEmitter::default();

        assert!(!mode.is_active());
        mode.toggle(&mut state, &mut capture, &mut emitter).unwrap();
        assert!(mode.is_active());
        assert_eq!(capture.acquired, 1);

        mode.toggle(&mut state, &mut capture, &mut emitter).unwrap();
        assert!(!mode.is_active());
        assert_eq!(capture.released, 1);
    }

    #[test]
    fn deactivation_releases_held_keys_before_capture() {
        let mut mode = controller();
        let mut state = ChordState::default();
        let mut capture = FakeCapture::default();
        let mut emitter = RecordingEmitter::default();

        mode.toggle(&mut state, &mut capture, &mut emitter).unwrap();
        state
            .on_press(Control::Modifier(ModifierControl::Shift), &mut emitter)
            .unwrap();
        state
            .on_press(Control::Modifier(ModifierControl::Alt), &mut emitter)
            .unwrap();

        mode.toggle(&mut state, &mut capture, &mut emitter).unwrap();
        assert_eq!(emitter.releases().len(), 2);
        assert_eq!(state.modifier_mask(), 0);
        assert_eq!(capture.released, 1);
    }

    #[test]
    fn failed_acquire_leaves_mode_passive() {
        let mut mode = controller();
        let mut state = ChordState::default();
        let mut capture = FakeCapture {
            fail_acquire: true,
            ..Default::default()
        };
        let mut emitter = RecordingEmitter::default();

        let result = mode.toggle(&mut state, &mut capture, &mut emitter);
        assert!(result.is_err());
        assert!(!mode.is_active());
    }

    #[test]
    fn failed_release_surfaces_error() {
        let mut mode = controller();
        let mut state = ChordState::default();
        let mut capture = FakeCapture::default();
        let mut emitter = RecordingEmitter::default();

        mode.toggle(&mut state, &mut capture, &mut emitter).unwrap();
        capture.fail_release = true;
        let result = mode.toggle(&mut state, &mut capture, &mut emitter);
        assert!(result.is_err());
    }
}
