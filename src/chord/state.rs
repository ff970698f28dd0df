//! The chord-accumulation state machine.
//!
//! A chord episode opens with the first chord control pressed while none are
//! held; that press locks in the side (face buttons open a Right episode,
//! d-pad directions a Left one). Further chord controls accumulate into the
//! keymask. Resolution fires on release, not press: the mapping is keyed by
//! the set of held controls at the moment of the first release, so the
//! controls can be pressed in any order. Modifiers and thumbstick directions
//! bypass the chord entirely and pass through as held output keys.

use crate::chord::controls::{Control, Side};
use crate::chord::table::MappingTable;
use crate::device::emitter::{EmitterError, OutputEmitter};
use tracing::{debug, trace};

/// Mutable chord state, owned by the engine loop and mutated in place by
/// every processed event. Never shared across tasks.
#[derive(Debug, Default)]
pub struct ChordState {
    /// Currently-held chord controls, one bit per [`ChordControl`].
    ///
    /// [`ChordControl`]: crate::chord::controls::ChordControl
    held_mask: u8,

    /// Side of the episode in progress; `None` between episodes.
    side: Option<Side>,

    /// True while at least one chord control is held. Gates resolution so a
    /// chord fires on the first release of the episode, not on every bit
    /// clear.
    pressed: bool,

    /// Held modifier controls, independent of chord matching.
    modifier_mask: u8,

    /// Thumbstick directions currently synthesized as held keys.
    thumb_mask: u8,
}

impl ChordState {
    /// Handles a control press while keyboard mode is active.
    pub fn on_press(
        &mut self,
        control: Control,
        emitter: &mut dyn OutputEmitter,
    ) -> Result<(), EmitterError> {
        match control {
            Control::Chord(chord) => {
                if self.side.is_none() {
                    self.side = Some(chord.category());
                    debug!("Chord episode opened on {:?} side", chord.category());
                }
                self.held_mask |= chord.bit();
                self.pressed = true;
                trace!("held_mask={:#04x}", self.held_mask);
            }
            Control::Modifier(modifier) => {
                self.modifier_mask |= modifier.bit();
                emitter.press(modifier.output())?;
            }
            Control::Thumb(direction) => {
                self.thumb_mask |= direction.bit();
                emitter.press(direction.output())?;
            }
        }
        Ok(())
    }

    /// Handles a control release while keyboard mode is active.
    ///
    /// Any release arriving while a chord is held resolves the current
    /// keymask first; only a chord-control release then clears the gate, so
    /// the episode fires at most once through its own controls.
    pub fn on_release(
        &mut self,
        control: Control,
        table: &MappingTable,
        emitter: &mut dyn OutputEmitter,
    ) -> Result<(), EmitterError> {
        if self.pressed {
            if let Some(side) = self.side {
                for output in table.resolve(side, self.held_mask) {
                    debug!(
                        "Chord resolved: side={:?} keymask={:#04x} -> {:?}",
                        side, self.held_mask, output
                    );
                    emitter.tap(output)?;
                }
            }
        }

        match control {
            Control::Chord(chord) => {
                self.held_mask &= !chord.bit();
                self.pressed = false;
                if self.held_mask == 0 {
                    self.side = None;
                    trace!("Chord episode closed");
                }
            }
            Control::Modifier(modifier) => {
                self.modifier_mask &= !modifier.bit();
                emitter.release(modifier.output())?;
            }
            Control::Thumb(direction) => {
                self.thumb_mask &= !direction.bit();
                emitter.release(direction.output())?;
            }
        }
        Ok(())
    }

    /// Emits a key-up for every held modifier and thumbstick-direction key,
    /// then zeroes the whole state. Used when leaving keyboard mode so no
    /// synthetic key stays stuck for other consumers.
    pub fn release_held(&mut self, emitter: &mut dyn OutputEmitter) -> Result<(), EmitterError> {
        use crate::chord::controls::{ModifierControl, ThumbDirection};

        for modifier in ModifierControl::ALL {
            if self.modifier_mask & modifier.bit() != 0 {
                emitter.release(modifier.output())?;
            }
        }
        for direction in ThumbDirection::ALL {
            if self.thumb_mask & direction.bit() != 0 {
                emitter.release(direction.output())?;
            }
        }
        *self = Self::default();
        Ok(())
    }

    pub fn held_mask(&self) -> u8 {
        self.held_mask
    }

    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn modifier_mask(&self) -> u8 {
        self.modifier_mask
    }

    pub fn thumb_mask(&self) -> u8 {
        self.thumb_mask
    }
}
