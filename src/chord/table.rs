//! The static chord mapping table.
//!
//! An immutable ordered list of (side, keymask, output key) triples built
//! once at startup. Lookup is a linear scan; at this table size exactness
//! matters more than speed. Entries with a zero keymask never resolve: they
//! only pre-declare keys the virtual output device must be able to emit.

use crate::chord::controls::{ChordControl, ModifierControl, Side, ThumbDirection};
use evdev::Key;
use tracing::warn;

/// One chord resolution: while `side` is locked in and exactly the controls
/// of `keymask` are held, the first release taps `output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub side: Side,
    pub keymask: u8,
    pub output: Key,
}

const S: u8 = ChordControl::FaceSouth.bit();
const E: u8 = ChordControl::FaceEast.bit();
const W: u8 = ChordControl::FaceWest.bit();
const N: u8 = ChordControl::FaceNorth.bit();
const U: u8 = ChordControl::DpadUp.bit();
const D: u8 = ChordControl::DpadDown.bit();
const L: u8 = ChordControl::DpadLeft.bit();
const R: u8 = ChordControl::DpadRight.bit();

/// Chords for episodes opened on the face buttons. Letters roughly by
/// frequency: the lightest chords carry the most common letters.
const RIGHT_CHORDS: &[(u8, Key)] = &[
    (S, Key::KEY_E),
    (E, Key::KEY_T),
    (W, Key::KEY_A),
    (N, Key::KEY_O),
    (S | E, Key::KEY_I),
    (S | W, Key::KEY_N),
    (S | N, Key::KEY_S),
    (E | W, Key::KEY_H),
    (E | N, Key::KEY_R),
    (W | N, Key::KEY_D),
    (S | E | W, Key::KEY_L),
    (S | E | N, Key::KEY_C),
    (S | W | N, Key::KEY_U),
    (E | W | N, Key::KEY_M),
    (S | E | W | N, Key::KEY_W),
    (S | U, Key::KEY_F),
    (S | D, Key::KEY_G),
    (S | L, Key::KEY_Y),
    (S | R, Key::KEY_P),
    (E | U, Key::KEY_B),
    (E | D, Key::KEY_V),
    (E | L, Key::KEY_K),
    (E | R, Key::KEY_J),
    (W | U, Key::KEY_X),
    (W | D, Key::KEY_Q),
    (W | L, Key::KEY_Z),
    (W | R, Key::KEY_DOT),
    (N | U, Key::KEY_COMMA),
    (N | D, Key::KEY_APOSTROPHE),
    (N | L, Key::KEY_SLASH),
    (N | R, Key::KEY_SEMICOLON),
];

/// Chords for episodes opened on the d-pad: whitespace, editing keys, digits
/// and the remaining symbols.
const LEFT_CHORDS: &[(u8, Key)] = &[
    (U, Key::KEY_SPACE),
    (D, Key::KEY_ENTER),
    (L, Key::KEY_BACKSPACE),
    (R, Key::KEY_TAB),
    (U | L, Key::KEY_ESC),
    (U | R, Key::KEY_DELETE),
    (D | L, Key::KEY_MINUS),
    (D | R, Key::KEY_EQUAL),
    (U | S, Key::KEY_1),
    (U | E, Key::KEY_2),
    (U | W, Key::KEY_3),
    (U | N, Key::KEY_4),
    (D | S, Key::KEY_5),
    (D | E, Key::KEY_6),
    (D | W, Key::KEY_7),
    (D | N, Key::KEY_8),
    (L | S, Key::KEY_9),
    (L | E, Key::KEY_0),
    (L | W, Key::KEY_LEFTBRACE),
    (L | N, Key::KEY_RIGHTBRACE),
    (R | S, Key::KEY_GRAVE),
    (R | E, Key::KEY_BACKSLASH),
    (R | W, Key::KEY_APOSTROPHE),
    (R | N, Key::KEY_DOT),
];

/// Keys declared on the output device without a chord of their own.
const REGISTRATION_ONLY: &[(Side, Key)] = &[
    (Side::Right, Key::KEY_CAPSLOCK),
    (Side::Left, Key::KEY_COMPOSE),
];

/// Immutable chord lookup table.
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn from_entries(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    /// Builds the built-in layout.
    pub fn default_table() -> Self {
        let mut entries = Vec::new();
        for &(keymask, output) in RIGHT_CHORDS {
            entries.push(MappingEntry {
                side: Side::Right,
                keymask,
                output,
            });
        }
        for &(keymask, output) in LEFT_CHORDS {
            entries.push(MappingEntry {
                side: Side::Left,
                keymask,
                output,
            });
        }
        for &(side, output) in REGISTRATION_ONLY {
            entries.push(MappingEntry {
                side,
                keymask: 0,
                output,
            });
        }
        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// All entries resolving the given side and exact keymask.
    /// Registration-only entries are excluded.
    pub fn resolve(&self, side: Side, keymask: u8) -> impl Iterator<Item = Key> + '_ {
        self.entries
            .iter()
            .filter(move |entry| {
                entry.keymask != 0 && entry.side == side && entry.keymask == keymask
            })
            .map(|entry| entry.output)
    }

    /// Every key code the output device must support: all table outputs plus
    /// the modifier and thumbstick-direction keys.
    pub fn registered_codes(&self) -> Vec<Key> {
        let mut codes: Vec<Key> = self.entries.iter().map(|entry| entry.output).collect();
        codes.extend(ModifierControl::ALL.iter().map(|m| m.output()));
        codes.extend(ThumbDirection::ALL.iter().map(|t| t.output()));
        codes.sort_by_key(|key| key.code());
        codes.dedup();
        codes
    }

    /// Warns about duplicate (side, keymask) pairs. Duplicates are a
    /// data-authoring mistake, not a runtime fault: all matches still fire.
    pub fn validate(&self) {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.keymask == 0 {
                continue;
            }
            let duplicate = self.entries[..i]
                .iter()
                .any(|other| other.side == entry.side && other.keymask == entry.keymask);
            if duplicate {
                warn!(
                    "Duplicate chord entry: side={:?} keymask={:#04x} ({:?})",
                    entry.side, entry.keymask, entry.output
                );
            }
        }
    }
}
