//! Classification of physical controls into the roles the chord logic knows about.
//!
//! Every input the engine processes is first sorted into one of three roles:
//! chord controls (face buttons and d-pad directions, accumulated into a
//! keymask), modifiers (shoulders and triggers, held 1:1 as output modifier
//! keys) and thumbstick directions (1:1 directional key passthroughs).

use crate::chord::axis::AxisId;
use evdev::Key;

/// Which half of the controller started the current chord episode.
///
/// The same keymask resolves to different output keys depending on the side,
/// doubling the vocabulary of the 8-bit chord space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// The eight chord-eligible controls, one bit each in the keymask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChordControl {
    FaceSouth = 0,
    FaceEast = 1,
    FaceWest = 2,
    FaceNorth = 3,
    DpadUp = 4,
    DpadDown = 5,
    DpadLeft = 6,
    DpadRight = 7,
}

impl ChordControl {
    pub const ALL: [ChordControl; 8] = [
        ChordControl::FaceSouth,
        ChordControl::FaceEast,
        ChordControl::FaceWest,
        ChordControl::FaceNorth,
        ChordControl::DpadUp,
        ChordControl::DpadDown,
        ChordControl::DpadLeft,
        ChordControl::DpadRight,
    ];

    /// Bit of this control in the chord keymask.
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Side category used when this control opens a chord episode.
    pub const fn category(self) -> Side {
        match self {
            ChordControl::FaceSouth
            | ChordControl::FaceEast
            | ChordControl::FaceWest
            | ChordControl::FaceNorth => Side::Right,
            ChordControl::DpadUp
            | ChordControl::DpadDown
            | ChordControl::DpadLeft
            | ChordControl::DpadRight => Side::Left,
        }
    }

    /// Maps a binarized hat-axis step to the d-pad direction it represents.
    pub fn from_hat(axis: AxisId, value: i8) -> Option<Self> {
        match (axis, value) {
            (AxisId::HatX, -1) => Some(ChordControl::DpadLeft),
            (AxisId::HatX, 1) => Some(ChordControl::DpadRight),
            (AxisId::HatY, -1) => Some(ChordControl::DpadUp),
            (AxisId::HatY, 1) => Some(ChordControl::DpadDown),
            _ => None,
        }
    }
}

/// Shoulder and trigger controls held 1:1 as output modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModifierControl {
    Shift = 0,
    Ctrl = 1,
    Alt = 2,
    Meta = 3,
}

impl ModifierControl {
    pub const ALL: [ModifierControl; 4] = [
        ModifierControl::Shift,
        ModifierControl::Ctrl,
        ModifierControl::Alt,
        ModifierControl::Meta,
    ];

    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// The synthetic modifier key held while this control is held.
    pub const fn output(self) -> Key {
        match self {
            ModifierControl::Shift => Key::KEY_LEFTSHIFT,
            ModifierControl::Ctrl => Key::KEY_LEFTCTRL,
            ModifierControl::Alt => Key::KEY_LEFTALT,
            ModifierControl::Meta => Key::KEY_LEFTMETA,
        }
    }
}

/// Thumbstick directions synthesized as plain directional key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ThumbDirection {
    LeftUp = 0,
    LeftDown = 1,
    LeftLeft = 2,
    LeftRight = 3,
    RightUp = 4,
    RightDown = 5,
    RightLeft = 6,
    RightRight = 7,
}

impl ThumbDirection {
    pub const ALL: [ThumbDirection; 8] = [
        ThumbDirection::LeftUp,
        ThumbDirection::LeftDown,
        ThumbDirection::LeftLeft,
        ThumbDirection::LeftRight,
        ThumbDirection::RightUp,
        ThumbDirection::RightDown,
        ThumbDirection::RightLeft,
        ThumbDirection::RightRight,
    ];

    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// The directional key pressed while the stick is deflected this way.
    pub const fn output(self) -> Key {
        match self {
            ThumbDirection::LeftUp => Key::KEY_UP,
            ThumbDirection::LeftDown => Key::KEY_DOWN,
            ThumbDirection::LeftLeft => Key::KEY_LEFT,
            ThumbDirection::LeftRight => Key::KEY_RIGHT,
            ThumbDirection::RightUp => Key::KEY_PAGEUP,
            ThumbDirection::RightDown => Key::KEY_PAGEDOWN,
            ThumbDirection::RightLeft => Key::KEY_HOME,
            ThumbDirection::RightRight => Key::KEY_END,
        }
    }

    /// Maps a binarized stick-axis step to a direction. Up is negative on
    /// evdev Y axes.
    pub fn from_stick(axis: AxisId, value: i8) -> Option<Self> {
        match (axis, value) {
            (AxisId::LeftX, -1) => Some(ThumbDirection::LeftLeft),
            (AxisId::LeftX, 1) => Some(ThumbDirection::LeftRight),
            (AxisId::LeftY, -1) => Some(ThumbDirection::LeftUp),
            (AxisId::LeftY, 1) => Some(ThumbDirection::LeftDown),
            (AxisId::RightX, -1) => Some(ThumbDirection::RightLeft),
            (AxisId::RightX, 1) => Some(ThumbDirection::RightRight),
            (AxisId::RightY, -1) => Some(ThumbDirection::RightUp),
            (AxisId::RightY, 1) => Some(ThumbDirection::RightDown),
            _ => None,
        }
    }
}

/// A classified control, ready for the chord state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Chord(ChordControl),
    Modifier(ModifierControl),
    Thumb(ThumbDirection),
}

impl Control {
    /// Classifies a key event code. Returns `None` for controls the chord
    /// logic does not know about; those are discarded by the engine.
    pub fn from_key(key: Key) -> Option<Control> {
        match key {
            Key::BTN_SOUTH => Some(Control::Chord(ChordControl::FaceSouth)),
            Key::BTN_EAST => Some(Control::Chord(ChordControl::FaceEast)),
            Key::BTN_WEST => Some(Control::Chord(ChordControl::FaceWest)),
            Key::BTN_NORTH => Some(Control::Chord(ChordControl::FaceNorth)),
            Key::BTN_DPAD_UP => Some(Control::Chord(ChordControl::DpadUp)),
            Key::BTN_DPAD_DOWN => Some(Control::Chord(ChordControl::DpadDown)),
            Key::BTN_DPAD_LEFT => Some(Control::Chord(ChordControl::DpadLeft)),
            Key::BTN_DPAD_RIGHT => Some(Control::Chord(ChordControl::DpadRight)),
            Key::BTN_TR => Some(Control::Modifier(ModifierControl::Shift)),
            Key::BTN_TL => Some(Control::Modifier(ModifierControl::Ctrl)),
            Key::BTN_TL2 => Some(Control::Modifier(ModifierControl::Alt)),
            Key::BTN_TR2 => Some(Control::Modifier(ModifierControl::Meta)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_are_right_side_chord_controls() {
        let control = Control::from_key(Key::BTN_SOUTH);
        assert_eq!(control, Some(Control::Chord(ChordControl::FaceSouth)));
        assert_eq!(ChordControl::FaceSouth.category(), Side::Right);
    }

    #[test]
    fn dpad_buttons_are_left_side_chord_controls() {
        let control = Control::from_key(Key::BTN_DPAD_UP);
        assert_eq!(control, Some(Control::Chord(ChordControl::DpadUp)));
        assert_eq!(ChordControl::DpadUp.category(), Side::Left);
    }

    #[test]
    fn shoulders_and_triggers_are_modifiers() {
        assert_eq!(
            Control::from_key(Key::BTN_TR),
            Some(Control::Modifier(ModifierControl::Shift))
        );
        assert_eq!(
            Control::from_key(Key::BTN_TR2),
            Some(Control::Modifier(ModifierControl::Meta))
        );
    }

    #[test]
    fn unknown_keys_are_not_classified() {
        assert_eq!(Control::from_key(Key::BTN_THUMBL), None);
        assert_eq!(Control::from_key(Key::KEY_A), None);
    }

    #[test]
    fn chord_bits_are_distinct() {
        let controls = [
            ChordControl::FaceSouth,
            ChordControl::FaceEast,
            ChordControl::FaceWest,
            ChordControl::FaceNorth,
            ChordControl::DpadUp,
            ChordControl::DpadDown,
            ChordControl::DpadLeft,
            ChordControl::DpadRight,
        ];
        let mut mask = 0u8;
        for control in controls {
            assert_eq!(mask & control.bit(), 0);
            mask |= control.bit();
        }
        assert_eq!(mask, 0xFF);
    }

    #[test]
    fn hat_steps_map_to_dpad_directions() {
        assert_eq!(
            ChordControl::from_hat(AxisId::HatY, -1),
            Some(ChordControl::DpadUp)
        );
        assert_eq!(
            ChordControl::from_hat(AxisId::HatX, 1),
            Some(ChordControl::DpadRight)
        );
        assert_eq!(ChordControl::from_hat(AxisId::LeftX, 1), None);
    }

    #[test]
    fn stick_steps_map_to_thumb_directions() {
        assert_eq!(
            ThumbDirection::from_stick(AxisId::LeftY, -1),
            Some(ThumbDirection::LeftUp)
        );
        assert_eq!(
            ThumbDirection::from_stick(AxisId::RightX, 1),
            Some(ThumbDirection::RightRight)
        );
        assert_eq!(ThumbDirection::from_stick(AxisId::HatX, 1), None);
    }
}
