//! Synthetic key output through a uinput virtual keyboard.
//!
//! Every press/release is written as one event batch, which the evdev crate
//! terminates with a SYN_REPORT. Consumers therefore observe each call as a
//! complete, ordered event and never a partial write.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Highest key code the kernel accepts (KEY_MAX).
const KEY_CODE_LIMIT: u16 = 0x2ff;

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("Failed to create virtual output device: {0}")]
    DeviceCreation(#[source] std::io::Error),

    #[error("Failed to write key event: {0}")]
    Write(#[from] std::io::Error),
}

/// Output side of the translator. The chord logic only ever asks for
/// presses and releases; `tap` is the press-then-release convenience used
/// for resolved chords.
pub trait OutputEmitter: Send {
    fn press(&mut self, key: Key) -> Result<(), EmitterError>;

    fn release(&mut self, key: Key) -> Result<(), EmitterError>;

    fn tap(&mut self, key: Key) -> Result<(), EmitterError> {
        self.press(key)?;
        self.release(key)
    }
}

/// uinput-backed emitter.
pub struct UinputEmitter {
    device: VirtualDevice,
}

impl UinputEmitter {
    /// Creates the virtual keyboard and registers the given key codes.
    ///
    /// A code the kernel cannot register is skipped with a warning; that key
    /// will simply never be emitted. Failure to create the device itself is
    /// fatal.
    pub fn create(name: &str, codes: &[Key]) -> Result<Self, EmitterError> {
        let mut keys = AttributeSet::<Key>::new();
        for &key in codes {
            if key.code() > KEY_CODE_LIMIT {
                warn!("Skipping unregistrable key code {}", key.code());
                continue;
            }
            keys.insert(key);
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(EmitterError::DeviceCreation)?
            .name(name)
            .with_keys(&keys)
            .map_err(EmitterError::DeviceCreation)?
            .build()
            .map_err(EmitterError::DeviceCreation)?;

        info!("Created virtual output device: {}", name);
        Ok(Self { device })
    }

    fn emit_key(&mut self, key: Key, value: i32) -> Result<(), EmitterError> {
        debug!("emit {:?} value={}", key, value);
        let event = InputEvent::new(EventType::KEY, key.code(), value);
        self.device.emit(&[event])?;
        Ok(())
    }
}

impl OutputEmitter for UinputEmitter {
    fn press(&mut self, key: Key) -> Result<(), EmitterError> {
        self.emit_key(key, KEY_PRESS)
    }

    fn release(&mut self, key: Key) -> Result<(), EmitterError> {
        self.emit_key(key, KEY_RELEASE)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records emissions in order for assertions; `true` marks a press.
    #[derive(Debug, Default)]
    pub struct RecordingEmitter {
        pub events: Vec<(Key, bool)>,
    }

    impl RecordingEmitter {
        pub fn presses(&self) -> Vec<Key> {
            self.events
                .iter()
                .filter(|(_, pressed)| *pressed)
                .map(|(key, _)| *key)
                .collect()
        }

        pub fn releases(&self) -> Vec<Key> {
            self.events
                .iter()
                .filter(|(_, pressed)| !*pressed)
                .map(|(key, _)| *key)
                .collect()
        }

        /// Keys emitted as an immediate press/release pair.
        pub fn taps(&self) -> Vec<Key> {
            self.events
                .windows(2)
                .filter(|pair| pair[0].1 && !pair[1].1 && pair[0].0 == pair[1].0)
                .map(|pair| pair[0].0)
                .collect()
        }
    }

    impl OutputEmitter for RecordingEmitter {
        fn press(&mut self, key: Key) -> Result<(), EmitterError> {
            self.events.push((key, true));
            Ok(())
        }

        fn release(&mut self, key: Key) -> Result<(), EmitterError> {
            self.events.push((key, false));
            Ok(())
        }
    }
}
