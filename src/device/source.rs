//! The physical input side: an evdev gamepad device and exclusive capture.

use evdev::{Device, EventStream, InputEvent, Key};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open input device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No gamepad-like input device found")]
    NoDevice,

    #[error("Failed to read input event: {0}")]
    Read(#[from] io::Error),

    #[error("Failed to acquire exclusive capture: {0}")]
    Acquire(#[source] io::Error),

    #[error("Failed to release exclusive capture: {0}")]
    Release(#[source] io::Error),
}

/// Exclusive ownership of the input source (EVIOCGRAB). While captured, the
/// device's events no longer propagate to any other consumer. Both
/// operations are fatal on failure: the system must never run believing it
/// holds the capture when it does not, or vice versa.
pub trait ExclusiveCapture {
    fn acquire_exclusive(&mut self) -> Result<(), SourceError>;

    fn release_exclusive(&mut self) -> Result<(), SourceError>;
}

/// Blocking-read event source over an evdev device.
pub struct EvdevSource {
    stream: EventStream,
}

impl EvdevSource {
    /// Opens the configured device, or autodetects the first enumerated
    /// device that exposes BTN_SOUTH when no path is given.
    pub fn open(path: Option<&Path>) -> Result<Self, SourceError> {
        let (path, device) = match path {
            Some(path) => {
                let device = Device::open(path).map_err(|source| SourceError::Open {
                    path: path.to_path_buf(),
                    source,
                })?;
                (path.to_path_buf(), device)
            }
            None => Self::autodetect()?,
        };

        info!(
            "Using input device {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed")
        );

        let stream = device.into_event_stream()?;
        Ok(Self { stream })
    }

    fn autodetect() -> Result<(PathBuf, Device), SourceError> {
        for (path, device) in evdev::enumerate() {
            let is_gamepad = device
                .supported_keys()
                .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
            if is_gamepad {
                return Ok((path, device));
            }
            debug!("Skipping {}: no gamepad keys", path.display());
        }
        Err(SourceError::NoDevice)
    }

    /// Waits for the next raw input sample. Read errors are fatal.
    pub async fn next_event(&mut self) -> Result<InputEvent, SourceError> {
        Ok(self.stream.next_event().await?)
    }
}

impl ExclusiveCapture for EvdevSource {
    fn acquire_exclusive(&mut self) -> Result<(), SourceError> {
        self.stream
            .device_mut()
            .grab()
            .map_err(SourceError::Acquire)?;
        info!("Acquired exclusive capture of input device");
        Ok(())
    }

    fn release_exclusive(&mut self) -> Result<(), SourceError> {
        self.stream
            .device_mut()
            .ungrab()
            .map_err(SourceError::Release)?;
        info!("Released exclusive capture of input device");
        Ok(())
    }
}
