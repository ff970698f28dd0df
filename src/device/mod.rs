//! Physical device endpoints: the evdev input source and the uinput output
//! emitter.

pub mod emitter;
pub mod source;

pub use emitter::{EmitterError, OutputEmitter, UinputEmitter};
pub use source::{EvdevSource, ExclusiveCapture, SourceError};
