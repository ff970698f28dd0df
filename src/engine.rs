//! The translator engine with a statum state machine for its lifecycle.
//!
//! One engine owns the whole pipeline: the grabbed (or watched) input
//! device, the axis normalizer, the chord state and the virtual output
//! keyboard. All events are processed on a single task in arrival order, so
//! every press/release and every resolved chord is emitted in the exact
//! order the player produced it.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Running
//! ```

use crate::chord::{AxisId, AxisNormalizer, ChordControl, ChordState, Control, MappingTable, ThumbDirection};
use crate::device::emitter::{EmitterError, OutputEmitter};
use crate::device::source::{EvdevSource, SourceError};
use crate::mode::{ModeController, ModeError};
use evdev::{InputEvent, InputEventKind, Key};
use statum::{machine, state};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input source error: {0}")]
    Source(#[from] SourceError),

    #[error("Output emitter error: {0}")]
    Emitter(#[from] EmitterError),

    #[error("Mode transition error: {0}")]
    Mode(#[from] ModeError),
}

/// Engine lifecycle states using statum
#[state]
#[derive(Debug, Clone)]
pub enum EngineState {
    Initializing, // Wiring up the pipeline
    Running,      // Processing events in the main loop
}

/// Chord translator engine with compile-time lifecycle safety via statum.
#[machine]
pub struct ChordEngine<S: EngineState> {
    source: EvdevSource,
    emitter: Box<dyn OutputEmitter>,
    table: MappingTable,
    normalizer: AxisNormalizer,
    mode: ModeController,
    chord: ChordState,
}

impl ChordEngine<Initializing> {
    pub fn create(
        source: EvdevSource,
        emitter: Box<dyn OutputEmitter>,
        table: MappingTable,
        normalizer: AxisNormalizer,
        mode: ModeController,
    ) -> Self {
        info!("Initializing chord engine");

        Self::new(
            source,
            emitter,
            table,
            normalizer,
            mode,
            ChordState::default(),
        )
    }

    /// Validates the mapping table and transitions to Running.
    pub fn initialize(self) -> ChordEngine<Running> {
        self.table.validate();
        info!(
            "Chord table loaded with {} entries, toggle on {:?}",
            self.table.entries().len(),
            self.mode.toggle_key()
        );
        self.transition()
    }
}

impl ChordEngine<Running> {
    /// Main processing loop with graceful shutdown support.
    ///
    /// Runs until cancellation. If keyboard mode is still active when the
    /// loop ends, the engine runs the full deactivation sequence so no held
    /// key or device grab outlives the process.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), EngineError> {
        info!("Engine running, starting passive");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancellation requested, stopping engine");
                    break;
                }

                event = self.source.next_event() => {
                    self.handle_event(event?)?;
                }
            }
        }

        if self.mode.is_active() {
            info!("Deactivating keyboard mode before shutdown");
            self.mode
                .deactivate(&mut self.chord, &mut self.source, self.emitter.as_mut())?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: InputEvent) -> Result<(), EngineError> {
        match event.kind() {
            InputEventKind::Key(key) => self.handle_key(key, event.value()),
            InputEventKind::AbsAxis(axis) => self.handle_axis(axis.0, event.value()),
            _ => Ok(()),
        }
    }

    fn handle_key(&mut self, key: Key, value: i32) -> Result<(), EngineError> {
        // Autorepeat never reaches the chord logic.
        if value == 2 {
            return Ok(());
        }

        if key == self.mode.toggle_key() {
            if value == 1 {
                self.mode
                    .toggle(&mut self.chord, &mut self.source, self.emitter.as_mut())?;
            }
            return Ok(());
        }

        if !self.mode.is_active() {
            return Ok(());
        }

        let Some(control) = Control::from_key(key) else {
            trace!("Ignoring unclassified key {:?}", key);
            return Ok(());
        };

        if value == 1 {
            self.chord.on_press(control, self.emitter.as_mut())?;
        } else {
            self.chord
                .on_release(control, &self.table, self.emitter.as_mut())?;
        }
        Ok(())
    }

    /// Axis samples are normalized even while passive so the per-axis state
    /// is current the moment keyboard mode activates; the resulting steps
    /// are only applied while active.
    fn handle_axis(&mut self, code: u16, value: i32) -> Result<(), EngineError> {
        let Some(axis) = AxisId::from_abs(code) else {
            return Ok(());
        };

        let steps = self.normalizer.feed(axis, value);
        if !self.mode.is_active() {
            return Ok(());
        }

        for step in steps {
            debug!(
                "Axis step {:?}: {} -> {}",
                step.axis, step.previous, step.value
            );
            let (control, pressed) = if axis.is_hat() {
                let (direction, pressed) = if step.value == 0 {
                    (ChordControl::from_hat(step.axis, step.previous), false)
                } else {
                    (ChordControl::from_hat(step.axis, step.value), true)
                };
                let Some(direction) = direction else {
                    warn!("Unmappable hat step on {:?}", step.axis);
                    continue;
                };
                (Control::Chord(direction), pressed)
            } else {
                let (direction, pressed) = if step.value == 0 {
                    (ThumbDirection::from_stick(step.axis, step.previous), false)
                } else {
                    (ThumbDirection::from_stick(step.axis, step.value), true)
                };
                let Some(direction) = direction else {
                    warn!("Unmappable stick step on {:?}", step.axis);
                    continue;
                };
                (Control::Thumb(direction), pressed)
            };

            if pressed {
                self.chord.on_press(control, self.emitter.as_mut())?;
            } else {
                self.chord
                    .on_release(control, &self.table, self.emitter.as_mut())?;
            }
        }
        Ok(())
    }
}
