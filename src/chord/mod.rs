//! Chord-accumulation core: control classification, axis binarization, the
//! mapping table and the per-episode state machine.

pub mod axis;
pub mod controls;
pub mod state;
pub mod table;

pub use axis::{AxisId, AxisNormalizer, AxisSettings, AxisStep};
pub use controls::{ChordControl, Control, ModifierControl, Side, ThumbDirection};
pub use state::ChordState;
pub use table::{MappingEntry, MappingTable};
