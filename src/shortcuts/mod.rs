//! Keyboard shortcuts.
//!
//! - [`keys`]: Key chords and their string form
//! - [`registry`]: Context stack resolving chords to actions

pub mod keys;
pub mod registry;

pub use keys::{Key, KeyChord, Modifiers};
pub use registry::{ShortcutRegistry, GLOBAL_CONTEXT};
