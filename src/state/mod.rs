/// State management module
///
/// Arbitration state for the sound engine.

pub mod playback_state;

// Re-export commonly used types
pub use playback_state::{ActiveCue, AdmitError, PlaybackState, PlaybackToken};
