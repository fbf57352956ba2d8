//! Sound cue engine for the GemPlay client.
//!
//! Loads a trigger → sound catalog from the GemPlay API (or a built-in
//! fallback), and plays at most one cue at a time with priority pre-emption,
//! repeat suppression, decoded-asset caching and procedural synthesis.

pub mod api;
pub mod audio_system;
pub mod catalog;
pub mod config;
pub mod error;
pub mod messaging;
pub mod state;

pub use audio_system::{PlayOutcome, PreloadReport, SoundEngine};
pub use catalog::{Catalog, CatalogOrigin, GameType, SoundDefinition};
pub use config::{EngineConfig, SoundSettings};
pub use error::PlaybackError;
