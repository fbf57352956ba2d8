pub mod cache;
pub mod engine;
pub mod player;
pub mod scheduler;
pub mod source;
pub mod synth;
pub mod volume;
/// Audio system module
///
/// Turns trigger requests into at most one audible cue at a time.
///
/// ## Architecture
///
/// ```text
/// SoundEngine::play_sound(trigger)
///   ├── Catalog           select top-priority enabled candidate
///   ├── PlaybackState     admit / pre-empt / suppress repeat
///   ├── Scheduler         wait the definition's delay
///   └── render
///       ├── AudioCache ── AssetSource    decoded asset (has_audio_file)
///       ├── Synthesizer                  oscillator recipe (fallback)
///       └── AudioOutput                  plays clip, reports completion
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let engine = SoundEngine::builder(RodioOutput::new()?)
///     .catalog_source(HttpCatalogSource::new(client.clone()))
///     .asset_source(HttpAssetSource::new(client))
///     .build();
/// engine.init();
///
/// engine.play_sound("bet_created", &GameType::All, 1.0);
/// engine.play_sound("victory", &GameType::parse("rps"), 1.0);
/// ```

// Re-export commonly used types
pub use cache::{AudioCache, DecodedAudio};
pub use engine::{PlayOutcome, PreloadReport, SoundEngine, SoundEngineBuilder};
pub use player::{AudioOutput, Clip, CompletionCallback, NullOutput, RodioOutput};
pub use scheduler::{InlineScheduler, Scheduler, Task, ThreadScheduler};
pub use source::{AssetSource, HttpAssetSource, NoAssets};
pub use synth::{Synthesizer, Tone, Waveform};
pub use volume::Gain;
