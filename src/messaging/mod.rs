/// Messaging module
///
/// Observers subscribe to the engine's `EventBus` and receive a `SoundEvent`
/// for every catalog load, playback start, completion and dropped cue.
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = EventBus::new();
/// let (rx, _id) = bus.subscribe();
///
/// let engine = SoundEngine::builder(output).event_bus(bus.clone()).build();
/// engine.init();
/// engine.play_sound("victory", &GameType::All, 1.0);
///
/// while let Ok(event) = rx.try_recv() {
///     println!("{}", event.description());
/// }
/// ```

pub mod bus;
pub mod events;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use events::{RenderKind, SoundEvent};
