/// Event types for the sound engine
///
/// Events report things that have happened (past tense).
/// They are broadcast to all subscribers.

use crate::catalog::CatalogOrigin;

/// How a cue was rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Decoded audio asset
    Asset,

    /// Procedural oscillator synthesis
    Synth,
}

/// Sound engine events
#[derive(Debug, Clone, PartialEq)]
pub enum SoundEvent {
    /// A catalog was installed
    CatalogLoaded {
        origin: CatalogOrigin,
        definitions: usize,
    },

    /// A cue became current and started rendering
    PlaybackStarted {
        trigger: String,
        priority: i32,
        render: RenderKind,
    },

    /// The current cue reached its end
    PlaybackFinished { trigger: String },

    /// A request was refused or failed
    CueDropped { trigger: String, reason: String },

    /// Settings were changed
    SettingsChanged { enabled: bool, volume: f32 },
}

impl SoundEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SoundEvent::CatalogLoaded {
                origin,
                definitions,
            } => format!("Loaded {} catalog ({} sounds)", origin, definitions),
            SoundEvent::PlaybackStarted {
                trigger, render, ..
            } => format!("Playing {} ({:?})", trigger, render),
            SoundEvent::PlaybackFinished { trigger } => format!("Finished {}", trigger),
            SoundEvent::CueDropped { trigger, reason } => {
                format!("Dropped {}: {}", trigger, reason)
            }
            SoundEvent::SettingsChanged { enabled, volume } => {
                format!("Sound {} at volume {:.2}", if *enabled { "on" } else { "off" }, volume)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_description() {
        let event = SoundEvent::PlaybackFinished {
            trigger: "victory".to_string(),
        };
        assert_eq!(event.description(), "Finished victory");

        let event = SoundEvent::SettingsChanged {
            enabled: false,
            volume: 0.5,
        };
        assert_eq!(event.description(), "Sound off at volume 0.50");

        let event = SoundEvent::CatalogLoaded {
            origin: CatalogOrigin::Fallback,
            definitions: 12,
        };
        assert_eq!(event.description(), "Loaded fallback catalog (12 sounds)");
    }
}
