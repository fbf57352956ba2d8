/// Static catalog used when the remote catalog is unavailable

use super::definition::{GameType, SoundDefinition, SoundId};

/// (trigger, priority, volume, can_repeat)
const FALLBACK_SOUNDS: &[(&str, i32, f32, bool)] = &[
    ("victory", 9, 0.8, false),
    ("defeat", 8, 0.7, false),
    ("draw", 7, 0.6, false),
    ("bet_accepted", 6, 0.6, false),
    ("game_start", 6, 0.6, false),
    ("bet_created", 5, 0.5, false),
    ("error", 5, 0.5, false),
    ("notification", 4, 0.5, false),
    ("balance_update", 4, 0.4, false),
    ("click", 2, 0.3, true),
    ("hover", 1, 0.2, true),
    ("timer_tick", 1, 0.3, true),
];

/// Triggers covered by the fallback catalog
pub fn fallback_triggers() -> impl Iterator<Item = &'static str> {
    FALLBACK_SOUNDS.iter().map(|(trigger, ..)| *trigger)
}

/// Build the fallback definitions: enabled, synthesized, `ALL` game types
pub fn fallback_definitions() -> Vec<SoundDefinition> {
    FALLBACK_SOUNDS
        .iter()
        .map(|&(trigger, priority, volume, can_repeat)| SoundDefinition {
            id: SoundId::new(format!("fallback-{}", trigger)),
            event_trigger: trigger.to_string(),
            priority,
            is_enabled: true,
            volume,
            delay: 0,
            can_repeat,
            game_type: GameType::All,
            has_audio_file: false,
        })
        .collect()
}
