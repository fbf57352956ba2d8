/// Playback arbitration state
///
/// Holds the single cue that is currently audible and decides whether a new
/// request may replace it.

use std::time::{Duration, Instant};

use crate::catalog::SoundDefinition;

/// Identifies one started playback; completions for older tokens are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackToken(u64);

/// The cue holding the playback slot.
///
/// A delayed cue holds the slot from the moment it is admitted, before any
/// audio has been sent to the output.
#[derive(Debug, Clone)]
pub struct ActiveCue {
    pub definition: SoundDefinition,
    pub token: PlaybackToken,
    pub started_at: Instant,
}

impl ActiveCue {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Reasons a request is refused while something is playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitError {
    /// The current cue has equal or higher priority
    Preempted { current: String, current_priority: i32 },

    /// Same trigger is still current and the definition does not repeat
    RepeatSuppressed,
}

#[derive(Debug, Default)]
pub struct PlaybackState {
    current: Option<ActiveCue>,
    next_token: u64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ActiveCue> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Whether `token` still holds the slot
    pub fn is_current(&self, token: PlaybackToken) -> bool {
        self.current.as_ref().is_some_and(|active| active.token == token)
    }

    /// Check whether `candidate` may take over playback.
    ///
    /// Equal priority keeps the cue that is already playing.
    pub fn admit(&self, candidate: &SoundDefinition) -> Result<(), AdmitError> {
        let Some(active) = &self.current else {
            return Ok(());
        };

        let current = &active.definition;
        if current.priority >= candidate.priority {
            return Err(AdmitError::Preempted {
                current: current.event_trigger.clone(),
                current_priority: current.priority,
            });
        }

        if current.event_trigger == candidate.event_trigger && !candidate.can_repeat {
            return Err(AdmitError::RepeatSuppressed);
        }

        Ok(())
    }

    /// Mark `definition` as current and return its token
    pub fn begin(&mut self, definition: SoundDefinition) -> PlaybackToken {
        self.next_token += 1;
        let token = PlaybackToken(self.next_token);
        self.current = Some(ActiveCue {
            definition,
            token,
            started_at: Instant::now(),
        });
        token
    }

    /// Clear the current cue if it still belongs to `token`.
    ///
    /// Returns the finished cue, or `None` for a stale completion.
    pub fn finish(&mut self, token: PlaybackToken) -> Option<ActiveCue> {
        match &self.current {
            Some(active) if active.token == token => self.current.take(),
            _ => None,
        }
    }

    /// Clear whatever is current
    pub fn clear(&mut self) -> Option<ActiveCue> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GameType, SoundId};

    fn def(trigger: &str, priority: i32, can_repeat: bool) -> SoundDefinition {
        SoundDefinition {
            id: SoundId::new(trigger),
            event_trigger: trigger.to_string(),
            priority,
            is_enabled: true,
            volume: 1.0,
            delay: 0,
            can_repeat,
            game_type: GameType::All,
            has_audio_file: false,
        }
    }

    #[test]
    fn test_idle_admits_anything() {
        let state = PlaybackState::new();
        assert!(!state.is_playing());
        assert!(state.admit(&def("hover", 1, true)).is_ok());
    }

    #[test]
    fn test_priority_preemption() {
        let mut state = PlaybackState::new();
        state.begin(def("bet_created", 5, false));

        assert!(state.admit(&def("victory", 9, false)).is_ok());
        assert_eq!(
            state.admit(&def("error", 5, false)),
            Err(AdmitError::Preempted {
                current: "bet_created".to_string(),
                current_priority: 5
            })
        );
        assert!(state.admit(&def("click", 2, true)).is_err());
    }

    #[test]
    fn test_repeat_suppression() {
        let mut state = PlaybackState::new();
        state.begin(def("spin", 3, false));

        // A higher-priority entry for the same trigger still cannot repeat
        assert_eq!(
            state.admit(&def("spin", 4, false)),
            Err(AdmitError::RepeatSuppressed)
        );
        assert!(state.admit(&def("spin", 4, true)).is_ok());
    }

    #[test]
    fn test_stale_finish_is_ignored() {
        let mut state = PlaybackState::new();
        let first = state.begin(def("click", 2, true));
        let second = state.begin(def("victory", 9, false));
        assert!(second > first);

        assert!(state.finish(first).is_none());
        assert_eq!(state.current().unwrap().definition.event_trigger, "victory");

        let finished = state.finish(second).unwrap();
        assert_eq!(finished.token, second);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_clear() {
        let mut state = PlaybackState::new();
        let token = state.begin(def("draw", 7, false));
        assert!(state.is_current(token));
        assert!(state.clear().is_some());
        assert!(state.clear().is_none());
        assert!(!state.is_current(token));
    }

    #[test]
    fn test_replaced_token_is_not_current() {
        let mut state = PlaybackState::new();
        let pending = state.begin(def("game_start", 6, false));
        state.clear();
        let newer = state.begin(def("victory", 9, false));

        assert!(!state.is_current(pending));
        assert!(state.is_current(newer));
    }
}
