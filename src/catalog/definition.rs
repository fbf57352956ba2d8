/// Sound definitions as served by the catalog endpoint
///
/// The wire shape is untyped JSON; entries are parsed one at a time into
/// `SoundDefinition` and anything malformed is rejected here, at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Identifier of a sound, normalized to a string key
///
/// The backend serves numeric ids; string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct SoundId(String);

impl SoundId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SoundId> for String {
    fn from(id: SoundId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

/// Integral floats (`7.0`) map to the same key as the integer
fn number_key(n: &serde_json::Number) -> String {
    if n.is_u64() || n.is_i64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

impl From<RawId> for SoundId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => SoundId(number_key(&n)),
            RawId::Text(s) => SoundId(s),
        }
    }
}

/// Game variant a definition applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameType {
    /// Applies to every game variant
    #[default]
    All,

    /// Applies to one named variant only
    Variant(String),
}

impl GameType {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("ALL") {
            GameType::All
        } else {
            GameType::Variant(value.to_string())
        }
    }

    /// Whether a definition tagged with `self` is a candidate for `requested`
    pub fn applies_to(&self, requested: &GameType) -> bool {
        match self {
            GameType::All => true,
            GameType::Variant(own) => matches!(requested, GameType::Variant(r) if r == own),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::All => write!(f, "ALL"),
            GameType::Variant(name) => write!(f, "{}", name),
        }
    }
}

impl From<String> for GameType {
    fn from(value: String) -> Self {
        GameType::parse(&value)
    }
}

impl From<GameType> for String {
    fn from(game_type: GameType) -> Self {
        game_type.to_string()
    }
}

/// A playable cue bound to a trigger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundDefinition {
    pub id: SoundId,

    /// Semantic event this sound answers to ("victory", "bet_created")
    pub event_trigger: String,

    /// Higher pre-empts lower
    pub priority: i32,

    pub is_enabled: bool,

    /// Per-sound gain in [0, 1], multiplied with the global volume
    pub volume: f32,

    /// Milliseconds to wait before playback starts
    pub delay: u64,

    pub can_repeat: bool,

    pub game_type: GameType,

    /// Decoded asset when true, procedural synthesis otherwise
    pub has_audio_file: bool,
}

/// Wire shape of a catalog entry before validation
#[derive(Debug, Deserialize)]
struct RawSoundDefinition {
    id: SoundId,
    event_trigger: String,
    priority: i32,
    is_enabled: bool,
    volume: f32,
    #[serde(default)]
    delay: u64,
    can_repeat: bool,
    #[serde(default)]
    game_type: GameType,
    has_audio_file: bool,
}

impl TryFrom<RawSoundDefinition> for SoundDefinition {
    type Error = String;

    fn try_from(raw: RawSoundDefinition) -> Result<Self, Self::Error> {
        let trigger = raw.event_trigger.trim();
        if trigger.is_empty() {
            return Err("event_trigger is empty".to_string());
        }
        if !raw.volume.is_finite() || !(0.0..=1.0).contains(&raw.volume) {
            return Err(format!("volume {} is outside [0, 1]", raw.volume));
        }

        Ok(SoundDefinition {
            id: raw.id,
            event_trigger: trigger.to_string(),
            priority: raw.priority,
            is_enabled: raw.is_enabled,
            volume: raw.volume,
            delay: raw.delay,
            can_repeat: raw.can_repeat,
            game_type: raw.game_type,
            has_audio_file: raw.has_audio_file,
        })
    }
}

/// Parse a catalog response body into validated definitions.
///
/// Malformed entries are logged and skipped. A non-empty array without a
/// single valid entry is treated as an unusable catalog.
pub fn parse_definitions(body: serde_json::Value) -> Result<Vec<SoundDefinition>, CatalogError> {
    let entries = match body {
        serde_json::Value::Array(entries) => entries,
        _ => return Err(CatalogError::NotAnArray),
    };

    let total = entries.len();
    let mut definitions = Vec::with_capacity(total);

    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = serde_json::from_value::<RawSoundDefinition>(entry)
            .map_err(|e| e.to_string())
            .and_then(SoundDefinition::try_from);

        match parsed {
            Ok(definition) => definitions.push(definition),
            Err(reason) => {
                let err = CatalogError::InvalidEntry { index, reason };
                tracing::warn!("{}", err);
            }
        }
    }

    if total > 0 && definitions.is_empty() {
        return Err(CatalogError::NoValidEntries { rejected: total });
    }

    Ok(definitions)
}
