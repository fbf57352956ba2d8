/// Sound catalog
///
/// Maps each trigger to its candidate definitions, sorted by descending
/// priority. Loaded from the remote API or, failing that, from a static
/// fallback list.

pub mod definition;
pub mod fallback;
pub mod loader;

use std::collections::HashMap;
use std::fmt;

pub use definition::{parse_definitions, GameType, SoundDefinition, SoundId};
pub use fallback::{fallback_definitions, fallback_triggers};
pub use loader::{load_catalog, CatalogSource, HttpCatalogSource, OfflineCatalogSource};

/// Triggers whose assets are decoded ahead of first use
pub const DEFAULT_CRITICAL_TRIGGERS: &[&str] =
    &["click", "bet_created", "notification", "victory", "defeat"];

/// Where the loaded catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    Remote,
    Fallback,
}

impl fmt::Display for CatalogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogOrigin::Remote => write!(f, "remote"),
            CatalogOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    by_trigger: HashMap<String, Vec<SoundDefinition>>,
    origin: CatalogOrigin,
}

impl Catalog {
    pub fn new(definitions: Vec<SoundDefinition>, origin: CatalogOrigin) -> Self {
        let mut by_trigger: HashMap<String, Vec<SoundDefinition>> = HashMap::new();
        for definition in definitions {
            by_trigger
                .entry(definition.event_trigger.clone())
                .or_default()
                .push(definition);
        }

        // Stable sort keeps catalog order among equal priorities
        for candidates in by_trigger.values_mut() {
            candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        }

        Self { by_trigger, origin }
    }

    pub fn fallback() -> Self {
        Self::new(fallback_definitions(), CatalogOrigin::Fallback)
    }

    pub fn origin(&self) -> CatalogOrigin {
        self.origin
    }

    /// Enabled definitions for `trigger` applicable to `game_type`, best first
    pub fn candidates<'a>(
        &'a self,
        trigger: &str,
        game_type: &'a GameType,
    ) -> impl Iterator<Item = &'a SoundDefinition> + 'a {
        self.definitions(trigger)
            .iter()
            .filter(move |d| d.is_enabled && d.game_type.applies_to(game_type))
    }

    /// The one definition that would play for `trigger`
    pub fn select<'a>(&'a self, trigger: &str, game_type: &'a GameType) -> Option<&'a SoundDefinition> {
        self.candidates(trigger, game_type).next()
    }

    /// All definitions for `trigger`, enabled or not
    pub fn definitions(&self, trigger: &str) -> &[SoundDefinition] {
        self.by_trigger
            .get(trigger)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundDefinition> {
        self.by_trigger.values().flatten()
    }

    /// Trigger names, sorted
    pub fn triggers(&self) -> Vec<&str> {
        let mut triggers: Vec<&str> = self.by_trigger.keys().map(String::as_str).collect();
        triggers.sort_unstable();
        triggers
    }

    pub fn trigger_count(&self) -> usize {
        self.by_trigger.len()
    }

    pub fn len(&self) -> usize {
        self.by_trigger.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, trigger: &str, priority: i32, game_type: GameType) -> SoundDefinition {
        SoundDefinition {
            id: SoundId::new(id),
            event_trigger: trigger.to_string(),
            priority,
            is_enabled: true,
            volume: 1.0,
            delay: 0,
            can_repeat: false,
            game_type,
            has_audio_file: false,
        }
    }

    #[test]
    fn test_select_highest_priority() {
        let catalog = Catalog::new(
            vec![
                def("1", "victory", 3, GameType::All),
                def("2", "victory", 9, GameType::All),
                def("3", "victory", 5, GameType::All),
            ],
            CatalogOrigin::Remote,
        );

        let chosen = catalog.select("victory", &GameType::All).unwrap();
        assert_eq!(chosen.id.as_str(), "2");

        let order: Vec<i32> = catalog.definitions("victory").iter().map(|d| d.priority).collect();
        assert_eq!(order, vec![9, 5, 3]);
    }

    #[test]
    fn test_disabled_and_foreign_game_types_are_skipped() {
        let mut disabled = def("1", "victory", 10, GameType::All);
        disabled.is_enabled = false;

        let catalog = Catalog::new(
            vec![
                disabled,
                def("2", "victory", 8, GameType::parse("dice")),
                def("3", "victory", 4, GameType::All),
            ],
            CatalogOrigin::Remote,
        );

        let rps = GameType::parse("rps");
        assert_eq!(catalog.select("victory", &rps).unwrap().id.as_str(), "3");

        let dice = GameType::parse("dice");
        assert_eq!(catalog.select("victory", &dice).unwrap().id.as_str(), "2");

        assert_eq!(catalog.candidates("victory", &dice).count(), 2);
    }

    #[test]
    fn test_equal_priorities_keep_catalog_order() {
        let catalog = Catalog::new(
            vec![
                def("first", "click", 2, GameType::All),
                def("second", "click", 2, GameType::All),
            ],
            CatalogOrigin::Remote,
        );
        assert_eq!(catalog.select("click", &GameType::All).unwrap().id.as_str(), "first");
    }

    #[test]
    fn test_unknown_trigger() {
        let catalog = Catalog::fallback();
        assert!(catalog.select("jackpot", &GameType::All).is_none());
        assert!(catalog.definitions("jackpot").is_empty());
    }

    #[test]
    fn test_fallback_catalog_shape() {
        let catalog = Catalog::fallback();
        assert_eq!(catalog.origin(), CatalogOrigin::Fallback);
        assert_eq!(catalog.len(), catalog.trigger_count());
        for trigger in fallback_triggers() {
            assert!(catalog.select(trigger, &GameType::All).is_some());
        }
    }

    #[test]
    fn test_iter_visits_every_definition() {
        let catalog = Catalog::new(
            vec![
                def("1", "victory", 9, GameType::All),
                def("2", "victory", 4, GameType::parse("dice")),
                def("3", "click", 2, GameType::All),
            ],
            CatalogOrigin::Remote,
        );

        let mut ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(catalog.iter().count(), catalog.len());
    }
}
