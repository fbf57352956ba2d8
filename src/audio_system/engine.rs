/// Sound engine
///
/// Arbitrates cue playback with one audible cue at a time. Higher priority
/// pre-empts lower and equal priority keeps what is playing. Non-repeatable
/// triggers are not restarted while current. Requests that lose arbitration
/// are dropped, never queued. An admitted cue holds the slot from admission,
/// including while it waits out its delay.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::api::ApiClient;
use crate::catalog::{
    load_catalog, Catalog, CatalogOrigin, CatalogSource, GameType, HttpCatalogSource,
    OfflineCatalogSource, SoundDefinition, SoundId, DEFAULT_CRITICAL_TRIGGERS,
};
use crate::config::{
    EngineConfig, JsonSettingsStore, MemorySettingsStore, SettingsStore, SoundSettings,
};
use crate::error::{ConfigError, PlaybackError};
use crate::messaging::{EventBus, RenderKind, SoundEvent};
use crate::state::{AdmitError, PlaybackState, PlaybackToken};

use super::cache::{AudioCache, DecodedAudio};
use super::player::{AudioOutput, Clip, CompletionCallback};
use super::scheduler::{Scheduler, ThreadScheduler};
use super::source::{AssetSource, HttpAssetSource, NoAssets};
use super::synth::Synthesizer;
use super::volume::Gain;

/// What an accepted request turned into
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// The cue is current and rendering
    Started { trigger: String, render: RenderKind },

    /// The cue holds the slot and reaches the output after its delay
    Scheduled { trigger: String, delay: Duration },
}

/// Result of decoding critical sounds ahead of use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub loaded: usize,
    pub failed: usize,
}

/// Parts reachable from delayed tasks and completion callbacks.
///
/// Lock order is `output_gate` then `state`. Completion callbacks take only
/// `state`, so an output may call them from inside `play`.
struct Playback {
    state: Mutex<PlaybackState>,
    /// Held around every output command together with the slot check, so a
    /// clip reaches the output only while its token holds the slot
    output_gate: Mutex<()>,
    cache: AudioCache,
    assets: Box<dyn AssetSource>,
    output: Box<dyn AudioOutput>,
    synth: Synthesizer,
    events: EventBus,
}

impl Playback {
    /// Decoded asset for `definition`, or its synthesized cue
    fn prepare(&self, definition: &SoundDefinition) -> (DecodedAudio, RenderKind) {
        let trigger = definition.event_trigger.as_str();
        if !definition.has_audio_file {
            return (self.synth.render(trigger, 1.0), RenderKind::Synth);
        }

        match self.cache.get_or_load(definition, self.assets.as_ref()) {
            Ok(audio) => ((*audio).clone(), RenderKind::Asset),
            Err(e) => {
                tracing::warn!("Audio for '{}' unavailable ({}), synthesizing", trigger, e);
                (self.synth.render(trigger, 1.0), RenderKind::Synth)
            }
        }
    }

    /// Render the cue admitted under `token` and hand it to the output.
    ///
    /// Fetching and decoding run without locks; the clip is discarded if the
    /// slot moved on in the meantime.
    fn render(
        self: &Arc<Self>,
        definition: &SoundDefinition,
        token: PlaybackToken,
        gain: Gain,
    ) -> Result<RenderKind, PlaybackError> {
        let trigger = definition.event_trigger.as_str();
        let (audio, render) = self.prepare(definition);

        let _gate = self.output_gate.lock();
        let still_current = self.state.lock().is_current(token);
        if !still_current {
            tracing::debug!("Discarding '{}', slot was taken while rendering", trigger);
            return Err(PlaybackError::Superseded(trigger.to_string()));
        }

        tracing::info!(
            "Playing '{}' (sound {}, priority {}, {:?}, gain {:.2})",
            trigger,
            definition.id,
            definition.priority,
            render,
            gain.level()
        );
        self.events.publish(SoundEvent::PlaybackStarted {
            trigger: trigger.to_string(),
            priority: definition.priority,
            render,
        });

        let clip = Clip {
            trigger: trigger.to_string(),
            audio,
            gain: gain.level(),
        };

        if let Err(source) = self.output.play(clip, self.completion(token)) {
            self.state.lock().finish(token);
            return Err(PlaybackError::Render {
                trigger: trigger.to_string(),
                source,
            });
        }

        Ok(render)
    }

    fn completion(self: &Arc<Self>, token: PlaybackToken) -> CompletionCallback {
        let playback: Weak<Playback> = Arc::downgrade(self);
        Box::new(move || {
            let Some(playback) = playback.upgrade() else {
                return;
            };
            let finished = playback.state.lock().finish(token);
            if let Some(cue) = finished {
                tracing::debug!(
                    "Finished '{}' after {:?}",
                    cue.definition.event_trigger,
                    cue.elapsed()
                );
                playback.events.publish(SoundEvent::PlaybackFinished {
                    trigger: cue.definition.event_trigger,
                });
            }
        })
    }
}

pub struct SoundEngine {
    playback: Arc<Playback>,
    settings: RwLock<SoundSettings>,
    settings_store: Box<dyn SettingsStore>,
    catalog_source: Box<dyn CatalogSource>,
    catalog: RwLock<Option<Arc<Catalog>>>,
    critical_triggers: Vec<String>,
    scheduler: Box<dyn Scheduler>,
}

impl SoundEngine {
    pub fn builder(output: impl AudioOutput + 'static) -> SoundEngineBuilder {
        SoundEngineBuilder::new(Box::new(output))
    }

    /// Engine wired to the GemPlay API and the settings file in the config dir
    pub fn from_config(
        config: &EngineConfig,
        output: Box<dyn AudioOutput>,
    ) -> Result<Self, ConfigError> {
        let client = ApiClient::from_config(config);
        Ok(SoundEngineBuilder::new(output)
            .catalog_source(HttpCatalogSource::new(client.clone()))
            .asset_source(HttpAssetSource::new(client))
            .settings_store(JsonSettingsStore::in_config_dir()?)
            .critical_triggers(config.critical_triggers.iter().cloned())
            .build())
    }

    /// Load settings and catalog, then decode critical sounds
    pub fn init(&self) -> PreloadReport {
        self.load_settings();
        self.load_catalog();
        self.preload_critical()
    }

    fn load_settings(&self) {
        match self.settings_store.load() {
            Ok(Some(stored)) => {
                tracing::debug!(
                    "Restored sound settings: enabled={}, volume={:.2}",
                    stored.enabled,
                    stored.volume
                );
                *self.settings.write() = stored;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read sound settings, using defaults: {}", e),
        }
    }

    /// Fetch the catalog, substituting the fallback catalog on failure
    pub fn load_catalog(&self) -> CatalogOrigin {
        let catalog = load_catalog(self.catalog_source.as_ref());
        let origin = catalog.origin();

        self.playback.events.publish(SoundEvent::CatalogLoaded {
            origin,
            definitions: catalog.len(),
        });
        *self.catalog.write() = Some(Arc::new(catalog));

        origin
    }

    /// Drop cached audio and the catalog, then load both again
    pub fn reload(&self) -> PreloadReport {
        tracing::info!("Reloading sound catalog");
        self.playback.cache.clear();
        *self.catalog.write() = None;

        self.load_catalog();
        self.preload_critical()
    }

    /// Decode every enabled, audio-backed definition of the critical triggers.
    ///
    /// Failures are counted and logged, never returned.
    pub fn preload_critical(&self) -> PreloadReport {
        let mut report = PreloadReport::default();
        let Some(catalog) = self.catalog() else {
            return report;
        };

        let started = Instant::now();
        for trigger in &self.critical_triggers {
            let audio_backed = catalog
                .definitions(trigger)
                .iter()
                .filter(|d| d.is_enabled && d.has_audio_file);

            for definition in audio_backed {
                match self
                    .playback
                    .cache
                    .get_or_load(definition, self.playback.assets.as_ref())
                {
                    Ok(_) => report.loaded += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            "Failed to preload '{}' (sound {}): {}",
                            trigger,
                            definition.id,
                            e
                        );
                    }
                }
            }
        }

        if report.loaded + report.failed > 0 {
            tracing::info!(
                "Preloaded {} critical sounds in {:?} ({} failed)",
                report.loaded,
                started.elapsed(),
                report.failed
            );
        }
        report
    }

    /// Play the cue for `trigger`, logging and discarding any failure
    pub fn play_sound(&self, trigger: &str, game_type: &GameType, volume_multiplier: f32) {
        match self.try_play(trigger, game_type, volume_multiplier) {
            Ok(_) => {}
            Err(e @ PlaybackError::NoCandidate { .. }) | Err(e @ PlaybackError::Render { .. }) => {
                tracing::warn!("{}", e);
            }
            Err(e) => tracing::debug!("Dropped '{}': {}", trigger, e),
        }
    }

    /// Play the cue for `trigger` and report what happened
    pub fn try_play(
        &self,
        trigger: &str,
        game_type: &GameType,
        volume_multiplier: f32,
    ) -> Result<PlayOutcome, PlaybackError> {
        let result = self.arbitrate(trigger, game_type, volume_multiplier);
        if let Err(e) = &result {
            self.playback.events.publish(SoundEvent::CueDropped {
                trigger: trigger.to_string(),
                reason: e.to_string(),
            });
        }
        result
    }

    fn arbitrate(
        &self,
        trigger: &str,
        game_type: &GameType,
        volume_multiplier: f32,
    ) -> Result<PlayOutcome, PlaybackError> {
        let settings = *self.settings.read();
        if !settings.enabled {
            return Err(PlaybackError::Disabled);
        }

        let catalog = self.catalog().ok_or(PlaybackError::CatalogNotLoaded)?;
        let candidate = catalog
            .select(trigger, game_type)
            .cloned()
            .ok_or_else(|| PlaybackError::NoCandidate {
                trigger: trigger.to_string(),
                game_type: game_type.to_string(),
            })?;

        let gain = Gain::for_cue(settings.volume, candidate.volume, volume_multiplier);
        let delay = Duration::from_millis(candidate.delay);

        let (token, replaced) = {
            let _gate = self.playback.output_gate.lock();
            let mut state = self.playback.state.lock();

            state.admit(&candidate).map_err(|reason| match reason {
                AdmitError::Preempted {
                    current,
                    current_priority,
                } => PlaybackError::Preempted {
                    requested: candidate.event_trigger.clone(),
                    requested_priority: candidate.priority,
                    current,
                    current_priority,
                },
                AdmitError::RepeatSuppressed => {
                    PlaybackError::RepeatSuppressed(candidate.event_trigger.clone())
                }
            })?;

            // The slot is taken now, delayed or not
            let replaced = state.clear();
            let token = state.begin(candidate.clone());
            drop(state);

            if replaced.is_some() {
                self.playback.output.stop();
            }
            (token, replaced)
        };

        if let Some(replaced) = replaced {
            tracing::debug!(
                "'{}' pre-empts '{}'",
                candidate.event_trigger,
                replaced.definition.event_trigger
            );
        }

        if delay.is_zero() {
            let render = self.playback.render(&candidate, token, gain)?;
            return Ok(PlayOutcome::Started {
                trigger: candidate.event_trigger,
                render,
            });
        }

        let trigger = candidate.event_trigger.clone();
        let playback = Arc::clone(&self.playback);
        self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Err(e) = playback.render(&candidate, token, gain) {
                    if e.is_drop() {
                        tracing::debug!("Dropped delayed '{}': {}", candidate.event_trigger, e);
                    } else {
                        tracing::warn!("{}", e);
                    }
                    playback.events.publish(SoundEvent::CueDropped {
                        trigger: candidate.event_trigger.clone(),
                        reason: e.to_string(),
                    });
                }
            }),
        );

        Ok(PlayOutcome::Scheduled { trigger, delay })
    }

    /// Stop and clear the current cue; returns what was playing
    ///
    /// A delayed cue that has not started yet is cancelled as well.
    pub fn stop_current(&self) -> Option<SoundDefinition> {
        let _gate = self.playback.output_gate.lock();
        let cleared = self.playback.state.lock().clear();
        if cleared.is_some() {
            self.playback.output.stop();
        }
        cleared.map(|cue| cue.definition)
    }

    /// Store and persist settings; disabling also silences the current cue
    pub fn update_settings(&self, enabled: bool, volume: f32) -> SoundSettings {
        let settings = SoundSettings::new(enabled, volume);
        *self.settings.write() = settings;

        if !enabled {
            self.stop_current();
        }

        if let Err(e) = self.settings_store.save(&settings) {
            tracing::warn!("Failed to persist sound settings: {}", e);
        }

        tracing::info!(
            "Sound {} at volume {:.2}",
            if enabled { "enabled" } else { "disabled" },
            settings.volume
        );
        self.playback.events.publish(SoundEvent::SettingsChanged {
            enabled,
            volume: settings.volume,
        });

        settings
    }

    pub fn settings(&self) -> SoundSettings {
        *self.settings.read()
    }

    pub fn currently_playing(&self) -> Option<SoundDefinition> {
        self.playback
            .state
            .lock()
            .current()
            .map(|cue| cue.definition.clone())
    }

    pub fn is_playing(&self) -> bool {
        self.playback.state.lock().is_playing()
    }

    /// Block until nothing is current or `timeout` elapses
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_playing() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        true
    }

    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.read().clone()
    }

    /// Number of definitions in the loaded catalog, 0 before `init`
    pub fn catalog_len(&self) -> usize {
        self.catalog().map_or(0, |c| c.len())
    }

    pub fn catalog_origin(&self) -> Option<CatalogOrigin> {
        self.catalog().map(|c| c.origin())
    }

    /// Triggers known to the loaded catalog, sorted
    pub fn triggers(&self) -> Vec<String> {
        self.catalog()
            .map(|c| c.triggers().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn is_cached(&self, id: &SoundId) -> bool {
        self.playback.cache.contains(id)
    }

    pub fn cached_count(&self) -> usize {
        self.playback.cache.len()
    }

    pub fn events(&self) -> &EventBus {
        &self.playback.events
    }
}

pub struct SoundEngineBuilder {
    output: Box<dyn AudioOutput>,
    assets: Box<dyn AssetSource>,
    catalog_source: Box<dyn CatalogSource>,
    settings_store: Box<dyn SettingsStore>,
    scheduler: Box<dyn Scheduler>,
    events: EventBus,
    synth: Synthesizer,
    critical_triggers: Vec<String>,
    initial_settings: Option<SoundSettings>,
}

impl SoundEngineBuilder {
    fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            assets: Box::new(NoAssets),
            catalog_source: Box::new(OfflineCatalogSource),
            settings_store: Box::new(MemorySettingsStore::new()),
            scheduler: Box::new(ThreadScheduler),
            events: EventBus::new(),
            synth: Synthesizer::default(),
            critical_triggers: DEFAULT_CRITICAL_TRIGGERS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            initial_settings: None,
        }
    }

    pub fn asset_source(mut self, assets: impl AssetSource + 'static) -> Self {
        self.assets = Box::new(assets);
        self
    }

    pub fn catalog_source(mut self, source: impl CatalogSource + 'static) -> Self {
        self.catalog_source = Box::new(source);
        self
    }

    pub fn settings_store(mut self, store: impl SettingsStore + 'static) -> Self {
        self.settings_store = Box::new(store);
        self
    }

    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn synthesizer(mut self, synth: Synthesizer) -> Self {
        self.synth = synth;
        self
    }

    pub fn critical_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    /// Settings in effect until a stored value is loaded by `init`
    pub fn settings(mut self, settings: SoundSettings) -> Self {
        self.initial_settings = Some(settings);
        self
    }

    pub fn build(self) -> SoundEngine {
        SoundEngine {
            playback: Arc::new(Playback {
                state: Mutex::new(PlaybackState::new()),
                output_gate: Mutex::new(()),
                cache: AudioCache::new(),
                assets: self.assets,
                output: self.output,
                synth: self.synth,
                events: self.events,
            }),
            settings: RwLock::new(self.initial_settings.unwrap_or_default()),
            settings_store: self.settings_store,
            catalog_source: self.catalog_source,
            catalog: RwLock::new(None),
            critical_triggers: self.critical_triggers,
            scheduler: self.scheduler,
        }
    }
}
