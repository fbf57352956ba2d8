/// Decoded audio cache
///
/// Memoizes decoded sample data per sound id so an asset is downloaded and
/// decoded at most once per catalog lifetime.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{Decoder, Source};

use crate::catalog::{SoundDefinition, SoundId};
use crate::error::AudioError;

use super::source::AssetSource;

/// Interleaved f32 samples ready for playback
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    channels: u16,
    sample_rate: u32,
    samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn new(channels: u16, sample_rate: u32, samples: impl Into<Arc<[f32]>>) -> Self {
        Self {
            channels: channels.max(1),
            sample_rate,
            samples: samples.into(),
        }
    }

    /// Decode an encoded asset (wav, mp3, ogg, flac)
    pub fn decode(bytes: Vec<u8>) -> Result<Self, AudioError> {
        // Decoder needs owned data with a 'static lifetime
        let decoder =
            Decoder::new(Cursor::new(bytes)).map_err(|e| AudioError::DecodeFailed(Box::new(e)))?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();

        if samples.is_empty() || sample_rate == 0 {
            return Err(AudioError::EmptyClip);
        }

        Ok(Self::new(channels, sample_rate, samples))
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as u64 / self.channels as u64;
        Duration::from_micros(frames * 1_000_000 / self.sample_rate.max(1) as u64)
    }
}

#[derive(Default)]
pub struct AudioCache {
    entries: Mutex<HashMap<SoundId, Arc<DecodedAudio>>>,
}

impl AudioCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SoundId) -> Option<Arc<DecodedAudio>> {
        self.entries.lock().get(id).cloned()
    }

    pub fn insert(&self, id: SoundId, audio: DecodedAudio) -> Arc<DecodedAudio> {
        let audio = Arc::new(audio);
        self.entries.lock().insert(id, Arc::clone(&audio));
        audio
    }

    /// Cached audio for `definition`, fetching and decoding on a miss.
    ///
    /// The fetch runs without holding the lock.
    pub fn get_or_load(
        &self,
        definition: &SoundDefinition,
        source: &dyn AssetSource,
    ) -> Result<Arc<DecodedAudio>, AudioError> {
        if let Some(hit) = self.get(&definition.id) {
            tracing::trace!("Audio cache hit for {}", definition.id);
            return Ok(hit);
        }

        let bytes = source.fetch(definition)?;
        let decoded = DecodedAudio::decode(bytes)?;
        tracing::debug!(
            "Decoded '{}' (sound {}): {} ch, {} Hz, {:?}",
            definition.event_trigger,
            definition.id,
            decoded.channels(),
            decoded.sample_rate(),
            decoded.duration()
        );

        Ok(self.insert(definition.id.clone(), decoded))
    }

    pub fn contains(&self, id: &SoundId) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GameType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    struct CountingSource {
        bytes: Vec<u8>,
        calls: AtomicUsize,
    }

    impl AssetSource for CountingSource {
        fn fetch(&self, _definition: &SoundDefinition) -> Result<Vec<u8>, AudioError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bytes.clone())
        }
    }

    fn definition(id: &str) -> SoundDefinition {
        SoundDefinition {
            id: SoundId::new(id),
            event_trigger: "victory".to_string(),
            priority: 9,
            is_enabled: true,
            volume: 1.0,
            delay: 0,
            can_repeat: false,
            game_type: GameType::All,
            has_audio_file: true,
        }
    }

    #[test]
    fn test_decode_wav() {
        let audio = DecodedAudio::decode(wav_bytes(&[0i16, 1000, -1000, 0].repeat(2000))).unwrap();
        assert_eq!(audio.channels(), 1);
        assert_eq!(audio.sample_rate(), 8_000);
        assert_eq!(audio.samples().len(), 8_000);
        assert_eq!(audio.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = DecodedAudio::decode(vec![0x13, 0x37, 0x00, 0x42]).unwrap_err();
        assert!(matches!(err, AudioError::DecodeFailed(_)));
    }

    #[test]
    fn test_get_or_load_memoizes() {
        let cache = AudioCache::new();
        let source = CountingSource {
            bytes: wav_bytes(&[100i16; 800]),
            calls: AtomicUsize::new(0),
        };
        let def = definition("12");

        let first = cache.get_or_load(&def, &source).unwrap();
        let second = cache.get_or_load(&def, &source).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&def.id));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = AudioCache::new();
        let source = CountingSource {
            bytes: b"not audio".to_vec(),
            calls: AtomicUsize::new(0),
        };
        let def = definition("13");

        assert!(cache.get_or_load(&def, &source).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = AudioCache::new();
        cache.insert(SoundId::new("1"), DecodedAudio::new(1, 44_100, vec![0.0; 10]));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
