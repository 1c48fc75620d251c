//! Sounds and the behaviors they follow
//!
//! Every configured sound is a [`Sound`]: a display name plus one of a
//! closed set of behaviors. Clip-based behaviors (simple, random, list,
//! wrapped) share the [`Playlist`] state machine; the spoken ones compose
//! a sentence and hand it to a transient [`Vox`].

mod playlist;
mod registry;
mod transit;
mod vox;
mod weather;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{AudioError, Mixer};
use crate::sources::{TransitSource, WeatherSource};
use crate::speech::PhraseTokenizer;

pub use playlist::{Playlist, Selection};
pub use registry::{Registry, SoundFactory};
pub use transit::{Departure, Transit};
pub use vox::Vox;
pub use weather::Weather;

/// Name shown for sounds the board file does not name
pub const UNNAMED: &str = "unnamed";

/// Everything a sound needs from the outside world
#[derive(Clone)]
pub struct SoundContext {
    pub mixer: Arc<dyn Mixer>,
    pub base_dir: PathBuf,
    pub tokenizer: Arc<dyn PhraseTokenizer>,
    pub weather: Arc<dyn WeatherSource>,
    pub transit: Arc<dyn TransitSource>,
}

impl SoundContext {
    /// Resolve a configured path against the sound directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(path)
    }
}

impl std::fmt::Debug for SoundContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundContext")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

/// The behavior a sound follows
#[derive(Debug)]
pub enum SoundKind {
    /// Simple, random, list and wrapped sounds
    Clips(Playlist),
    Vox(Vox),
    Weather(Weather),
    Transit(Transit),
}

/// A configured, playable sound
#[derive(Debug)]
pub struct Sound {
    name: String,
    variant: &'static str,
    kind: SoundKind,
}

impl Sound {
    pub fn new(variant: &'static str, kind: SoundKind) -> Self {
        Self {
            name: UNNAMED.to_string(),
            variant,
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key this sound was built from
    pub fn variant(&self) -> &'static str {
        self.variant
    }

    #[cfg(test)]
    pub fn kind(&self) -> &SoundKind {
        &self.kind
    }

    /// Whether the sound was played and not yet ended
    pub fn is_running(&self) -> bool {
        match &self.kind {
            SoundKind::Clips(playlist) => playlist.is_running(),
            SoundKind::Vox(_) | SoundKind::Weather(_) | SoundKind::Transit(_) => false,
        }
    }

    pub fn play(&mut self) -> Result<(), SoundError> {
        match &mut self.kind {
            SoundKind::Clips(playlist) => playlist.play().map(|_| ()),
            SoundKind::Vox(vox) => {
                vox.play();
                Ok(())
            }
            SoundKind::Weather(weather) => weather.play(),
            SoundKind::Transit(transit) => transit.play(),
        }
    }

    pub fn end(&mut self) {
        if let SoundKind::Clips(playlist) = &mut self.kind {
            playlist.end();
        }
    }

    pub fn as_weather(&self) -> Option<&Weather> {
        match &self.kind {
            SoundKind::Weather(weather) => Some(weather),
            _ => None,
        }
    }

    pub fn as_weather_mut(&mut self) -> Option<&mut Weather> {
        match &mut self.kind {
            SoundKind::Weather(weather) => Some(weather),
            _ => None,
        }
    }
}

/// Errors raised while building or playing sounds
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("unknown sound type: {0}")]
    NotFound(String),

    #[error("sound type registered twice: {0}")]
    DuplicateVariant(&'static str),

    #[error("sound has no chunks to play")]
    EmptySequence,

    #[error("invalid input for {variant} sound: {reason}")]
    InvalidInput {
        variant: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("no chunk selected ({selection:?}, running: {running})")]
    NoChunkSelected { selection: Selection, running: bool },
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::audio::mock::RecordingMixer;
    use crate::sources::{Location, ScheduledTransit, Units};
    use crate::speech::WordFileTokenizer;

    /// Weather source returning a fixed reading
    pub struct FixedWeather(pub Option<f64>);

    impl WeatherSource for FixedWeather {
        fn fetch_temperature(&self, _location: &Location, _units: Units) -> Option<f64> {
            self.0
        }
    }

    /// Context rooted at `/sounds` with offline sources
    pub fn context(mixer: Arc<RecordingMixer>, temperature: Option<f64>) -> SoundContext {
        SoundContext {
            mixer,
            base_dir: PathBuf::from("/sounds"),
            tokenizer: Arc::new(WordFileTokenizer::default()),
            weather: Arc::new(FixedWeather(temperature)),
            transit: Arc::new(ScheduledTransit::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use std::time::Duration;

    use super::*;
    use crate::audio::mock::{Play, RecordingMixer, CHUNK_LENGTH};
    use crate::sources::Units;

    fn factory(mixer: &Arc<RecordingMixer>, temperature: Option<f64>) -> SoundFactory {
        SoundFactory::new(
            Arc::new(Registry::with_builtin()),
            testing::context(Arc::clone(mixer), temperature),
        )
    }

    #[test]
    fn test_vox_plays_all_words_scaled() {
        let mixer = Arc::new(RecordingMixer::new());
        let mut sound = factory(&mixer, None)
            .build("vox", &json!("hello world"))
            .unwrap();

        sound.play().unwrap();
        assert!(!sound.is_running());

        let log = mixer.log();
        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                Play {
                    name: "hello.wav".to_string(),
                    duration_scale: vox::VOX_DURATION_SCALE,
                    delay: Duration::ZERO,
                },
                Play {
                    name: "world.wav".to_string(),
                    duration_scale: vox::VOX_DURATION_SCALE,
                    delay: CHUNK_LENGTH.mul_f32(vox::VOX_DURATION_SCALE),
                },
            ]
        );
    }

    #[test]
    fn test_end_is_noop_for_spoken_sounds() {
        let mixer = Arc::new(RecordingMixer::new());
        let mut sound = factory(&mixer, None).build("ztm", &json!("7")).unwrap();

        sound.end();
        assert!(mixer.played().is_empty());
    }

    #[test]
    fn test_weather_sentence() {
        let mixer = Arc::new(RecordingMixer::new());
        let mut sound = factory(&mixer, Some(-3.4))
            .build("weather", &json!("warsaw,pl"))
            .unwrap();

        let weather = sound.as_weather_mut().unwrap();
        assert_eq!(weather.sentence(), "black mesa topside temperature is unavailable");

        weather.update_temperature(21.6);
        assert_eq!(weather.sentence(), "black mesa topside temperature is 21 degrees");

        let reading = weather.fetch_temperature(Units::Metric).unwrap();
        weather.update_temperature(reading);
        assert_eq!(
            weather.sentence(),
            "black mesa topside temperature is -3 degrees ebin"
        );

        weather.update_temperature(-0.6);
        assert_eq!(
            weather.sentence(),
            "black mesa topside temperature is 0 degrees ebin"
        );
        weather.update_temperature(29.99);
        assert_eq!(weather.sentence(), "black mesa topside temperature is 29 degrees");
    }

    #[test]
    fn test_weather_state_is_per_instance() {
        let mixer = Arc::new(RecordingMixer::new());
        let factory = factory(&mixer, None);
        let mut first = factory.build("weather", &json!("warsaw,pl")).unwrap();
        let second = factory.build("weather", &json!("warsaw,pl")).unwrap();

        first.as_weather_mut().unwrap().update_temperature(10.0);

        assert_eq!(first.as_weather().unwrap().temperature(), Some(10.0));
        assert_eq!(second.as_weather().unwrap().temperature(), None);
    }

    #[test]
    fn test_weather_play_speaks_report() {
        let mixer = Arc::new(RecordingMixer::new());
        let mut sound = factory(&mixer, None)
            .build("weather", &json!(756135))
            .unwrap();
        sound.as_weather_mut().unwrap().update_temperature(5.0);

        sound.play().unwrap();

        assert_eq!(
            mixer.played(),
            vec![
                "black.wav",
                "mesa.wav",
                "topside.wav",
                "temperature.wav",
                "is.wav",
                "five.wav",
                "degrees.wav"
            ]
        );
    }

    #[test]
    fn test_spoken_sound_reports_missing_word() {
        let mixer = Arc::new(RecordingMixer::new().with_missing("vox/unavailable.wav"));
        let mut sound = factory(&mixer, None)
            .build("weather", &json!("warsaw,pl"))
            .unwrap();

        assert!(matches!(sound.play(), Err(SoundError::Audio(_))));
        assert!(mixer.played().is_empty());
    }
}
