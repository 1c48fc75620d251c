//! The sound set: combo → sound map and its dispatch loop

use std::collections::HashMap;
use std::time::SystemTime;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::BoardConfig;
use crate::events::BoardEvent;
use crate::sound::{Sound, SoundError, SoundFactory};
use crate::sources::Location;

use super::{BoardCommand, ButtonCombo};

/// Errors raised while loading a board
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("sound #{index} ({kind}) failed to load")]
    Sound {
        index: usize,
        kind: String,
        #[source]
        source: SoundError,
    },

    #[error("sound #{index} ({kind}) has no buttons")]
    NoKeys { index: usize, kind: String },
}

/// Every sound of a board, keyed by the buttons that trigger it
pub struct SoundSet {
    name: String,
    sounds: HashMap<ButtonCombo, Sound>,
    /// When the board was loaded
    busy_time: SystemTime,
    event_tx: Option<broadcast::Sender<BoardEvent>>,
}

impl SoundSet {
    /// Build every sound of `board`; a later entry for the same buttons
    /// replaces an earlier one
    pub fn load(board: &BoardConfig, factory: &SoundFactory) -> Result<Self, BoardError> {
        let mut sounds = HashMap::with_capacity(board.sounds.len());

        for (index, entry) in board.sounds.iter().enumerate() {
            let failed = |source| BoardError::Sound {
                index,
                kind: entry.kind.clone(),
                source,
            };

            if entry.keys.is_empty() {
                return Err(BoardError::NoKeys {
                    index,
                    kind: entry.kind.clone(),
                });
            }

            let descriptor = factory.registry().descriptor(&entry.kind).map_err(failed)?;
            let input = entry
                .input_for(descriptor.config_attribute)
                .ok_or_else(|| {
                    failed(SoundError::InvalidInput {
                        variant: descriptor.simple_name,
                        reason: format!("missing `input` or `{}`", descriptor.config_attribute),
                    })
                })?;

            let mut sound = factory.build(&entry.kind, input).map_err(failed)?;
            if let Some(name) = &entry.name {
                sound = sound.with_name(name);
            }

            debug!(index, buttons = %entry.keys, name = sound.name(), "sound loaded");

            if let Some(replaced) = sounds.insert(entry.keys.clone(), sound) {
                warn!(
                    buttons = %entry.keys,
                    replaced = replaced.name(),
                    "buttons bound twice, keeping the later sound"
                );
            }
        }

        info!(board = %board.name, keys = %board.keys, sounds = sounds.len(), "creating board");

        Ok(Self {
            name: board.name.clone(),
            sounds,
            busy_time: SystemTime::now(),
            event_tx: None,
        })
    }

    /// Publish board events on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<BoardEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn busy_time(&self) -> SystemTime {
        self.busy_time
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    #[cfg(test)]
    pub fn sound(&self, buttons: &ButtonCombo) -> Option<&Sound> {
        self.sounds.get(buttons)
    }

    /// Play the sound bound to exactly `pressed`
    pub fn play(&mut self, pressed: &ButtonCombo) {
        if pressed.is_empty() {
            return;
        }

        let Some(sound) = self.sounds.get_mut(pressed) else {
            debug!(buttons = %pressed, "no sound for buttons");
            return;
        };

        match sound.play() {
            Ok(()) => {
                debug!(buttons = %pressed, name = sound.name(), "sound played");
                let event = BoardEvent::SoundStarted {
                    name: sound.name().to_string(),
                    variant: sound.variant().to_string(),
                    buttons: pressed.to_vec(),
                };
                self.emit(event);
            }
            Err(e) => {
                error!(buttons = %pressed, name = sound.name(), error = %e, "sound failed to play");
            }
        }
    }

    /// End every running sound whose buttons include any of `released`
    ///
    /// Letting go of a single button of a held combo ends its sound even
    /// while the other buttons stay down.
    pub fn stop(&mut self, released: &ButtonCombo) {
        let mut ended = Vec::new();

        for (buttons, sound) in self.sounds.iter_mut() {
            if buttons.intersects(released) && sound.is_running() {
                debug!(buttons = %buttons, name = sound.name(), "sound ended");
                sound.end();
                ended.push(BoardEvent::SoundEnded {
                    name: sound.name().to_string(),
                    buttons: buttons.to_vec(),
                });
            }
        }

        for event in ended {
            self.emit(event);
        }
    }

    /// Store a new reading in every weather sound at `location`
    pub fn update_temperature(&mut self, location: &Location, temperature: f64) {
        let mut updated = false;
        for weather in self.sounds.values_mut().filter_map(Sound::as_weather_mut) {
            if weather.location() == location {
                weather.update_temperature(temperature);
                updated = true;
            }
        }

        if updated {
            self.emit(BoardEvent::TemperatureUpdated {
                location: location.to_string(),
                temperature,
            });
        }
    }

    /// Distinct locations of the board's weather sounds
    pub fn weather_locations(&self) -> Vec<Location> {
        let mut locations: Vec<Location> = Vec::new();
        for weather in self.sounds.values().filter_map(Sound::as_weather) {
            if !locations.contains(weather.location()) {
                locations.push(weather.location().clone());
            }
        }
        locations
    }

    pub fn handle(&mut self, command: BoardCommand) {
        match command {
            BoardCommand::Press(buttons) => self.play(&buttons),
            BoardCommand::Release(buttons) => self.stop(&buttons),
            BoardCommand::UpdateTemperature {
                location,
                temperature,
            } => self.update_temperature(&location, temperature),
        }
    }

    /// Process commands one at a time until every sender is gone
    pub async fn run(&mut self, mut command_rx: mpsc::Receiver<BoardCommand>) {
        info!(board = %self.name, "dispatcher started");

        while let Some(command) = command_rx.recv().await {
            self.handle(command);
        }

        info!("dispatcher stopped");
    }

    fn emit(&self, event: BoardEvent) {
        if let Some(tx) = &self.event_tx {
            debug!(%event, "emitting board event");
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::mock::RecordingMixer;
    use crate::sound::{testing, Registry};

    const BOARD: &str = r#"{
        "name": "test",
        "wav_directory": "/sounds",
        "sounds": [
            {"type": "wrapped", "files": ["s.wav", "m1.wav", "m2.wav", "e.wav"], "keys": [1, 2], "name": "siren"},
            {"type": "simple", "file": "a.wav", "keys": [1]},
            {"type": "list", "files": ["x.wav", "y.wav"], "keys": [1, 2, 3]},
            {"type": "weather", "location": "warsaw,pl", "keys": [4]},
            {"type": "weather", "input": "warsaw,pl", "keys": [5]}
        ]
    }"#;

    fn load(text: &str) -> (SoundSet, Arc<RecordingMixer>) {
        let mixer = Arc::new(RecordingMixer::new());
        let factory = SoundFactory::new(
            Arc::new(Registry::with_builtin()),
            testing::context(Arc::clone(&mixer), Some(1.0)),
        );
        let board = BoardConfig::from_json(text).unwrap();
        (SoundSet::load(&board, &factory).unwrap(), mixer)
    }

    fn combo(ids: &[u32]) -> ButtonCombo {
        ButtonCombo::new(ids.iter().copied())
    }

    #[test]
    fn test_load() {
        let (set, _) = load(BOARD);
        assert_eq!(set.name(), "test");
        assert_eq!(set.len(), 5);
        assert_eq!(set.sound(&combo(&[2, 1])).unwrap().name(), "siren");
    }

    #[test]
    fn test_exact_match_only() {
        let (mut set, mixer) = load(BOARD);

        set.play(&combo(&[1, 2]));
        assert_eq!(mixer.played(), vec!["s.wav"]);

        mixer.clear();
        set.play(&combo(&[1]));
        assert_eq!(mixer.played(), vec!["a.wav"]);

        mixer.clear();
        set.play(&combo(&[1, 2, 3]));
        assert_eq!(mixer.played(), vec!["x.wav"]);

        mixer.clear();
        set.play(&combo(&[2]));
        set.play(&combo(&[9, 1]));
        set.play(&ButtonCombo::default());
        assert!(mixer.played().is_empty());
    }

    #[test]
    fn test_wrapped_scenario_with_partial_release() {
        let (mut set, mixer) = load(BOARD);
        let siren = combo(&[1, 2]);

        set.play(&siren);
        set.play(&siren);
        set.play(&siren);
        set.play(&siren);
        assert!(set.sound(&siren).unwrap().is_running());

        set.stop(&combo(&[1]));

        assert!(!set.sound(&siren).unwrap().is_running());
        assert_eq!(
            mixer.played(),
            vec!["s.wav", "m1.wav", "m2.wav", "m1.wav", "e.wav"]
        );
    }

    #[test]
    fn test_stop_ignores_idle_and_unrelated_sounds() {
        let (mut set, mixer) = load(BOARD);

        set.stop(&combo(&[1, 2]));
        assert!(mixer.played().is_empty());

        set.play(&combo(&[1, 2]));
        mixer.clear();
        set.stop(&combo(&[7]));
        assert!(mixer.played().is_empty());
        assert!(set.sound(&combo(&[1, 2])).unwrap().is_running());
    }

    #[test]
    fn test_release_after_end_does_not_replay_end_chunk() {
        let (mut set, mixer) = load(BOARD);
        let siren = combo(&[1, 2]);

        set.play(&siren);
        set.stop(&combo(&[1]));
        set.stop(&combo(&[2]));

        assert_eq!(mixer.played(), vec!["s.wav", "e.wav"]);
    }

    #[test]
    fn test_duplicate_buttons_last_wins() {
        let text = r#"{
            "name": "dup",
            "wav_directory": "/sounds",
            "sounds": [
                {"type": "simple", "file": "first.wav", "keys": [1]},
                {"type": "simple", "file": "second.wav", "keys": [1]}
            ]
        }"#;
        let (mut set, mixer) = load(text);

        assert_eq!(set.len(), 1);
        set.play(&combo(&[1]));
        assert_eq!(mixer.played(), vec!["second.wav"]);
    }

    #[test]
    fn test_load_errors() {
        let mixer = Arc::new(RecordingMixer::new());
        let factory = SoundFactory::new(
            Arc::new(Registry::with_builtin()),
            testing::context(mixer, None),
        );

        let unknown = BoardConfig::from_json(
            r#"{"name": "x", "wav_directory": ".", "sounds": [{"type": "kazoo", "input": "a", "keys": [1]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            SoundSet::load(&unknown, &factory),
            Err(BoardError::Sound { source: SoundError::NotFound(_), .. })
        ));

        let no_input = BoardConfig::from_json(
            r#"{"name": "x", "wav_directory": ".", "sounds": [{"type": "list", "file": "a.wav", "keys": [1]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            SoundSet::load(&no_input, &factory),
            Err(BoardError::Sound { source: SoundError::InvalidInput { .. }, .. })
        ));

        let no_keys = BoardConfig::from_json(
            r#"{"name": "x", "wav_directory": ".", "sounds": [{"type": "simple", "file": "a.wav", "keys": []}]}"#,
        )
        .unwrap();
        assert!(matches!(
            SoundSet::load(&no_keys, &factory),
            Err(BoardError::NoKeys { index: 0, .. })
        ));
    }

    #[test]
    fn test_update_temperature() {
        let (mut set, mixer) = load(BOARD);
        let (tx, mut rx) = broadcast::channel(8);
        set = set.with_events(tx);

        assert_eq!(
            set.weather_locations(),
            vec![Location::Name("warsaw,pl".into())]
        );

        set.update_temperature(&Location::Name("warsaw,pl".into()), -12.0);
        set.update_temperature(&Location::Id(1), 30.0);

        for buttons in [[4], [5]] {
            let sound = set.sound(&combo(&buttons)).unwrap();
            assert_eq!(sound.as_weather().unwrap().temperature(), Some(-12.0));
        }

        assert!(matches!(
            rx.try_recv(),
            Ok(BoardEvent::TemperatureUpdated { temperature, .. }) if temperature == -12.0
        ));
        assert!(rx.try_recv().is_err());

        set.play(&combo(&[4]));
        assert_eq!(mixer.played().last().map(String::as_str), Some("ebin.wav"));
    }

    #[test]
    fn test_events_emitted() {
        let (set, _) = load(BOARD);
        let (tx, mut rx) = broadcast::channel(8);
        let mut set = set.with_events(tx);

        set.play(&combo(&[1, 2]));
        set.stop(&combo(&[2]));

        assert!(matches!(
            rx.try_recv(),
            Ok(BoardEvent::SoundStarted { ref name, .. }) if name == "siren"
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(BoardEvent::SoundEnded { ref buttons, .. }) if buttons == &vec![1, 2]
        ));
    }

    #[tokio::test]
    async fn test_run_processes_commands_in_order() {
        let (mut set, mixer) = load(BOARD);
        let (tx, rx) = mpsc::channel(8);

        tx.send(BoardCommand::Press(combo(&[1, 2]))).await.unwrap();
        tx.send(BoardCommand::Press(combo(&[1, 2]))).await.unwrap();
        tx.send(BoardCommand::Release(combo(&[2]))).await.unwrap();
        tx.send(BoardCommand::Press(combo(&[99]))).await.unwrap();
        drop(tx);

        set.run(rx).await;

        assert_eq!(mixer.played(), vec!["s.wav", "m1.wav", "e.wav"]);
    }
}
