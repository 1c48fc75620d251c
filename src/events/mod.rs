//! Events emitted by the dispatcher
//!
//! Published on a broadcast channel so the IPC server can report what the
//! board did last.

use serde::{Deserialize, Serialize};

/// Something audible happened on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    /// A sound was pressed (or re-triggered while held)
    SoundStarted {
        name: String,
        variant: String,
        buttons: Vec<u32>,
    },

    /// A running sound was released
    SoundEnded { name: String, buttons: Vec<u32> },

    /// A weather sound received a new reading
    TemperatureUpdated { location: String, temperature: f64 },
}

impl std::fmt::Display for BoardEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardEvent::SoundStarted { name, variant, .. } => {
                write!(f, "SOUND_STARTED {} ({})", name, variant)
            }
            BoardEvent::SoundEnded { name, .. } => write!(f, "SOUND_ENDED {}", name),
            BoardEvent::TemperatureUpdated {
                location,
                temperature,
            } => write!(f, "TEMPERATURE_UPDATED {} {}", location, temperature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = BoardEvent::SoundStarted {
            name: "siren".into(),
            variant: "wrapped".into(),
            buttons: vec![1, 2],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("sound_started"));
        assert!(json.contains("siren"));
        assert!(json.contains("[1,2]"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"sound_ended","name":"siren","buttons":[1]}"#;
        let event: BoardEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, BoardEvent::SoundEnded { ref name, .. } if name == "siren"));
    }

    #[test]
    fn test_event_display() {
        let event = BoardEvent::SoundEnded {
            name: "siren".into(),
            buttons: vec![1],
        };
        assert_eq!(event.to_string(), "SOUND_ENDED siren");
    }
}
