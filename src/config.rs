//! Configuration loading and management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::board::ButtonCombo;

const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const DEFAULT_WEATHER_REFRESH_SECS: u64 = 600;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Board file describing the sounds
    pub board_path: PathBuf,

    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Weather provider settings
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// How often weather sounds get a fresh reading
    pub refresh: Duration,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// `board_arg` (the first command-line argument) wins over
    /// `SOUNDBOARD_BOARD`.
    pub fn load(board_arg: Option<PathBuf>) -> Result<Self> {
        let home = PathBuf::from(std::env::var("HOME")?);
        let data_dir = home.join(".local").join("share").join("soundboard");
        let socket_path = data_dir.join("soundboard.sock");

        let board_path = board_arg
            .or_else(|| std::env::var_os("SOUNDBOARD_BOARD").map(PathBuf::from))
            .unwrap_or_else(|| home.join(".config").join("soundboard").join("board.json"));

        let refresh_secs = match std::env::var("SOUNDBOARD_WEATHER_REFRESH_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("weather refresh seconds: {raw:?}")))?,
            Err(_) => DEFAULT_WEATHER_REFRESH_SECS,
        };

        let weather = WeatherConfig {
            api_url: std::env::var("SOUNDBOARD_WEATHER_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_URL.to_string()),
            api_key: std::env::var("SOUNDBOARD_WEATHER_KEY").ok(),
            refresh: Duration::from_secs(refresh_secs.max(1)),
        };

        Ok(Self {
            board_path,
            socket_path,
            data_dir,
            weather,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// A board file: which sounds exist and which buttons trigger them
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub name: String,

    /// Buttons selecting this board, when several boards are installed
    #[serde(default)]
    pub keys: ButtonCombo,

    /// Base directory for every relative sound path
    pub wav_directory: PathBuf,

    pub sounds: Vec<SoundEntry>,
}

/// One sound of a board file
#[derive(Debug, Clone, Deserialize)]
pub struct SoundEntry {
    /// Registry key of the sound type
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw input, when not given under the type's own field name
    #[serde(default)]
    pub input: Option<Value>,

    #[serde(default)]
    pub name: Option<String>,

    /// Buttons held together to trigger the sound
    pub keys: ButtonCombo,

    /// Remaining fields, e.g. `file`, `files`, `sentence`
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SoundEntry {
    /// `input` if present, otherwise the field named `attribute`
    pub fn input_for(&self, attribute: &str) -> Option<&Value> {
        self.input.as_ref().or_else(|| self.attributes.get(attribute))
    }
}

impl BoardConfig {
    /// Read a board file; `.yaml` and `.yml` files are YAML, anything else JSON
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_owned(),
            source: Box::new(e),
        })?;

        let yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let parsed = if yaml {
            Self::from_yaml(&text)
        } else {
            Self::from_json(&text)
        };

        parsed.map_err(|e| match e {
            ConfigError::Parse(source) => ConfigError::LoadFailed {
                path: path.to_owned(),
                source: Box::new(source),
            },
            ConfigError::Yaml(source) => ConfigError::LoadFailed {
                path: path.to_owned(),
                source: Box::new(source),
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load board file {}", .path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("malformed board file")]
    Parse(#[from] serde_json::Error),

    #[error("malformed YAML board file")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
