//! Recording mixer for tests

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{AudioError, Chunk, Mixer};

/// Every recorded chunk lasts this long
pub const CHUNK_LENGTH: Duration = Duration::from_secs(1);

/// One recorded play
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub name: String,
    pub duration_scale: f32,
    pub delay: Duration,
}

/// Shared log of plays, in call order
pub type PlayLog = Arc<Mutex<Vec<Play>>>;

/// Mixer that never touches a device and records every play
#[derive(Default)]
pub struct RecordingMixer {
    log: PlayLog,
    missing: Vec<PathBuf>,
}

impl RecordingMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `read` fail for the given path
    pub fn with_missing(mut self, path: impl Into<PathBuf>) -> Self {
        self.missing.push(path.into());
        self
    }

    pub fn log(&self) -> PlayLog {
        Arc::clone(&self.log)
    }

    /// File names played so far, in order
    pub fn played(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|play| play.name.clone()).collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl Mixer for RecordingMixer {
    fn read(&self, path: &Path) -> Result<Arc<dyn Chunk>, AudioError> {
        if self.missing.iter().any(|m| path.ends_with(m)) {
            return Err(AudioError::NotFound(path.to_owned()));
        }
        Ok(Arc::new(RecordedChunk {
            path: path.to_owned(),
            log: Arc::clone(&self.log),
        }))
    }
}

#[derive(Debug)]
struct RecordedChunk {
    path: PathBuf,
    log: PlayLog,
}

impl Chunk for RecordedChunk {
    fn play_after(&self, duration_scale: f32, delay: Duration) {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.log.lock().unwrap().push(Play {
            name,
            duration_scale,
            delay,
        });
    }

    fn length(&self) -> Duration {
        CHUNK_LENGTH
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
