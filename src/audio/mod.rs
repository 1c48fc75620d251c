//! Audio engine boundary
//!
//! Sounds never touch the output device directly. They hold opaque
//! [`Chunk`]s produced by a [`Mixer`] and ask them to play.

mod engine;
#[cfg(test)]
pub mod mock;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use engine::RodioMixer;

/// An immutable, playable unit of audio
pub trait Chunk: fmt::Debug + Send + Sync {
    /// Hand the chunk to the output; returns without waiting for playback.
    ///
    /// Every play mixes independently of chunks already playing.
    /// `duration_scale` below 1 cuts the chunk short.
    fn play(&self, duration_scale: f32) {
        self.play_after(duration_scale, Duration::ZERO);
    }

    /// Like [`Chunk::play`], but the chunk becomes audible after `delay`
    fn play_after(&self, duration_scale: f32, delay: Duration);

    /// Natural playing time
    fn length(&self) -> Duration;

    /// Path the chunk was read from
    fn path(&self) -> &Path;
}

/// Produces chunks from files on disk
pub trait Mixer: Send + Sync {
    fn read(&self, path: &Path) -> Result<Arc<dyn Chunk>, AudioError>;
}

/// Errors raised while loading audio
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load audio file {}", .path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to open audio output")]
    OutputUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}
