//! Chunk selection state machine
//!
//! A playlist owns a fixed, non-empty sequence of chunks plus the index of
//! the chunk played last. Three signals decide what a transition plays:
//!
//! - `start`: first press after the sound was idle
//! - `next`: re-trigger while the sound is still running
//! - `end`: release
//!
//! ```text
//! NotStarted --play--> Running --play--> Running
//!                         |
//!                        end (plays end chunk, if any)
//!                         v
//!                      Stopped --play--> Running
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::audio::Chunk;

use super::SoundError;

/// Which selection rules a playlist follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Resume where it left off, step forward on re-trigger
    Sequential,
    /// Uniform random pick on re-trigger
    Random,
    /// Always restart from the first chunk, step forward on re-trigger
    Restart,
    /// First chunk on press, cycle the middle while held, last on release
    Wrapped,
}

/// Selection state seen by the signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoundState {
    /// Index of the chunk played last, always valid when present
    pub position: Option<usize>,
}

/// Named selection transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Start,
    Next,
    End,
}

impl Selection {
    /// Evaluate a signal against a sequence of `len` chunks
    pub fn signal(self, signal: Signal, len: usize, state: SoundState) -> Option<usize> {
        match signal {
            Signal::Start => self.on_start(len, state),
            Signal::Next => self.on_next(len, state),
            Signal::End => self.on_end(len, state),
        }
    }

    fn on_start(self, _len: usize, state: SoundState) -> Option<usize> {
        match self {
            Selection::Restart | Selection::Wrapped => Some(0),
            Selection::Sequential | Selection::Random => Some(state.position.unwrap_or(0)),
        }
    }

    /// Requires a known position, except for random picks
    fn on_next(self, len: usize, state: SoundState) -> Option<usize> {
        match self {
            Selection::Random => Some(fastrand::usize(..len)),
            Selection::Sequential | Selection::Restart => {
                state.position.map(|p| (p + 1) % len)
            }
            Selection::Wrapped => {
                let top = len - 1;
                if top == 0 {
                    return Some(0);
                }
                state.position.map(|p| ((p + 1) % top).max(1))
            }
        }
    }

    fn on_end(self, len: usize, _state: SoundState) -> Option<usize> {
        match self {
            Selection::Wrapped => Some(len - 1),
            _ => None,
        }
    }
}

/// Chunk sequence plus its playback state
#[derive(Debug)]
pub struct Playlist {
    selection: Selection,
    chunks: Vec<Arc<dyn Chunk>>,
    duration_scale: f32,
    position: Option<usize>,
    running: bool,
}

impl Playlist {
    /// Fails on an empty sequence
    pub fn new(
        selection: Selection,
        chunks: Vec<Arc<dyn Chunk>>,
        duration_scale: f32,
    ) -> Result<Self, SoundError> {
        if chunks.is_empty() {
            return Err(SoundError::EmptySequence);
        }

        Ok(Self {
            selection,
            chunks,
            duration_scale,
            position: None,
            running: false,
        })
    }

    #[cfg(test)]
    pub fn chunks(&self) -> &[Arc<dyn Chunk>] {
        &self.chunks
    }

    pub fn state(&self) -> SoundState {
        SoundState {
            position: self.position,
        }
    }

    /// Chunk played last
    #[cfg(test)]
    pub fn current(&self) -> Option<&Arc<dyn Chunk>> {
        self.position.map(|p| &self.chunks[p])
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Select and play one chunk, returning its index
    pub fn play(&mut self) -> Result<usize, SoundError> {
        let signals: &[Signal] = if self.running {
            &[Signal::Next]
        } else {
            &[Signal::Start, Signal::Next]
        };

        let state = self.state();
        let index = signals
            .iter()
            .find_map(|&s| self.selection.signal(s, self.chunks.len(), state))
            .ok_or(SoundError::NoChunkSelected {
                selection: self.selection,
                running: self.running,
            })?;

        debug!(
            ?state,
            index,
            running = self.running,
            path = %self.chunks[index].path().display(),
            "chunk selected"
        );

        self.position = Some(index);
        self.chunks[index].play(self.duration_scale);
        self.running = true;

        Ok(index)
    }

    /// Play every chunk back-to-back, ignoring selection state
    ///
    /// Each chunk starts once the previous one has had its scaled length.
    pub fn play_all(&self) {
        let mut offset = Duration::ZERO;
        for chunk in &self.chunks {
            chunk.play_after(self.duration_scale, offset);
            offset += chunk.length().mul_f32(self.duration_scale.max(0.0));
        }
    }

    /// Stop running and play the end chunk, if the selection has one
    pub fn end(&mut self) -> Option<usize> {
        self.running = false;

        let index = self
            .selection
            .signal(Signal::End, self.chunks.len(), self.state())?;

        self.position = Some(index);
        self.chunks[index].play(self.duration_scale);
        Some(index)
    }
}
