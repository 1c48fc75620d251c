//! rodio-backed audio engine
//!
//! Every file is decoded fully into memory at load time. Each play gets its
//! own detached sink, so sounds mix on top of each other. Chunks that must
//! follow one another (spoken words) are delayed by leading silence.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::source::Zero;
use rodio::{Decoder, OutputStreamHandle, Sink, Source};
use tracing::{debug, info, warn};

use super::{AudioError, Chunk, Mixer};

/// Mixer writing to a rodio output stream
///
/// The `OutputStream` itself is not `Send`; the caller keeps it alive and
/// hands us its handle.
pub struct RodioMixer {
    handle: OutputStreamHandle,
}

impl RodioMixer {
    /// Fails when the output refuses a sink
    pub fn new(handle: &OutputStreamHandle) -> Result<Self, AudioError> {
        Sink::try_new(handle).map_err(|e| AudioError::OutputUnavailable(Box::new(e)))?;
        info!("audio output ready");

        Ok(Self {
            handle: handle.clone(),
        })
    }
}

impl Mixer for RodioMixer {
    fn read(&self, path: &Path) -> Result<Arc<dyn Chunk>, AudioError> {
        if !path.exists() {
            return Err(AudioError::NotFound(path.to_owned()));
        }

        let load_failed = |e: Box<dyn std::error::Error + Send + Sync>| AudioError::LoadFailed {
            path: path.to_owned(),
            source: e,
        };

        let file = File::open(path).map_err(|e| load_failed(Box::new(e)))?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| load_failed(Box::new(e)))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.collect();

        debug!(path = %path.display(), samples = samples.len(), "chunk loaded");

        Ok(Arc::new(RodioChunk {
            path: path.to_owned(),
            channels,
            sample_rate,
            samples: Arc::new(samples),
            handle: self.handle.clone(),
        }))
    }
}

/// Decoded PCM kept in memory
struct RodioChunk {
    path: PathBuf,
    channels: u16,
    sample_rate: u32,
    samples: Arc<Vec<i16>>,
    handle: OutputStreamHandle,
}

impl std::fmt::Debug for RodioChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioChunk")
            .field("path", &self.path)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Length of `samples` interleaved samples
fn clip_length(samples: usize, channels: u16, sample_rate: u32) -> Duration {
    let frames = samples as f64 / f64::from(channels.max(1));
    Duration::from_secs_f64(frames / f64::from(sample_rate.max(1)))
}

/// How much of a clip is heard; a scale above 1 only adds spacing
fn audible_length(natural: Duration, duration_scale: f32) -> Duration {
    natural.mul_f32(duration_scale.max(0.0)).min(natural)
}

impl Chunk for RodioChunk {
    fn play_after(&self, duration_scale: f32, delay: Duration) {
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                warn!(path = %self.path().display(), ?e, "no sink for chunk, skipping");
                return;
            }
        };

        if !delay.is_zero() {
            sink.append(Zero::<i16>::new(self.channels, self.sample_rate).take_duration(delay));
        }

        let buffer = SamplesBuffer::new(self.channels, self.sample_rate, self.samples.to_vec());
        let natural = self.length();
        let audible = audible_length(natural, duration_scale);
        if audible < natural {
            sink.append(buffer.take_duration(audible));
        } else {
            sink.append(buffer);
        }

        // The sink keeps playing after it is dropped
        sink.detach();
        debug!(path = %self.path().display(), duration_scale, ?delay, "chunk playing");
    }

    fn length(&self) -> Duration {
        clip_length(self.samples.len(), self.channels, self.sample_rate)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
