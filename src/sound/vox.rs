//! Spoken sentences

use tracing::debug;

use super::{Playlist, Selection, SoundContext, SoundError};

/// Word chunks are held a little longer than their recording
pub const VOX_DURATION_SCALE: f32 = 1.4;

/// A sentence spoken word by word
#[derive(Debug)]
pub struct Vox {
    sentence: String,
    words: Playlist,
}

impl Vox {
    /// Tokenize `sentence` and load one chunk per word
    pub fn new(ctx: &SoundContext, sentence: &str) -> Result<Self, SoundError> {
        let chunks = ctx
            .tokenizer
            .voxify(sentence)
            .into_iter()
            .map(|path| ctx.mixer.read(&ctx.resolve(path)))
            .collect::<Result<Vec<_>, _>>()?;

        let words = Playlist::new(Selection::Sequential, chunks, VOX_DURATION_SCALE)
            .map_err(|_| SoundError::InvalidInput {
                variant: "vox",
                reason: format!("sentence {:?} has no words", sentence),
            })?;

        Ok(Self {
            sentence: sentence.to_string(),
            words,
        })
    }

    pub fn play(&self) {
        debug!(sentence = %self.sentence, "speaking");
        self.words.play_all();
    }
}

/// Build and speak a one-off sentence
pub(super) fn say(ctx: &SoundContext, sentence: &str) -> Result<(), SoundError> {
    Vox::new(ctx, sentence)?.play();
    Ok(())
}
