//! The audio transformation seam.
//!
//! Handlers only see `AudioTransform`: a byte stream goes in, an
//! exportable audio object comes out. The nightcore implementation below
//! decodes, resamples, and relabels the sample rate; everything else in
//! the service is indifferent to how the audio is produced.

use crate::audio::{AudioBuffer, decode, encode, resample};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("unrecognized or unsupported audio format: {0}")]
    Decode(String),

    #[error("no decodable audio track in input")]
    NoAudioTrack,

    #[error("audio stream is empty")]
    EmptyAudio,

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("MP3 encoding failed: {0}")]
    Encode(String),
}

impl From<rubato::ResamplerConstructionError> for TransformError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        TransformError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for TransformError {
    fn from(e: rubato::ResampleError) -> Self {
        TransformError::Resample(e.to_string())
    }
}

/// An opaque audio transformation: consumes a byte stream, produces an
/// object that can export itself.
pub trait AudioTransform: Send + Sync {
    fn apply(&self, input: &[u8]) -> Result<TransformedAudio, TransformError>;
}

/// Transformed PCM, ready for export.
pub struct TransformedAudio {
    buffer: AudioBuffer,
}

impl TransformedAudio {
    /// Render to MP3 bytes.
    pub fn export(&self) -> Result<Vec<u8>, TransformError> {
        encode::encode_mp3(&self.buffer)
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn duration_secs(&self) -> f32 {
        self.buffer.duration_secs()
    }
}

/// Speeds audio up and pitches it up by a fixed number of whole tones.
pub struct NightcoreTransform {
    tones: f32,
}

impl NightcoreTransform {
    pub fn new(tones: f32) -> Self {
        Self { tones }
    }

    /// Playback speed multiplier: one whole tone is two semitones, and
    /// each semitone is a factor of 2^(1/12).
    pub fn speed_factor(&self) -> f64 {
        2f64.powf(self.tones as f64 * 2.0 / 12.0)
    }
}

impl AudioTransform for NightcoreTransform {
    fn apply(&self, input: &[u8]) -> Result<TransformedAudio, TransformError> {
        let source = decode::decode(input)?;

        let factor = self.speed_factor();
        let target_rate = (source.sample_rate as f64 / factor).round() as u32;
        if target_rate == 0 {
            return Err(TransformError::Resample(format!(
                "speed factor {factor} leaves no samples"
            )));
        }

        // Fewer frames declared at the source rate: playback is faster
        // and pitched up by the same factor.
        let mut shifted = resample::resample(&source, target_rate)?;
        shifted.sample_rate = source.sample_rate;

        Ok(TransformedAudio { buffer: shifted })
    }
}
