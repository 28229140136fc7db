//! Sample rate conversion using rubato's FFT resampler.

use crate::audio::AudioBuffer;
use crate::services::transform::TransformError;
use rubato::{FftFixedIn, Resampler};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample all channels to `target_rate`, preserving channel count.
pub fn resample(audio: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer, TransformError> {
    if audio.sample_rate == target_rate {
        return Ok(audio.clone());
    }
    if audio.is_empty() {
        return Err(TransformError::EmptyAudio);
    }

    let channel_count = audio.channel_count();
    let mut resampler = FftFixedIn::<f32>::new(
        audio.sample_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        channel_count,
    )?;

    let input_frames = audio.frames();
    let expected_output_frames =
        (input_frames as f64 * target_rate as f64 / audio.sample_rate as f64).ceil() as usize;

    let mut output: Vec<Vec<f32>> =
        vec![Vec::with_capacity(expected_output_frames + CHUNK_SIZE); channel_count];

    let mut pos = 0;
    while pos < input_frames {
        // rubato wants a fixed-size input block; the tail is zero-padded
        let needed = resampler.input_frames_next();
        let mut chunk: Vec<Vec<f32>> = vec![vec![0.0f32; needed]; channel_count];

        let copy_frames = needed.min(input_frames - pos);
        for (ch, data) in audio.channels.iter().enumerate() {
            chunk[ch][..copy_frames].copy_from_slice(&data[pos..pos + copy_frames]);
        }

        let processed = resampler.process(&chunk, None)?;
        for (ch, out) in output.iter_mut().enumerate() {
            out.extend_from_slice(&processed[ch]);
        }

        pos += needed;
    }

    let final_length = expected_output_frames.min(output[0].len());
    for out in output.iter_mut() {
        out.truncate(final_length);
    }

    Ok(AudioBuffer::new(output, target_rate))
}
