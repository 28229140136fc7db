//! MP3 encoding via LAME.

use crate::audio::AudioBuffer;
use crate::services::transform::TransformError;
use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm, Quality};

// LAME's documented worst-case flush output
const FLUSH_HEADROOM: usize = 7200;

/// Encode to MP3 at the buffer's declared sample rate, 192 kbps CBR.
pub fn encode_mp3(audio: &AudioBuffer) -> Result<Vec<u8>, TransformError> {
    if audio.is_empty() {
        return Err(TransformError::EmptyAudio);
    }

    let stereo = audio.channel_count() >= 2;

    let mut builder = Builder::new()
        .ok_or_else(|| TransformError::Encode("failed to allocate LAME context".into()))?;
    builder
        .set_num_channels(if stereo { 2 } else { 1 })
        .map_err(to_encode_err)?;
    builder
        .set_sample_rate(audio.sample_rate)
        .map_err(to_encode_err)?;
    builder.set_brate(Bitrate::Kbps192).map_err(to_encode_err)?;
    builder.set_quality(Quality::Best).map_err(to_encode_err)?;
    let mut encoder = builder.build().map_err(to_encode_err)?;

    let frames = audio.frames();
    let to_i16 = |s: &f32| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
    let left: Vec<i16> = audio.channels[0].iter().map(to_i16).collect();

    let mut out: Vec<u8> = Vec::new();
    out.reserve(mp3lame_encoder::max_required_buffer_size(frames) + FLUSH_HEADROOM);

    let written = if stereo {
        let right: Vec<i16> = audio.channels[1].iter().map(to_i16).collect();
        encoder
            .encode(
                DualPcm {
                    left: &left,
                    right: &right,
                },
                out.spare_capacity_mut(),
            )
            .map_err(to_encode_err)?
    } else {
        encoder
            .encode(MonoPcm(&left), out.spare_capacity_mut())
            .map_err(to_encode_err)?
    };
    // SAFETY: `written` bytes of spare capacity were initialized by the encoder
    unsafe {
        out.set_len(out.len() + written);
    }

    let written = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(to_encode_err)?;
    // SAFETY: as above, for the flushed tail
    unsafe {
        out.set_len(out.len() + written);
    }

    Ok(out)
}

fn to_encode_err<E: std::fmt::Debug>(e: E) -> TransformError {
    TransformError::Encode(format!("{:?}", e))
}
