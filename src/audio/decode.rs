//! Compressed-audio decoding via symphonia.
//!
//! Accepts anything the enabled symphonia readers recognize (mp3, wav,
//! flac, ogg/vorbis, aac, mp4) and produces planar f32 PCM. Inputs with
//! more than two channels are truncated to the first two.

use crate::audio::AudioBuffer;
use crate::services::transform::TransformError;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub fn decode(input: &[u8]) -> Result<AudioBuffer, TransformError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(input.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(TransformError::NoAudioTrack)?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TransformError::Decode(e.to_string()))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut src_channels = 0;
    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(TransformError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // a malformed packet is skipped, not fatal
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(TransformError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }
        if channels.is_empty() {
            src_channels = spec.channels.count();
            if src_channels == 0 {
                continue;
            }
            channels = vec![Vec::new(); src_channels.min(2)];
        } else if spec.channels.count() != src_channels {
            // channel layout changed mid-stream; drop the stray packet
            continue;
        }

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks_exact(src_channels) {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.push(frame[ch]);
            }
        }
    }

    if sample_rate == 0 || channels.iter().all(|c| c.is_empty()) {
        return Err(TransformError::EmptyAudio);
    }

    Ok(AudioBuffer::new(channels, sample_rate))
}
