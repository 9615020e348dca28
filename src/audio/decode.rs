//! # Audio decoding
//!
//! Turns an audio file into an [`AudioClip`], keeping the source channel
//! layout and sample rate.
//!
//! - WAV is read with `hound` (8/16/24/32-bit integer and 32-bit float)
//! - MP3, M4A/AAC, FLAC and OGG/Vorbis go through `symphonia`
//! - anything else (WMA in practice) is transcoded by `ffmpeg` into a
//!   temporary WAV first
//!
//! Every failure is reported as [`PrepError::Decode`] carrying the path.

use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::clip::AudioClip;
use super::ffmpeg;
use crate::error::{PrepError, Result};

/// Extensions handled by symphonia
const SYMPHONIA_EXTENSIONS: &[&str] = &["mp3", "m4a", "mp4", "aac", "flac", "ogg", "oga"];

/// Decode any supported audio file.
///
/// The decoder is picked from the (case-insensitive) file extension.
pub fn decode_audio_file<P: AsRef<Path>>(file_path: P) -> Result<AudioClip> {
    let file_path = file_path.as_ref();
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let clip = match extension.as_str() {
        "wav" => decode_wav_file(file_path),
        ext if SYMPHONIA_EXTENSIONS.contains(&ext) => decode_with_symphonia(file_path, ext),
        _ => decode_with_ffmpeg(file_path),
    }
    .map_err(|e| match e {
        PrepError::Decode { .. } => e,
        other => PrepError::decode(file_path, other),
    })?;

    debug!(
        "Decoded {}: {} frames, {} ch, {} Hz",
        file_path.display(),
        clip.len(),
        clip.channels(),
        clip.sample_rate()
    );
    Ok(clip)
}

/// Decode a WAV file with hound.
pub fn decode_wav_file<P: AsRef<Path>>(file_path: P) -> Result<AudioClip> {
    let mut reader = WavReader::open(file_path.as_ref())?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|s| s as f32 / 128.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 8388608.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 2147483648.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (format, bits) => {
            return Err(PrepError::decode(
                file_path.as_ref(),
                format!("unsupported WAV sample format: {:?}, {} bit", format, bits),
            ));
        }
    };

    Ok(AudioClip::new(samples, spec.channels, spec.sample_rate))
}

fn decode_with_symphonia(file_path: &Path, extension: &str) -> Result<AudioClip> {
    let file = File::open(file_path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| PrepError::decode(file_path, format!("unrecognised format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PrepError::decode(file_path, "no audio track"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PrepError::decode(file_path, format!("no decoder: {}", e)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PrepError::decode(file_path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping corrupt packet in {}: {}", file_path.display(), e);
                continue;
            }
            Err(e) => return Err(PrepError::decode(file_path, e)),
        }
    }

    if sample_rate == 0 || channels == 0 {
        return Err(PrepError::decode(file_path, "stream has no sample rate or channel layout"));
    }

    Ok(AudioClip::new(samples, channels as u16, sample_rate))
}

fn decode_with_ffmpeg(file_path: &Path) -> Result<AudioClip> {
    let temp = tempfile::Builder::new()
        .prefix("voiceprep-")
        .suffix(".wav")
        .tempfile()?;

    ffmpeg::run_ffmpeg([
        OsStr::new("-i"),
        file_path.as_os_str(),
        OsStr::new("-vn"),
        OsStr::new("-acodec"),
        OsStr::new("pcm_s16le"),
        OsStr::new("-f"),
        OsStr::new("wav"),
        temp.path().as_os_str(),
    ])?;

    decode_wav_file(temp.path())
}
