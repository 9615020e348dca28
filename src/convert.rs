//! Single-file WAV to FLAC conversion

use std::path::Path;

use log::{error, info};

use crate::audio::clip::AudioClip;
use crate::audio::decode::decode_wav_file;
use crate::audio::encode::encode_flac;
use crate::config::FlacOptions;
use crate::error::{PrepError, Result};

/// Convert `src` to a mono 32 kHz FLAC at compression level 8.
///
/// Failures are logged with the source path; returns whether `dst` was
/// written.
pub fn convert_wav_to_flac<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> bool {
    let src = src.as_ref();
    match convert_wav_to_flac_with(src, dst.as_ref(), &FlacOptions::dataset()) {
        Ok(()) => true,
        Err(e) => {
            error!("Error converting {}: {}", src.display(), e);
            false
        }
    }
}

/// Convert `src` to FLAC with explicit encoder options
pub fn convert_wav_to_flac_with(src: &Path, dst: &Path, options: &FlacOptions) -> Result<()> {
    if !src.is_file() {
        return Err(PrepError::InvalidInput(format!("no such file: {}", src.display())));
    }
    let clip = decode_wav_file(src).map_err(|e| match e {
        PrepError::Decode { .. } => e,
        other => PrepError::decode(src, other),
    })?;
    let clip = prepare(clip, options);

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    encode_flac(&clip, dst, options).map_err(|e| match e {
        PrepError::ToolNotFound(_) => e,
        other => PrepError::encode(dst, other),
    })?;

    info!("Converted {} to {}", src.display(), dst.display());
    Ok(())
}

/// Apply the channel layout up front so ffmpeg only has to resample
fn prepare(clip: AudioClip, options: &FlacOptions) -> AudioClip {
    match options.channels {
        Some(channels) if channels != clip.channels() => clip.with_channels(channels),
        _ => clip,
    }
}
