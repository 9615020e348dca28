//! # Audio encoding
//!
//! Writes an [`AudioClip`] to disk. WAV is produced directly with `hound`
//! as 16-bit PCM; FLAC is produced by `ffmpeg` from a temporary WAV.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use serde::{Deserialize, Serialize};

use super::clip::AudioClip;
use super::ffmpeg;
use crate::config::FlacOptions;
use crate::error::{PrepError, Result};

/// Container written on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Flac,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" => Ok(Self::Wav),
            "flac" => Ok(Self::Flac),
            other => Err(PrepError::Config(format!(
                "unsupported output format '{}', expected wav or flac",
                other
            ))),
        }
    }
}

/// Encode `clip` to `output_path` in the given container.
///
/// `flac` only applies to FLAC output.
pub fn encode_clip<P: AsRef<Path>>(
    clip: &AudioClip,
    output_path: P,
    format: OutputFormat,
    flac: &FlacOptions,
) -> Result<()> {
    let output_path = output_path.as_ref();
    match format {
        OutputFormat::Wav => encode_wav(clip, output_path),
        OutputFormat::Flac => encode_flac(clip, output_path, flac),
    }
    .map_err(|e| match e {
        PrepError::Encode { .. } | PrepError::ToolNotFound(_) => e,
        other => PrepError::encode(output_path, other),
    })
}

/// Write a 16-bit PCM WAV file.
pub fn encode_wav<P: AsRef<Path>>(clip: &AudioClip, output_path: P) -> Result<()> {
    let spec = WavSpec {
        channels: clip.channels(),
        sample_rate: clip.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(output_path.as_ref(), spec)?;
    for &sample in clip.samples() {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()?;

    debug!(
        "Wrote WAV {} ({} frames, {} Hz)",
        output_path.as_ref().display(),
        clip.len(),
        clip.sample_rate()
    );
    Ok(())
}

/// Write a FLAC file through ffmpeg.
pub fn encode_flac<P: AsRef<Path>>(clip: &AudioClip, output_path: P, options: &FlacOptions) -> Result<()> {
    // Fail before touching the disk when ffmpeg is missing
    ffmpeg::ffmpeg_path()?;

    let temp = tempfile::Builder::new()
        .prefix("voiceprep-")
        .suffix(".wav")
        .tempfile()?;
    encode_wav(clip, temp.path())?;

    let mut args: Vec<OsString> = vec!["-i".into(), temp.path().into()];
    if let Some(channels) = options.channels {
        args.push("-ac".into());
        args.push(channels.to_string().into());
    }
    if let Some(rate) = options.sample_rate {
        args.push("-ar".into());
        args.push(rate.to_string().into());
    }
    args.push("-c:a".into());
    args.push("flac".into());
    args.push("-compression_level".into());
    args.push(options.compression_level.to_string().into());
    args.push(output_path.as_ref().into());

    ffmpeg::run_ffmpeg(&args)?;

    debug!("Wrote FLAC {}", output_path.as_ref().display());
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!("WAV".parse::<OutputFormat>().unwrap(), OutputFormat::Wav);
        assert_eq!("flac".parse::<OutputFormat>().unwrap(), OutputFormat::Flac);
        assert!("mp3".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Flac.to_string(), "flac");
    }

    #[test]
    fn sample_conversion_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.5), 32767);
        assert_eq!(to_i16(-1.5), -32767);
    }
}
