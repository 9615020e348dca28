//! Configuration for voiceprep
//!
//! Every utility reads its knobs from [`PrepConfig`]. Defaults match the
//! usual dataset preparation settings; a JSON file can override any
//! subset of fields and CLI flags override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::OutputFormat;
use crate::error::{PrepError, Result};
use crate::text::MaiYamok;

/// Amplitude-threshold silence detection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SilenceConfig {
    /// Chunks quieter than this level (dBFS) count as silence
    pub threshold_dbfs: f32,
    /// Length of the scan step in milliseconds
    pub chunk_ms: u32,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold_dbfs: -50.0,
            chunk_ms: 10,
        }
    }
}

/// WebRTC VAD aggressiveness, from least (0) to most (3) strict
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VadAggressiveness {
    Quality,
    LowBitrate,
    #[default]
    Aggressive,
    VeryAggressive,
}

impl VadAggressiveness {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Quality),
            1 => Some(Self::LowBitrate),
            2 => Some(Self::Aggressive),
            3 => Some(Self::VeryAggressive),
            _ => None,
        }
    }
}

/// Voice-activity-detection trimming
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadConfig {
    pub aggressiveness: VadAggressiveness,
    /// Analysis frame length; WebRTC accepts 10, 20 or 30 ms
    pub frame_ms: u32,
    /// Audio kept before the first and after the last speech frame
    pub padding_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            aggressiveness: VadAggressiveness::default(),
            frame_ms: 30,
            padding_ms: 30,
        }
    }
}

/// Parameters for FLAC output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlacOptions {
    /// Resample to this rate while encoding; `None` keeps the source rate
    pub sample_rate: Option<u32>,
    /// Downmix/upmix to this many channels; `None` keeps the source layout
    pub channels: Option<u16>,
    /// FLAC compression level 0..=12
    pub compression_level: u8,
}

impl Default for FlacOptions {
    fn default() -> Self {
        Self {
            sample_rate: None,
            channels: None,
            compression_level: 8,
        }
    }
}

impl FlacOptions {
    /// Settings used for dataset conversion: mono, 32 kHz, level 8
    pub fn dataset() -> Self {
        Self {
            sample_rate: Some(32_000),
            channels: Some(1),
            compression_level: 8,
        }
    }
}

/// Directory resampling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResampleConfig {
    pub sample_rate: u32,
    pub jobs: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            jobs: 4,
        }
    }
}

/// Transcript cleaning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TextConfig {
    pub mai_yamok: MaiYamok,
    /// JSON object of word replacements
    pub replacements: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PrepConfig {
    pub silence: SilenceConfig,
    pub vad: VadConfig,
    pub flac: FlacOptions,
    pub resample: ResampleConfig,
    pub text: TextConfig,
    /// Container written by the batch trimmer
    pub output_format: OutputFormat,
    /// Worker threads; `None` uses every available core
    pub threads: Option<usize>,
}

impl PrepConfig {
    /// Load a configuration file; missing fields fall back to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PrepError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: PrepConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.silence.chunk_ms == 0 {
            return Err(PrepError::Config("silence.chunk_ms must be positive".into()));
        }
        if ![10, 20, 30].contains(&self.vad.frame_ms) {
            return Err(PrepError::Config(format!(
                "vad.frame_ms must be 10, 20 or 30, got {}",
                self.vad.frame_ms
            )));
        }
        if self.flac.compression_level > 12 {
            return Err(PrepError::Config(format!(
                "flac.compression_level must be 0..=12, got {}",
                self.flac.compression_level
            )));
        }
        if self.resample.sample_rate == 0 {
            return Err(PrepError::Config("resample.sample_rate must be positive".into()));
        }
        if self.threads == Some(0) || self.resample.jobs == 0 {
            return Err(PrepError::Config("thread counts must be positive".into()));
        }
        Ok(())
    }

    /// Worker count for batch runs
    pub fn concurrency(&self) -> usize {
        self.threads.unwrap_or_else(default_concurrency)
    }
}

/// Number of available processing units, at least one
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prep.json");
        std::fs::write(&path, r#"{ "silence": { "threshold_dbfs": -40.0 }, "threads": 2 }"#).unwrap();

        let config = PrepConfig::load(&path).unwrap();
        assert_eq!(config.silence.threshold_dbfs, -40.0);
        assert_eq!(config.silence.chunk_ms, 10);
        assert_eq!(config.vad, VadConfig::default());
        assert_eq!(config.text.mai_yamok, MaiYamok::Keep);
        assert_eq!(config.concurrency(), 2);
    }

    #[test]
    fn rejects_unsupported_vad_frame() {
        let config = PrepConfig {
            vad: VadConfig {
                frame_ms: 25,
                ..VadConfig::default()
            },
            ..PrepConfig::default()
        };
        assert!(matches!(config.validate(), Err(PrepError::Config(_))));
    }

    #[test]
    fn aggressiveness_levels() {
        assert_eq!(VadAggressiveness::from_level(0), Some(VadAggressiveness::Quality));
        assert_eq!(VadAggressiveness::from_level(3), Some(VadAggressiveness::VeryAggressive));
        assert_eq!(VadAggressiveness::from_level(4), None);
    }
}
