//! voiceprep: data-preparation utilities for speech datasets
//!
//! Silence trimming (by level or by voice activity), WAV to FLAC
//! conversion, resampling, recursive copying and transcript cleaning.
//! Each utility is usable on its own; the `voiceprep` binary exposes them
//! as subcommands.

pub mod audio;
pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod fs_util;
pub mod logger;
pub mod text;
pub mod trim;

pub use audio::{AudioClip, OutputFormat};
pub use batch::{RunResult, SilenceTrimmer, WorkItem};
pub use config::PrepConfig;
pub use convert::convert_wav_to_flac;
pub use error::{PrepError, Result};
pub use fs_util::recursive_copy;
pub use text::{MaiYamok, TextCleaner, WordReplacements, clean_text_cv};
pub use trim::vad::{VadReport, VadTrimmer};
