//! # Batch Silence Trimmer
//!
//! Walks an input tree, trims leading and trailing silence from every audio
//! file and writes the results into a mirrored tree next to the input:
//!
//! ```text
//! corpus/                      corpus_silence_trimmed/
//!   spk1/a.mp3          ->       spk1/a.wav
//!   spk1/notes.txt               (skipped)
//!   b.flac              ->       b.wav
//! ```
//!
//! The output tree is deleted and rebuilt on every run, so re-running on the
//! same input always yields the same set of files.

pub mod dispatch;
pub mod progress;

use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::audio::{OutputFormat, decode_audio_file, encode_clip};
use crate::config::{FlacOptions, PrepConfig, SilenceConfig, default_concurrency};
use crate::error::{PrepError, Result};
use crate::fs_util;
use crate::trim::silence;

use self::progress::{LogObserver, ProgressObserver};

/// Extensions (lowercase) picked up by the trimmer
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "wma"];

/// Suffix appended to the input directory name to form the output directory
pub const OUTPUT_SUFFIX: &str = "_silence_trimmed";

/// One file to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub format: OutputFormat,
}

impl WorkItem {
    /// Item that overwrites its own source
    pub fn in_place(path: PathBuf, format: OutputFormat) -> Self {
        Self {
            destination: path.clone(),
            source: path,
            format,
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source.display())
    }
}

/// Success and failure counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunResult {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// `<parent>/<name>_silence_trimmed` for an input root `<parent>/<name>`
pub fn output_root_for(input_root: &Path) -> Result<PathBuf> {
    let name = input_root.file_name().ok_or_else(|| {
        PrepError::InvalidInput(format!("input directory has no name: {}", input_root.display()))
    })?;
    let parent = input_root.parent().unwrap_or_else(|| Path::new(""));

    let mut output_name = name.to_os_string();
    output_name.push(OUTPUT_SUFFIX);
    Ok(parent.join(output_name))
}

/// One WorkItem per recognised audio file under `input_root`
pub fn collect_work_items(input_root: &Path, output_root: &Path, format: OutputFormat) -> Result<Vec<WorkItem>> {
    let files = fs_util::find_files(input_root, AUDIO_EXTENSIONS)?;
    files
        .into_iter()
        .map(|source| {
            let relative = source.strip_prefix(input_root).map_err(|_| {
                PrepError::InvalidInput(format!("{} is outside {}", source.display(), input_root.display()))
            })?;
            let destination = output_root.join(relative).with_extension(format.extension());
            Ok(WorkItem {
                source,
                destination,
                format,
            })
        })
        .collect()
}

/// Trims silence from whole directory trees
#[derive(Debug, Clone, Default)]
pub struct SilenceTrimmer {
    pub silence: SilenceConfig,
    pub flac: FlacOptions,
}

impl SilenceTrimmer {
    pub fn new(silence: SilenceConfig, flac: FlacOptions) -> Self {
        Self { silence, flac }
    }

    pub fn from_config(config: &PrepConfig) -> Self {
        Self::new(config.silence, config.flac)
    }

    /// Decode, trim and write one file. Errors are logged, never returned.
    pub fn process_one(&self, item: &WorkItem) -> bool {
        match self.try_process(item) {
            Ok(()) => true,
            Err(e) => {
                error!("Error processing {}: {}", item.source.display(), e);
                false
            }
        }
    }

    fn try_process(&self, item: &WorkItem) -> Result<()> {
        let clip = decode_audio_file(&item.source)?;
        let trimmed = silence::trim(&clip, &self.silence);

        if let Some(parent) = item.destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        encode_clip(&trimmed, &item.destination, item.format, &self.flac)
    }

    /// Trim every recognised file under `input_root` into
    /// `<input_root>_silence_trimmed`.
    ///
    /// An existing output directory is deleted first.
    pub fn run(
        &self,
        input_root: &Path,
        format: OutputFormat,
        concurrency: usize,
        observer: &dyn ProgressObserver,
    ) -> Result<RunResult> {
        if !input_root.is_dir() {
            return Err(PrepError::InvalidInput(format!(
                "input directory does not exist: {}",
                input_root.display()
            )));
        }
        // Symlinks stay unresolved so the output lands next to the path as given
        let mut input_root = std::path::absolute(input_root)?;
        if input_root.file_name().is_none() {
            input_root = input_root.canonicalize()?;
        }
        let output_root = output_root_for(&input_root)?;

        fs_util::reset_dir(&output_root)?;

        let items = collect_work_items(&input_root, &output_root, format)?;
        info!(
            "Found {} audio files under {}, writing {} to {}",
            items.len(),
            input_root.display(),
            format,
            output_root.display()
        );

        dispatch::dispatch(&items, concurrency, observer, |item| self.process_one(item))
    }
}

/// Run the trimmer with default settings, logging progress
pub fn run(input_root: &Path, format: OutputFormat, concurrency: Option<usize>) -> Result<RunResult> {
    SilenceTrimmer::default().run(
        input_root,
        format,
        concurrency.unwrap_or_else(default_concurrency),
        &LogObserver::new("trim"),
    )
}
