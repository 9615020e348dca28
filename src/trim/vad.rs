//! # Voice-activity trimming
//!
//! Cuts everything before the first and after the last stretch of speech.
//! Pauses inside the utterance are left alone.
//!
//! Speech is found by a [`SpeechDetector`]; [`WebRtcDetector`] is the
//! production implementation. The WebRTC handle is neither `Send` nor
//! `Sync`, so each worker builds its own detector per file.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use parking_lot::Mutex;
use webrtc_vad::{SampleRate, Vad, VadMode};

use crate::audio::clip::AudioClip;
use crate::audio::resample::resample_clip;
use crate::audio::{OutputFormat, decode_audio_file, encode_clip};
use crate::batch::progress::{LogObserver, ProgressObserver};
use crate::batch::{RunResult, WorkItem, dispatch};
use crate::config::{FlacOptions, PrepConfig, VadAggressiveness, VadConfig, default_concurrency};
use crate::error::{PrepError, Result};
use crate::fs_util;

/// Name of the list of files without speech, written next to the input folder
pub const NO_SPEECH_LOG: &str = "no_speech_files.txt";

const VAD_RATE: u32 = 16_000;

impl From<VadAggressiveness> for VadMode {
    fn from(mode: VadAggressiveness) -> Self {
        match mode {
            VadAggressiveness::Quality => VadMode::Quality,
            VadAggressiveness::LowBitrate => VadMode::LowBitrate,
            VadAggressiveness::Aggressive => VadMode::Aggressive,
            VadAggressiveness::VeryAggressive => VadMode::VeryAggressive,
        }
    }
}

/// Finds speech in a clip
pub trait SpeechDetector {
    /// Speech regions as frame ranges of `clip`, in order and non-overlapping
    fn speech_regions(&mut self, clip: &AudioClip) -> Result<Vec<Range<usize>>>;
}

/// WebRTC voice activity detector.
///
/// Audio is downmixed and resampled to 16 kHz before classification.
pub struct WebRtcDetector {
    vad: Vad,
    frame_ms: u32,
}

impl WebRtcDetector {
    pub fn new(config: &VadConfig) -> Result<Self> {
        if ![10, 20, 30].contains(&config.frame_ms) {
            return Err(PrepError::Vad(format!(
                "frame length must be 10, 20 or 30 ms, got {}",
                config.frame_ms
            )));
        }
        Ok(Self {
            vad: Vad::new_with_rate_and_mode(SampleRate::Rate16kHz, config.aggressiveness.into()),
            frame_ms: config.frame_ms,
        })
    }

    fn frame_len(&self) -> usize {
        (VAD_RATE * self.frame_ms / 1000) as usize
    }
}

impl SpeechDetector for WebRtcDetector {
    fn speech_regions(&mut self, clip: &AudioClip) -> Result<Vec<Range<usize>>> {
        if clip.is_empty() {
            return Ok(Vec::new());
        }

        let analysed = resample_clip(&clip.to_mono(), VAD_RATE)?;
        let pcm: Vec<i16> = analysed
            .samples()
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();

        let frame_len = self.frame_len();
        let mut regions: Vec<Range<usize>> = Vec::new();
        // A trailing partial frame is not classified
        for (index, frame) in pcm.chunks_exact(frame_len).enumerate() {
            let voiced = self
                .vad
                .is_voice_segment(frame)
                .map_err(|()| PrepError::Vad(format!("cannot classify frame {}", index)))?;
            if !voiced {
                continue;
            }
            let start = index * frame_len;
            let end = start + frame_len;
            match regions.last_mut() {
                Some(last) if last.end == start => last.end = end,
                _ => regions.push(start..end),
            }
        }

        // Back to frames of the source clip
        let scale = clip.sample_rate() as f64 / VAD_RATE as f64;
        let len = clip.len();
        Ok(regions
            .into_iter()
            .map(|r| {
                let start = ((r.start as f64 * scale).floor() as usize).min(len);
                let end = ((r.end as f64 * scale).ceil() as usize).min(len);
                start..end
            })
            .filter(|r| !r.is_empty())
            .collect())
    }
}

/// Result of trimming one clip
#[derive(Debug, Clone, PartialEq)]
pub struct VadOutcome {
    pub clip: AudioClip,
    /// False when no speech was found; `clip` is then the input unchanged
    pub is_speech: bool,
}

/// Keep the audio between the first and the last speech region, widened by
/// `padding_ms` on both sides.
pub fn trim_with_vad(clip: AudioClip, detector: &mut dyn SpeechDetector, padding_ms: u32) -> Result<VadOutcome> {
    let regions = detector.speech_regions(&clip)?;
    let (Some(first), Some(last)) = (regions.first(), regions.last()) else {
        return Ok(VadOutcome {
            clip,
            is_speech: false,
        });
    };

    let padding = (clip.sample_rate() as u64 * padding_ms as u64 / 1000) as usize;
    let start = first.start.saturating_sub(padding);
    let end = last.end.saturating_add(padding).min(clip.len());
    debug!(
        "Speech in frames {}..{} of {}, keeping {}..{}",
        first.start,
        last.end,
        clip.len(),
        start,
        end
    );

    Ok(VadOutcome {
        clip: clip.slice(start..end),
        is_speech: true,
    })
}

/// Summary of a directory run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VadReport {
    pub result: RunResult,
    /// Files in which no speech was found, sorted
    pub no_speech: Vec<PathBuf>,
    /// Where the no-speech list was written, if anything was found
    pub no_speech_log: Option<PathBuf>,
}

/// Trims directory trees in place with a voice activity detector
#[derive(Debug, Clone, Default)]
pub struct VadTrimmer {
    pub vad: VadConfig,
    pub flac: FlacOptions,
}

impl VadTrimmer {
    pub fn new(vad: VadConfig, flac: FlacOptions) -> Self {
        Self { vad, flac }
    }

    pub fn from_config(config: &PrepConfig) -> Self {
        Self::new(config.vad, config.flac)
    }

    /// Trim every `*.<extension>` file under `folder`, overwriting it.
    ///
    /// Files without speech are left untouched and listed in
    /// `<folder parent>/no_speech_files.txt`.
    pub fn trim_directory_with_vad(
        &self,
        folder: &Path,
        extension: &str,
        concurrency: usize,
        observer: &dyn ProgressObserver,
    ) -> Result<VadReport> {
        self.trim_directory_using(folder, extension, concurrency, observer, || {
            WebRtcDetector::new(&self.vad)
        })
    }

    /// Same as [`VadTrimmer::trim_directory_with_vad`] with detectors built
    /// by `make_detector`, once per file.
    pub fn trim_directory_using<D, F>(
        &self,
        folder: &Path,
        extension: &str,
        concurrency: usize,
        observer: &dyn ProgressObserver,
        make_detector: F,
    ) -> Result<VadReport>
    where
        D: SpeechDetector,
        F: Fn() -> Result<D> + Sync,
    {
        if !folder.is_dir() {
            return Err(PrepError::InvalidInput(format!(
                "input directory does not exist: {}",
                folder.display()
            )));
        }
        let extension = extension.trim_start_matches('.').to_lowercase();
        let format: OutputFormat = extension.parse().map_err(|_| {
            PrepError::InvalidInput(format!("cannot rewrite .{} files in place", extension))
        })?;

        let files = fs_util::find_files(folder, &[extension.as_str()])?;
        info!("Found {} .{} files to process", files.len(), extension);
        let items: Vec<WorkItem> = files
            .into_iter()
            .map(|path| WorkItem::in_place(path, format))
            .collect();

        let no_speech = Mutex::new(Vec::new());
        let result = dispatch::dispatch(&items, concurrency, observer, |item| {
            let outcome = make_detector().and_then(|mut detector| self.process_one(item, &mut detector));
            match outcome {
                Ok(true) => true,
                Ok(false) => {
                    no_speech.lock().push(item.destination.clone());
                    true
                }
                Err(e) => {
                    error!("Error processing {}: {}", item.source.display(), e);
                    false
                }
            }
        })?;

        let mut no_speech = no_speech.into_inner();
        no_speech.sort();

        let no_speech_log = if no_speech.is_empty() {
            None
        } else {
            let parent = folder.parent().unwrap_or_else(|| Path::new(""));
            let log_path = parent.join(NO_SPEECH_LOG);
            write_list(&log_path, &no_speech)?;
            info!(
                "Found {} files with no speech. List saved to {}",
                no_speech.len(),
                log_path.display()
            );
            Some(log_path)
        };

        Ok(VadReport {
            result,
            no_speech,
            no_speech_log,
        })
    }

    /// Returns whether speech was found. Only files with speech are rewritten.
    fn process_one(&self, item: &WorkItem, detector: &mut dyn SpeechDetector) -> Result<bool> {
        let clip = decode_audio_file(&item.source)?;
        let outcome = trim_with_vad(clip, detector, self.vad.padding_ms)?;
        if !outcome.is_speech {
            debug!("No speech in {}", item.source.display());
            return Ok(false);
        }
        encode_clip(&outcome.clip, &item.destination, item.format, &self.flac)?;
        Ok(true)
    }
}

fn write_list(path: &Path, files: &[PathBuf]) -> Result<()> {
    let mut content = String::new();
    for file in files {
        content.push_str(&file.to_string_lossy());
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Run the VAD trimmer with default settings, logging progress
pub fn trim_directory_with_vad<P: AsRef<Path>>(folder: P, extension: &str) -> Result<VadReport> {
    VadTrimmer::default().trim_directory_with_vad(
        folder.as_ref(),
        extension,
        default_concurrency(),
        &LogObserver::new("vad-trim"),
    )
}
