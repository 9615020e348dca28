//! Amplitude-threshold silence trimming.
//!
//! The clip is scanned in fixed chunks from either end; a chunk is silent
//! when its RMS level is below the threshold. Scanning stops at the first
//! chunk that is loud enough, so trim points fall on chunk boundaries.

use crate::audio::clip::{AudioClip, dbfs};
use crate::config::SilenceConfig;

/// Frames to cut from each end of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceBoundaries {
    pub lead: usize,
    pub trail: usize,
}

/// Frames of silence at the start of `clip`, at most `clip.len()`
pub fn detect_leading_silence(clip: &AudioClip, config: &SilenceConfig) -> usize {
    let len = clip.len();
    let chunk = clip.frames_for_ms(config.chunk_ms);

    let mut trim = 0;
    while trim < len && dbfs(clip.frames(trim..trim + chunk)) < config.threshold_dbfs {
        trim += chunk;
    }
    trim.min(len)
}

/// Frames of silence at the end of `clip`, at most `clip.len()`.
///
/// Same scan as [`detect_leading_silence`], walking backwards from the end.
pub fn detect_trailing_silence(clip: &AudioClip, config: &SilenceConfig) -> usize {
    let len = clip.len();
    let chunk = clip.frames_for_ms(config.chunk_ms);

    let mut trim = 0;
    while trim < len {
        let end = len - trim;
        let start = end.saturating_sub(chunk);
        if dbfs(clip.frames(start..end)) >= config.threshold_dbfs {
            break;
        }
        trim += chunk;
    }
    trim.min(len)
}

pub fn detect_boundaries(clip: &AudioClip, config: &SilenceConfig) -> SilenceBoundaries {
    SilenceBoundaries {
        lead: detect_leading_silence(clip, config),
        trail: detect_trailing_silence(clip, config),
    }
}

/// Cut leading and trailing silence.
///
/// A clip that is silent throughout comes back empty.
pub fn trim(clip: &AudioClip, config: &SilenceConfig) -> AudioClip {
    let SilenceBoundaries { lead, trail } = detect_boundaries(clip, config);
    let len = clip.len();
    if lead + trail >= len {
        return AudioClip::empty(clip.channels(), clip.sample_rate());
    }
    clip.slice(lead..len - trail)
}
