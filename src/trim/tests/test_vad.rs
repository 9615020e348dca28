use std::f32::consts::PI;
use std::ops::Range;

use crate::audio::clip::AudioClip;
use crate::audio::{decode_audio_file, encode_clip, OutputFormat};
use crate::batch::progress::SilentObserver;
use crate::batch::RunResult;
use crate::config::{FlacOptions, VadConfig};
use crate::error::{PrepError, Result};
use crate::trim::vad::{NO_SPEECH_LOG, SpeechDetector, VadTrimmer, WebRtcDetector, trim_with_vad};

const RATE: u32 = 16_000;

/// Treats every loud 10 ms block as speech
struct LevelDetector;

impl SpeechDetector for LevelDetector {
    fn speech_regions(&mut self, clip: &AudioClip) -> Result<Vec<Range<usize>>> {
        let block = clip.frames_for_ms(10);
        let mut regions: Vec<Range<usize>> = Vec::new();
        let mut start = 0;
        while start < clip.len() {
            let end = (start + block).min(clip.len());
            let loud = clip.frames(start..end).iter().any(|s| s.abs() > 0.1);
            if loud {
                match regions.last_mut() {
                    Some(last) if last.end == start => last.end = end,
                    _ => regions.push(start..end),
                }
            }
            start = end;
        }
        Ok(regions)
    }
}

/// Always fails
struct BrokenDetector;

impl SpeechDetector for BrokenDetector {
    fn speech_regions(&mut self, _clip: &AudioClip) -> Result<Vec<Range<usize>>> {
        Err(PrepError::Vad("broken".into()))
    }
}

fn tone(seconds: f32) -> Vec<f32> {
    let n = (seconds * RATE as f32) as usize;
    (0..n)
        .map(|i| (2.0 * PI * 220.0 * i as f32 / RATE as f32).sin() * 0.6)
        .collect()
}

fn silence(seconds: f32) -> Vec<f32> {
    vec![0.0; (seconds * RATE as f32) as usize]
}

fn speech_clip() -> AudioClip {
    let mut samples = silence(0.5);
    samples.extend(tone(0.3));
    samples.extend(silence(0.2));
    samples.extend(tone(0.3));
    samples.extend(silence(0.5));
    AudioClip::mono(samples, RATE)
}

#[test]
fn test_no_speech_keeps_clip() {
    let clip = AudioClip::mono(silence(1.0), RATE);
    let outcome = trim_with_vad(clip.clone(), &mut LevelDetector, 30).unwrap();
    assert!(!outcome.is_speech);
    assert_eq!(outcome.clip, clip);
}

#[test]
fn test_only_ends_are_trimmed() {
    let outcome = trim_with_vad(speech_clip(), &mut LevelDetector, 0).unwrap();
    assert!(outcome.is_speech);
    // Inner pause survives: 0.3 + 0.2 + 0.3 seconds
    assert_eq!(outcome.clip.len(), 12_800);
}

#[test]
fn test_padding_is_clamped_to_clip() {
    let outcome = trim_with_vad(speech_clip(), &mut LevelDetector, 100).unwrap();
    assert_eq!(outcome.clip.len(), 12_800 + 2 * 1_600);

    let short = AudioClip::mono(tone(0.2), RATE);
    let outcome = trim_with_vad(short.clone(), &mut LevelDetector, 500).unwrap();
    assert_eq!(outcome.clip, short);
}

#[test]
fn test_detector_errors_propagate() {
    let err = trim_with_vad(speech_clip(), &mut BrokenDetector, 0).unwrap_err();
    assert!(matches!(err, PrepError::Vad(_)));
}

#[test]
fn test_webrtc_detector_on_silence() {
    let mut detector = WebRtcDetector::new(&VadConfig::default()).unwrap();
    let clip = AudioClip::mono(silence(1.0), 44_100);
    assert!(detector.speech_regions(&clip).unwrap().is_empty());
    assert!(detector.speech_regions(&AudioClip::empty(1, RATE)).unwrap().is_empty());
}

#[test]
fn test_webrtc_detector_rejects_frame_length() {
    let config = VadConfig {
        frame_ms: 25,
        ..VadConfig::default()
    };
    assert!(matches!(WebRtcDetector::new(&config), Err(PrepError::Vad(_))));
}

#[test]
fn test_directory_run_rewrites_in_place_and_lists_silent_files() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    std::fs::create_dir_all(corpus.join("spk")).unwrap();

    let flac = FlacOptions::default();
    encode_clip(&speech_clip(), corpus.join("spk/talk.wav"), OutputFormat::Wav, &flac).unwrap();
    encode_clip(&AudioClip::mono(silence(0.5), RATE), corpus.join("quiet.wav"), OutputFormat::Wav, &flac).unwrap();
    std::fs::write(corpus.join("broken.wav"), b"nope").unwrap();

    let trimmer = VadTrimmer::new(VadConfig { padding_ms: 0, ..VadConfig::default() }, flac);
    let report = trimmer
        .trim_directory_using(&corpus, "wav", 2, &SilentObserver, || Ok(LevelDetector))
        .unwrap();

    assert_eq!(report.result, RunResult { succeeded: 2, failed: 1 });
    assert_eq!(report.no_speech, vec![corpus.join("quiet.wav")]);

    let log_path = dir.path().join(NO_SPEECH_LOG);
    assert_eq!(report.no_speech_log.as_deref(), Some(log_path.as_path()));
    let listed = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(listed.lines().count(), 1);
    assert!(listed.contains("quiet.wav"));

    assert_eq!(decode_audio_file(corpus.join("spk/talk.wav")).unwrap().len(), 12_800);
    assert_eq!(decode_audio_file(corpus.join("quiet.wav")).unwrap().len(), 8_000);
}

#[test]
fn test_directory_run_without_silent_files_writes_no_list() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    std::fs::create_dir_all(&corpus).unwrap();
    encode_clip(&speech_clip(), corpus.join("talk.wav"), OutputFormat::Wav, &FlacOptions::default()).unwrap();

    let report = VadTrimmer::default()
        .trim_directory_using(&corpus, "wav", 1, &SilentObserver, || Ok(LevelDetector))
        .unwrap();

    assert!(report.no_speech.is_empty());
    assert!(report.no_speech_log.is_none());
    assert!(!dir.path().join(NO_SPEECH_LOG).exists());
}
