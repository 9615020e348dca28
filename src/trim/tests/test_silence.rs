use std::f32::consts::PI;

use crate::audio::clip::AudioClip;
use crate::config::SilenceConfig;
use crate::trim::silence::{SilenceBoundaries, detect_boundaries, detect_leading_silence, trim};

const RATE: u32 = 16_000;

fn tone(seconds: f32) -> Vec<f32> {
    let n = (seconds * RATE as f32) as usize;
    (0..n)
        .map(|i| (2.0 * PI * 440.0 * i as f32 / RATE as f32).sin() * 0.5)
        .collect()
}

fn silence(seconds: f32) -> Vec<f32> {
    vec![0.0; (seconds * RATE as f32) as usize]
}

#[test]
fn test_clip_without_silence_is_unchanged() {
    let clip = AudioClip::mono(tone(0.5), RATE);
    let trimmed = trim(&clip, &SilenceConfig::default());
    assert_eq!(trimmed, clip);
}

#[test]
fn test_all_silent_clip_becomes_empty() {
    let clip = AudioClip::mono(silence(0.75), RATE);
    let bounds = detect_boundaries(&clip, &SilenceConfig::default());
    assert_eq!(bounds, SilenceBoundaries { lead: clip.len(), trail: clip.len() });

    let trimmed = trim(&clip, &SilenceConfig::default());
    assert!(trimmed.is_empty());
    assert_eq!(trimmed.sample_rate(), RATE);
}

#[test]
fn test_both_ends_are_trimmed() {
    let mut samples = silence(1.0);
    samples.extend(tone(2.0));
    samples.extend(silence(1.0));
    let clip = AudioClip::mono(samples, RATE);

    let bounds = detect_boundaries(&clip, &SilenceConfig::default());
    assert_eq!(bounds.lead, RATE as usize);
    assert_eq!(bounds.trail, RATE as usize);

    let trimmed = trim(&clip, &SilenceConfig::default());
    assert!((trimmed.duration() - 2.0).abs() < 0.011);
}

#[test]
fn test_quiet_noise_counts_as_silence() {
    // Constant 0.001 sits at -60 dBFS
    let mut samples = vec![0.001; RATE as usize / 2];
    samples.extend(tone(0.5));
    let clip = AudioClip::mono(samples, RATE);

    assert_eq!(detect_leading_silence(&clip, &SilenceConfig::default()), RATE as usize / 2);

    let strict = SilenceConfig {
        threshold_dbfs: -70.0,
        ..SilenceConfig::default()
    };
    assert_eq!(detect_leading_silence(&clip, &strict), 0);
}

#[test]
fn test_trim_points_fall_on_chunk_boundaries() {
    // 15 ms of silence with 10 ms chunks: the second chunk already holds tone
    let mut samples = silence(0.015);
    samples.extend(tone(0.1));
    let clip = AudioClip::mono(samples, RATE);
    assert_eq!(detect_leading_silence(&clip, &SilenceConfig::default()), 160);
}

#[test]
fn test_multichannel_level_spans_all_channels() {
    // Left channel silent throughout, right channel carries the tone
    let mut right = silence(0.25);
    right.extend(tone(0.5));
    let samples: Vec<f32> = right.iter().flat_map(|&r| [0.0, r]).collect();
    let clip = AudioClip::new(samples, 2, RATE);

    let trimmed = trim(&clip, &SilenceConfig::default());
    assert_eq!(trimmed.channels(), 2);
    assert_eq!(trimmed.len(), clip.len() - RATE as usize / 4);
}
