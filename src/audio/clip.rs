use std::ops::Range;

/// Decoded audio held in memory.
///
/// Samples are interleaved `f32` in [-1.0, 1.0]; a frame is one sample per
/// channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioClip {
    /// Build a clip from interleaved samples.
    ///
    /// A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    pub fn empty(channels: u16, sample_rate: u32) -> Self {
        Self::new(Vec::new(), channels, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Frames covering `ms` milliseconds, rounded down but never zero
    pub fn frames_for_ms(&self, ms: u32) -> usize {
        ((self.sample_rate as u64 * ms as u64) / 1000).max(1) as usize
    }

    /// Copy of the frames in `range`, clamped to the clip
    pub fn slice(&self, range: Range<usize>) -> AudioClip {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let ch = self.channels as usize;
        AudioClip {
            samples: self.samples[start * ch..end * ch].to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Interleaved samples of the frames in `range`, clamped to the clip
    pub fn frames(&self, range: Range<usize>) -> &[f32] {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let ch = self.channels as usize;
        &self.samples[start * ch..end * ch]
    }

    /// Average all channels into one
    pub fn to_mono(&self) -> AudioClip {
        if self.channels == 1 {
            return self.clone();
        }
        let ch = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect();
        AudioClip::mono(samples, self.sample_rate)
    }

    /// Rearrange to `channels` channels: downmix to mono, or copy mono to
    /// every output channel. Other layouts are mixed to mono first.
    pub fn with_channels(&self, channels: u16) -> AudioClip {
        let channels = channels.max(1);
        if channels == self.channels {
            return self.clone();
        }
        let mono = self.to_mono();
        if channels == 1 {
            return mono;
        }
        let mut samples = Vec::with_capacity(mono.samples.len() * channels as usize);
        for &s in &mono.samples {
            samples.extend(std::iter::repeat(s).take(channels as usize));
        }
        AudioClip::new(samples, channels, self.sample_rate)
    }

    /// Split interleaved samples into one buffer per channel
    pub fn deinterleave(&self) -> Vec<Vec<f32>> {
        let ch = self.channels as usize;
        let mut planes = vec![Vec::with_capacity(self.len()); ch];
        for frame in self.samples.chunks_exact(ch) {
            for (plane, &s) in planes.iter_mut().zip(frame) {
                plane.push(s);
            }
        }
        planes
    }

    /// Inverse of [`AudioClip::deinterleave`]; planes are cut to the shortest
    pub fn from_planes(planes: &[Vec<f32>], sample_rate: u32) -> AudioClip {
        let channels = planes.len().max(1);
        let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for plane in planes {
                samples.push(plane[i]);
            }
        }
        AudioClip::new(samples, channels as u16, sample_rate)
    }
}

/// Level of a block of samples in dBFS (RMS relative to full scale).
///
/// Digital silence is `-inf`.
pub fn dbfs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms == 0.0 {
        return f32::NEG_INFINITY;
    }
    (20.0 * rms.log10()) as f32
}
