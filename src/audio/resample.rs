//! Sample-rate conversion with rubato.

use std::path::Path;

use log::{debug, error, info};
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

use super::clip::AudioClip;
use super::{OutputFormat, decode_audio_file, encode_clip};
use crate::batch::progress::{LogObserver, ProgressObserver};
use crate::batch::{RunResult, WorkItem, dispatch};
use crate::config::FlacOptions;
use crate::error::{PrepError, Result};
use crate::fs_util;

const CHUNK_FRAMES: usize = 1024;

/// Resample every channel of `clip` to `target_rate`.
pub fn resample_clip(clip: &AudioClip, target_rate: u32) -> Result<AudioClip> {
    if target_rate == 0 {
        return Err(PrepError::Resample("target sample rate must be positive".into()));
    }
    if clip.sample_rate() == target_rate {
        return Ok(clip.clone());
    }
    if clip.is_empty() {
        return Ok(AudioClip::empty(clip.channels(), target_rate));
    }

    let ratio = target_rate as f64 / clip.sample_rate() as f64;
    let channels = clip.channels() as usize;
    let frames = clip.len();

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)
        .map_err(|e| PrepError::Resample(format!("cannot initialise resampler: {}", e)))?;

    let planes = clip.deinterleave();
    let expected = (frames as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay + CHUNK_FRAMES); channels];

    let mut pos = 0;
    while pos + resampler.input_frames_next() <= frames {
        let next = resampler.input_frames_next();
        let block: Vec<&[f32]> = planes.iter().map(|p| &p[pos..pos + next]).collect();
        let resampled = resampler
            .process(&block, None)
            .map_err(|e| PrepError::Resample(e.to_string()))?;
        append(&mut output, resampled);
        pos += next;
    }

    if pos < frames {
        let block: Vec<&[f32]> = planes.iter().map(|p| &p[pos..]).collect();
        let resampled = resampler
            .process_partial(Some(block.as_slice()), None)
            .map_err(|e| PrepError::Resample(e.to_string()))?;
        append(&mut output, resampled);
    }

    // Flush the filter tail
    while output[0].len() < expected + delay {
        let resampled = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| PrepError::Resample(e.to_string()))?;
        if resampled[0].is_empty() {
            break;
        }
        append(&mut output, resampled);
    }

    for plane in output.iter_mut() {
        plane.drain(..delay.min(plane.len()));
        plane.truncate(expected);
    }

    debug!(
        "Resampled {} frames at {} Hz to {} frames at {} Hz",
        frames,
        clip.sample_rate(),
        output[0].len(),
        target_rate
    );
    Ok(AudioClip::from_planes(&output, target_rate))
}

fn append(output: &mut [Vec<f32>], block: Vec<Vec<f32>>) {
    for (out, plane) in output.iter_mut().zip(block) {
        out.extend(plane);
    }
}

/// Resample every `*.<extension>` file under `folder` in place.
///
/// Only containers that can be written back (wav, flac) are accepted.
pub fn resample_directory<P: AsRef<Path>>(
    folder: P,
    extension: &str,
    target_rate: u32,
    jobs: usize,
) -> Result<RunResult> {
    resample_directory_with(folder, extension, target_rate, jobs, &LogObserver::new("resample"))
}

pub fn resample_directory_with<P: AsRef<Path>>(
    folder: P,
    extension: &str,
    target_rate: u32,
    jobs: usize,
    observer: &dyn ProgressObserver,
) -> Result<RunResult> {
    let folder = folder.as_ref();
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
    info!(
        "Found {} .{} files to resample to {} Hz",
        files.len(),
        extension,
        target_rate
    );
    let items: Vec<WorkItem> = files
        .into_iter()
        .map(|path| WorkItem::in_place(path, format))
        .collect();

    let flac = FlacOptions::default();
    dispatch::dispatch(items.as_slice(), jobs, observer, |item| {
        match resample_one(item, target_rate, &flac) {
            Ok(()) => true,
            Err(e) => {
                error!("Error resampling {}: {}", item.source.display(), e);
                false
            }
        }
    })
}

fn resample_one(item: &WorkItem, target_rate: u32, flac: &FlacOptions) -> Result<()> {
    let clip = decode_audio_file(&item.source)?;
    let resampled = resample_clip(&clip, target_rate)?;
    encode_clip(&resampled, &item.destination, item.format, flac)
}
