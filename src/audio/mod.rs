//! # Audio I/O
//!
//! In-memory clips plus the codecs and converters that move them to and
//! from disk.

pub mod clip;
pub mod decode;
pub mod encode;
pub mod ffmpeg;
pub mod resample;

pub use clip::AudioClip;
pub use decode::decode_audio_file;
pub use encode::{OutputFormat, encode_clip};
pub use resample::{resample_clip, resample_directory};

#[cfg(test)]
mod tests {
    mod test_clip;
    mod test_codec;
}
