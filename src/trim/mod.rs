//! Silence trimming strategies
//!
//! `silence` cuts by signal level, `vad` by detected speech.

pub mod silence;
pub mod vad;

#[cfg(test)]
mod tests {
    mod test_silence;
    mod test_vad;
}
