use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, error};

use voiceprep::batch::progress::LogObserver;
use voiceprep::config::{PrepConfig, VadAggressiveness};
use voiceprep::{
    MaiYamok, RunResult, SilenceTrimmer, TextCleaner, VadTrimmer, WordReplacements,
    audio, convert, fs_util, logger, text,
};

/// Data-preparation utilities for speech datasets
#[derive(Parser, Debug)]
#[command(name = "voiceprep", version, about)]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trim leading and trailing silence into <input_dir>_silence_trimmed
    Trim {
        input_dir: PathBuf,
        /// Output container
        #[arg(long, value_parser = ["wav", "flac"])]
        format: Option<String>,
        /// Worker threads (default: all cores)
        #[arg(long)]
        threads: Option<usize>,
        /// Chunks quieter than this (dBFS) are silence
        #[arg(long, allow_negative_numbers = true)]
        threshold_db: Option<f32>,
        /// Scan step in milliseconds
        #[arg(long)]
        chunk_ms: Option<u32>,
    },
    /// Trim non-speech from both ends of every file, in place
    VadTrim {
        input_dir: PathBuf,
        /// Extension of the files to process
        #[arg(long, default_value = "flac")]
        ext: String,
        /// 0 (least strict) to 3 (most strict)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        aggressiveness: Option<u8>,
        /// Audio kept around the detected speech
        #[arg(long)]
        padding_ms: Option<u32>,
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Convert one WAV file to mono 32 kHz FLAC
    ToFlac { src: PathBuf, dst: PathBuf },
    /// Resample every *.<ext> file under a directory, in place
    Resample {
        input_dir: PathBuf,
        #[arg(long)]
        ext: String,
        /// Target sample rate in Hz
        #[arg(long)]
        rate: Option<u32>,
        /// Parallel jobs
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Copy a directory tree
    Copy { src: PathBuf, dst: PathBuf },
    /// Clean a transcript file line by line
    CleanText {
        input: PathBuf,
        /// Write here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// JSON object of word replacements
        #[arg(long, value_name = "FILE.json")]
        replacements: Option<PathBuf>,
        /// keep, strip or expand
        #[arg(long)]
        mai_yamok: Option<MaiYamok>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every item succeeded
fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => PrepConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PrepConfig::default(),
    };
    debug!("Configuration: {:?}", config);

    match cli.command {
        Command::Trim {
            input_dir,
            format,
            threads,
            threshold_db,
            chunk_ms,
        } => {
            if let Some(format) = format {
                config.output_format = format.parse()?;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            if let Some(db) = threshold_db {
                config.silence.threshold_dbfs = db;
            }
            if let Some(ms) = chunk_ms {
                config.silence.chunk_ms = ms;
            }
            config.validate()?;

            let trimmer = SilenceTrimmer::from_config(&config);
            let result = trimmer.run(
                &input_dir,
                config.output_format,
                config.concurrency(),
                &LogObserver::new("trim"),
            )?;
            Ok(summarize(&result))
        }
        Command::VadTrim {
            input_dir,
            ext,
            aggressiveness,
            padding_ms,
            threads,
        } => {
            if let Some(level) = aggressiveness.and_then(VadAggressiveness::from_level) {
                config.vad.aggressiveness = level;
            }
            if let Some(ms) = padding_ms {
                config.vad.padding_ms = ms;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            config.validate()?;

            let report = VadTrimmer::from_config(&config).trim_directory_with_vad(
                &input_dir,
                &ext,
                config.concurrency(),
                &LogObserver::new("vad-trim"),
            )?;
            if let Some(log_path) = &report.no_speech_log {
                println!(
                    "Found {} files with no speech. List saved to {}",
                    report.no_speech.len(),
                    log_path.display()
                );
            }
            Ok(summarize(&report.result))
        }
        Command::ToFlac { src, dst } => {
            let ok = convert::convert_wav_to_flac(&src, &dst);
            if ok {
                println!("Converted {} -> {}", src.display(), dst.display());
            }
            Ok(ok)
        }
        Command::Resample {
            input_dir,
            ext,
            rate,
            jobs,
        } => {
            if let Some(rate) = rate {
                config.resample.sample_rate = rate;
            }
            if let Some(jobs) = jobs {
                config.resample.jobs = jobs;
            }
            config.validate()?;

            let result = audio::resample_directory(
                &input_dir,
                &ext,
                config.resample.sample_rate,
                config.resample.jobs,
            )?;
            Ok(summarize(&result))
        }
        Command::Copy { src, dst } => {
            let copied = fs_util::recursive_copy(&src, &dst)?;
            println!("Copied {} files to {}", copied, dst.display());
            Ok(true)
        }
        Command::CleanText {
            input,
            output,
            replacements,
            mai_yamok,
        } => {
            if let Some(mode) = mai_yamok {
                config.text.mai_yamok = mode;
            }
            if replacements.is_some() {
                config.text.replacements = replacements;
            }
            let replacements = config
                .text
                .replacements
                .as_deref()
                .map(WordReplacements::load)
                .transpose()?;

            match output {
                Some(output) => {
                    text::clean_file(&input, &output, replacements.as_ref(), config.text.mai_yamok)?;
                }
                None => clean_to_stdout(&input, replacements.as_ref(), config.text.mai_yamok)?,
            }
            Ok(true)
        }
    }
}

fn clean_to_stdout(input: &Path, replacements: Option<&WordReplacements>, mai_yamok: MaiYamok) -> Result<()> {
    let content =
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let cleaner = TextCleaner::new(replacements, mai_yamok)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(cleaner.clean_lines(&content).as_bytes())?;
    Ok(())
}

fn summarize(result: &RunResult) -> bool {
    println!("\nProcessing complete!");
    println!("Successfully processed: {} files", result.succeeded);
    println!("Failed to process: {} files", result.failed);
    result.is_success()
}
