use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

const DEFAULT_FILTER: &str = "warn,voiceprep=info";

/// Initialise the global logger.
///
/// `RUST_LOG` replaces the default filter entirely; `verbosity` (the number
/// of `-v` flags) raises the crate's own level on top of either.
pub fn init_logger(verbosity: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    build_logger(verbosity, rust_log.as_deref())
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}

fn build_logger(verbosity: u8, rust_log: Option<&str>) -> Builder {
    let mut builder = Builder::new();
    match rust_log {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder.parse_filters(DEFAULT_FILTER);
            // Decoder internals are noisy on malformed packets
            builder.filter_module("symphonia", LevelFilter::Error);
        }
    }

    match verbosity {
        0 => {}
        1 => {
            builder.filter_module("voiceprep", LevelFilter::Debug);
        }
        _ => {
            builder.filter_module("voiceprep", LevelFilter::Trace);
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn default_filter_quiets_decoder() {
        let logger = build_logger(0, None).build();
        assert!(!enabled(&logger, "symphonia::core", Level::Warn));
        assert!(enabled(&logger, "voiceprep::batch", Level::Info));
        assert!(!enabled(&logger, "voiceprep::batch", Level::Debug));
    }

    #[test]
    fn rust_log_reaches_decoder() {
        let logger = build_logger(0, Some("symphonia=debug")).build();
        assert!(enabled(&logger, "symphonia::core", Level::Debug));
    }

    #[test]
    fn verbosity_raises_crate_level() {
        let logger = build_logger(2, None).build();
        assert!(enabled(&logger, "voiceprep::trim", Level::Trace));
        assert!(!enabled(&logger, "rayon", Level::Info));
    }
}
