use log::{LevelFilter, Log, Metadata, Record};
use std::sync::OnceLock;

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

fn level_from_env() -> LevelFilter {
    match std::env::var("RUST_LOG") {
        Ok(level) => match level.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Warn,
        },
        Err(_) => LevelFilter::Warn,
    }
}

/// Install the stderr logger. `verbose` raises the level to at least `Info`.
pub fn init(verbose: bool) {
    let mut level = level_from_env();
    if verbose && level < LevelFilter::Info {
        level = LevelFilter::Info;
    }

    let logger_ref = LOGGER.get_or_init(|| StderrLogger { level });
    if log::set_logger(logger_ref).is_ok() {
        log::set_max_level(logger_ref.level);
    }
}
