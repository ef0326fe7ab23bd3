//! Minimal `log` backend.
//!
//! Browser builds forward records to the devtools console, native builds
//! write to stderr. Installing twice is harmless.

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable selecting the native log level.
pub const LOG_LEVEL_ENV: &str = "XLEXPORT_LOG";

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        emit(record.level(), &line);
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn emit(level: log::Level, line: &str) {
    let value = wasm_bindgen::JsValue::from_str(line);
    match level {
        log::Level::Error => web_sys::console::error_1(&value),
        log::Level::Warn => web_sys::console::warn_1(&value),
        log::Level::Info => web_sys::console::info_1(&value),
        log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: log::Level, line: &str) {
    eprintln!("{line}");
}

/// Install the logger with the level for this platform.
pub fn init() {
    init_with_level(default_level());
}

/// Install the logger with an explicit level.
pub fn init_with_level(level: LevelFilter) {
    static LOGGER: ConsoleLogger = ConsoleLogger;
    // set_logger fails when a logger is already installed; keep the existing one.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

#[cfg(target_arch = "wasm32")]
fn default_level() -> LevelFilter {
    LevelFilter::Info
}

#[cfg(not(target_arch = "wasm32"))]
fn default_level() -> LevelFilter {
    parse_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
}

/// Map a level name (any case) to a filter; unknown or missing names mean `Info`.
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}
