/// Configure a `tracing_subscriber::fmt` Layer outputting to stdout
pub mod fmt;

mod span_metrics;
pub use span_metrics::SpanDurations;

use courier_configuration::agent::LogLevel;
use tracing_subscriber::filter::LevelFilter;

/// Convert configuration LogLevel to tracing LevelFilter
pub fn log_level_to_level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Info => LevelFilter::INFO,
    }
}
