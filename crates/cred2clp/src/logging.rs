use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// Same switch the C library honours; forces trace output here too.
const DEBUG_ENV: &str = "CLP_DEBUG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn effective_filter(level: LogLevel, debug_env: Option<&str>) -> LevelFilter {
    match debug_env {
        Some(value) if !value.is_empty() && value != "0" => LevelFilter::TRACE,
        _ => level.as_filter(),
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let debug_env = std::env::var(DEBUG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(effective_filter(level, debug_env.as_deref()))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_switch_overrides_level() {
        assert_eq!(effective_filter(LogLevel::Warn, None), LevelFilter::WARN);
        assert_eq!(effective_filter(LogLevel::Warn, Some("0")), LevelFilter::WARN);
        assert_eq!(effective_filter(LogLevel::Warn, Some("")), LevelFilter::WARN);
        assert_eq!(effective_filter(LogLevel::Error, Some("1")), LevelFilter::TRACE);
    }
}
