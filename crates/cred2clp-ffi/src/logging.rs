//! Routes `tracing` events to the host's logger callback.
//!
//! The host hands over a `printf`-style sink and a minimum severity at
//! `clpInitLib`, and may replace either through `clpSetParam`. When
//! `CLP_DEBUG` is set to anything but `0`, every event is also written to
//! stderr.

use std::ffi::CString;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, Once, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

use crate::types::*;

/// Environment switch for the stderr trace.
pub const DEBUG_ENV: &str = "CLP_DEBUG";

static LOG_LEVEL: AtomicU32 = AtomicU32::new(CLP_LOG_NOTSET);
static LOGGER: Mutex<clp_logger_t> = Mutex::new(None);
static INSTALL: Once = Once::new();

pub(crate) fn log_level() -> CLP_LOG_LEVEL_VALUE {
    LOG_LEVEL.load(Ordering::Relaxed)
}

pub(crate) fn set_log_level(level: CLP_LOG_LEVEL_VALUE) {
    LOG_LEVEL.store(level, Ordering::Relaxed);
}

pub(crate) fn logger() -> clp_logger_t {
    *LOGGER.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn set_logger(logger: clp_logger_t) {
    *LOGGER.lock().unwrap_or_else(PoisonError::into_inner) = logger;
}

/// True when `CLP_DEBUG` asks for the stderr trace.
pub(crate) fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|value| !value.is_empty() && value != "0")
}

/// Install the process-wide subscriber once. A subscriber set up earlier by
/// the host process wins.
pub(crate) fn install() {
    INSTALL.call_once(|| {
        let stderr = debug_enabled().then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
        });
        let _ = tracing_subscriber::registry()
            .with(HostLogLayer)
            .with(stderr)
            .try_init();
    });
}

/// Host severity for a `tracing` level.
pub(crate) fn host_level(level: &Level) -> CLP_LOG_LEVEL_VALUE {
    match *level {
        Level::ERROR => CLP_LOG_ERROR,
        Level::WARN => CLP_LOG_WARN,
        Level::INFO => CLP_LOG_INFO,
        Level::DEBUG => CLP_LOG_DEBUG,
        Level::TRACE => CLP_LOG_NOTSET,
    }
}

/// Layer that formats each event as one line and passes it to the host
/// logger, if one is set and the event is severe enough.
pub(crate) struct HostLogLayer;

impl<S: Subscriber> Layer<S> for HostLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = host_level(event.metadata().level());
        if level > log_level() {
            return;
        }
        let Some(sink) = logger() else {
            return;
        };

        let mut line = LineVisitor::default();
        event.record(&mut line);
        let Ok(format) = CString::new(escape_format(&line.finish())) else {
            return;
        };
        // SAFETY: The host registered `sink` for exactly this call shape. The
        // format has no conversions left, so the argument list is never read.
        unsafe { sink(level, format.as_ptr(), std::ptr::null_mut()) };
    }
}

/// Make `text` safe to pass as a `printf` format.
pub(crate) fn escape_format(text: &str) -> String {
    text.replace('%', "%%").replace('\0', "?")
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}
