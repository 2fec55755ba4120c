//! Message and record rendering.
//!
//! A [`RecordFormatter`] turns a severity, a logger name and a message into the
//! final text line written to a sink. Formatters are shared between loggers
//! through `Arc`, so changing the templates of one formatter changes the
//! output of every logger that references it.
//!
//! ```ignore
//! use std::sync::Arc;
//! use logtree_core::format::RecordFormatter;
//!
//! let fmt = Arc::new(RecordFormatter::new("[%L] %N%m", "%H:%M:%S", true));
//! logger.set_formatter(fmt.clone());
//! fmt.set_record_format("%t %L %n: %m");
//! ```

pub mod template;
pub mod thread;

use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use parking_lot::Mutex;

pub use template::{RecordFields, MAX_RECORD_LENGTH};
pub use thread::{designate_main_thread, CallerThread};

/// Default record template: `"<time> [<level>] <name>: <message>"`.
pub const DEFAULT_RECORD_FORMAT: &str = "%t %I[%l] %N%m";

/// Default time template (strftime tokens).
pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d:%H:%M:%S";

/// Maximum size of a rendered message, in bytes.
pub const MAX_MESSAGE_LENGTH: usize = 1023;

/// Maximum size of a rendered timestamp, in bytes.
pub const MAX_TIME_LENGTH: usize = 63;

/// Rendered instead of a timestamp when the time template cannot be used.
pub const TIME_FORMAT_ERROR: &str = "time fmt error";

/// Rendered instead of a message whose formatting failed.
pub const MESSAGE_FORMAT_ERROR: &str = "logging error: message formatting failed";

#[derive(Debug, Clone)]
struct FormatterState {
    record_format: String,
    time_format: String,
    trailing_newline: bool,
}

/// Template-driven record renderer.
///
/// All accessors and mutators lock the formatter's own state for the
/// duration of the call only.
#[derive(Debug)]
pub struct RecordFormatter {
    state: Mutex<FormatterState>,
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_FORMAT, DEFAULT_TIME_FORMAT, true)
    }
}

impl RecordFormatter {
    pub fn new(
        record_format: impl Into<String>,
        time_format: impl Into<String>,
        trailing_newline: bool,
    ) -> Self {
        Self {
            state: Mutex::new(FormatterState {
                record_format: record_format.into(),
                time_format: time_format.into(),
                trailing_newline,
            }),
        }
    }

    pub fn record_format(&self) -> String {
        self.state.lock().record_format.clone()
    }

    pub fn set_record_format(&self, record_format: impl Into<String>) {
        self.state.lock().record_format = record_format.into();
    }

    pub fn time_format(&self) -> String {
        self.state.lock().time_format.clone()
    }

    pub fn set_time_format(&self, time_format: impl Into<String>) {
        self.state.lock().time_format = time_format.into();
    }

    pub fn trailing_newline(&self) -> bool {
        self.state.lock().trailing_newline
    }

    /// Set the end-of-line mode, returning the previous one.
    pub fn set_trailing_newline(&self, trailing_newline: bool) -> bool {
        std::mem::replace(&mut self.state.lock().trailing_newline, trailing_newline)
    }

    /// Render a message from format arguments, bounded to
    /// [`MAX_MESSAGE_LENGTH`] bytes. Never fails.
    pub fn render_message(args: fmt::Arguments<'_>) -> String {
        if let Some(s) = args.as_str() {
            let mut out = String::new();
            template::push_capped(&mut out, s, MAX_MESSAGE_LENGTH);
            return out;
        }
        let mut writer = BoundedWriter::new(MAX_MESSAGE_LENGTH);
        match writer.write_fmt(args) {
            Ok(()) => writer.buf,
            Err(_) => MESSAGE_FORMAT_ERROR.to_string(),
        }
    }

    /// Render `now` with this formatter's time template.
    pub fn render_time(&self, now: &DateTime<Local>) -> String {
        let time_format = self.time_format();
        render_time_with(&time_format, now)
    }

    /// Render a record for the calling thread at the current time.
    pub fn render_record(&self, message: &str, name: &str, level: i32) -> String {
        self.render_record_at(&Local::now(), &CallerThread::current(), message, name, level)
    }

    /// Render a record with an explicit timestamp and caller thread.
    pub fn render_record_at(
        &self,
        now: &DateTime<Local>,
        caller: &CallerThread,
        message: &str,
        name: &str,
        level: i32,
    ) -> String {
        let state = self.snapshot();
        render_with(&state, now, caller, message, name, level)
    }

    /// Render the full line written to a sink: the record plus the trailing
    /// newline when enabled. Uses one consistent snapshot of the templates.
    pub fn format_line(
        &self,
        now: &DateTime<Local>,
        caller: &CallerThread,
        message: &str,
        name: &str,
        level: i32,
    ) -> String {
        let state = self.snapshot();
        let mut line = render_with(&state, now, caller, message, name, level);
        if state.trailing_newline {
            line.push('\n');
        }
        line
    }

    fn snapshot(&self) -> FormatterState {
        self.state.lock().clone()
    }
}

fn render_with(
    state: &FormatterState,
    now: &DateTime<Local>,
    caller: &CallerThread,
    message: &str,
    name: &str,
    level: i32,
) -> String {
    let time = render_time_with(&state.time_format, now);
    template::expand(
        &state.record_format,
        &RecordFields {
            time: &time,
            message,
            name,
            level,
            caller,
        },
    )
}

/// Render `now` with a strftime-style template, or [`TIME_FORMAT_ERROR`] when
/// the template is invalid or the result exceeds [`MAX_TIME_LENGTH`].
pub fn render_time_with(time_format: &str, now: &DateTime<Local>) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(time_format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return TIME_FORMAT_ERROR.to_string();
    }

    let mut out = String::new();
    if write!(out, "{}", now.format_with_items(items.iter())).is_err()
        || out.len() > MAX_TIME_LENGTH
    {
        return TIME_FORMAT_ERROR.to_string();
    }
    out
}

/// `fmt::Write` sink that silently drops everything from the first piece
/// that does not fit.
struct BoundedWriter {
    buf: String,
    cap: usize,
    full: bool,
}

impl BoundedWriter {
    fn new(cap: usize) -> Self {
        Self {
            buf: String::new(),
            cap,
            full: false,
        }
    }
}

impl fmt::Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.full {
            self.full = !template::push_capped(&mut self.buf, s, self.cap);
        }
        Ok(())
    }
}
