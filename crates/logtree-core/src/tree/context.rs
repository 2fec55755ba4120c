//! State shared by every node of one logger tree.
//!
//! Holds the tree lock (the name index), the dispatch lock, the lazily built
//! default formatter and the self-diagnostics ("autolog") switch.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use chrono::Local;
use parking_lot::{Mutex, ReentrantMutex};

use super::node::LoggerNode;
use crate::format::{CallerThread, RecordFormatter};
use crate::level::Severity;
use crate::sink::StreamTarget;

/// Name used for the root logger in diagnostics.
pub(crate) const ROOT_ALIAS: &str = "root";

pub(crate) struct TreeContext {
    /// Tree lock: full dotted name -> node. Entries do not keep nodes alive.
    pub(crate) index: Mutex<HashMap<String, Weak<LoggerNode>>>,
    /// Held for a whole ancestor walk. Re-entrant so that diagnostics raised
    /// while a walk or a `configure` call is in progress cannot deadlock.
    pub(crate) dispatch: ReentrantMutex<()>,
    default_formatter: OnceLock<Arc<RecordFormatter>>,
    autolog: AtomicBool,
    diagnostics: StreamTarget,
}

impl TreeContext {
    pub(crate) fn new(diagnostics: StreamTarget) -> Self {
        Self {
            index: Mutex::new(HashMap::new()),
            dispatch: ReentrantMutex::new(()),
            default_formatter: OnceLock::new(),
            autolog: AtomicBool::new(false),
            diagnostics,
        }
    }

    pub(crate) fn default_formatter(&self) -> Arc<RecordFormatter> {
        self.default_formatter
            .get_or_init(|| Arc::new(RecordFormatter::default()))
            .clone()
    }

    pub(crate) fn autolog_enabled(&self) -> bool {
        self.autolog.load(Ordering::Acquire)
    }

    pub(crate) fn set_autolog(&self, mode: bool) -> bool {
        self.autolog.swap(mode, Ordering::AcqRel)
    }

    /// Write one self-diagnostic record if autolog is on.
    pub(crate) fn autolog(&self, name: &str, level: Severity, args: fmt::Arguments<'_>) {
        if !self.autolog_enabled() {
            return;
        }
        let message = RecordFormatter::render_message(args);
        self.write_diagnostic(name, level.as_raw(), &message);
    }

    /// Emit buffered diagnostics. Must be called with the tree lock released.
    pub(crate) fn flush(&self, buffer: DiagnosticBuffer) {
        for entry in buffer.entries {
            self.write_diagnostic(&entry.name, entry.level.as_raw(), &entry.message);
        }
    }

    /// Unconditional diagnostic, used for fatal configuration errors.
    pub(crate) fn report(&self, name: &str, level: Severity, message: &str) {
        self.write_diagnostic(name, level.as_raw(), message);
    }

    fn write_diagnostic(&self, name: &str, level: i32, message: &str) {
        let _walk = self.dispatch.lock();
        let line = self.default_formatter().format_line(
            &Local::now(),
            &CallerThread::current(),
            message,
            name,
            level,
        );
        if let Err(e) = self.diagnostics.write_line(&line) {
            tracing::warn!(error = %e, "failed to write logger diagnostic");
        }
    }
}

struct Diagnostic {
    name: String,
    level: Severity,
    message: String,
}

/// Diagnostics collected while the tree lock is held.
///
/// Collection is a no-op when autolog is off.
pub(crate) struct DiagnosticBuffer {
    enabled: bool,
    entries: Vec<Diagnostic>,
}

impl DiagnosticBuffer {
    pub(crate) fn new(ctx: &TreeContext) -> Self {
        Self {
            enabled: ctx.autolog_enabled(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &str, level: Severity, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        self.entries.push(Diagnostic {
            name: name.to_string(),
            level,
            message: RecordFormatter::render_message(args),
        });
    }

    /// Record an entry even when autolog is off.
    pub(crate) fn push_always(&mut self, name: &str, level: Severity, args: fmt::Arguments<'_>) {
        self.entries.push(Diagnostic {
            name: name.to_string(),
            level,
            message: RecordFormatter::render_message(args),
        });
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{shared_writer, MemoryWriter};

    fn context_with_capture() -> (TreeContext, MemoryWriter) {
        let memory = MemoryWriter::new();
        let ctx = TreeContext::new(StreamTarget::Writer(shared_writer(memory.clone())));
        (ctx, memory)
    }

    #[test]
    fn test_autolog_off_by_default() {
        let (ctx, memory) = context_with_capture();
        ctx.autolog("root", Severity::Debug, format_args!("quiet"));
        assert!(memory.is_empty());
    }

    #[test]
    fn test_autolog_writes_when_enabled() {
        let (ctx, memory) = context_with_capture();
        assert!(!ctx.set_autolog(true));
        ctx.default_formatter().set_record_format("[%l] %N%m");
        ctx.autolog("app", Severity::Debug, format_args!("created {}", "app"));
        assert_eq!(memory.lines(), vec!["[debug] app: created app"]);
    }

    #[test]
    fn test_buffer_ignores_entries_when_disabled() {
        let (ctx, memory) = context_with_capture();
        let mut buffer = DiagnosticBuffer::new(&ctx);
        buffer.push("a", Severity::Debug, format_args!("dropped"));
        assert_eq!(buffer.len(), 0);
        buffer.push_always("a", Severity::Error, format_args!("kept"));
        assert_eq!(buffer.len(), 1);

        ctx.default_formatter().set_record_format("%L %m");
        ctx.flush(buffer);
        assert_eq!(memory.lines(), vec!["ERROR kept"]);
    }

    #[test]
    fn test_default_formatter_is_memoized() {
        let (ctx, _memory) = context_with_capture();
        assert!(Arc::ptr_eq(&ctx.default_formatter(), &ctx.default_formatter()));
    }
}
