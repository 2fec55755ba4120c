//! Public handle to a node of the logger tree.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::dispatch::{self, RenderGate};
use super::node::LoggerNode;
use crate::error::LogResult;
use crate::format::RecordFormatter;
use crate::level::Severity;
use crate::sink::{SharedWriter, SinkSelector, StreamKind, StreamTarget};

/// Reference-counted handle to a logger.
///
/// A logger lives as long as some handle to it, or to one of its
/// descendants, is alive. Dropping the last handle removes it from the tree;
/// asking the registry for the same name afterwards builds a fresh logger
/// with default settings.
#[derive(Clone)]
pub struct Logger {
    node: Arc<LoggerNode>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.node.name())
            .field("level", &self.level())
            .field("propagate", &self.propagates())
            .finish()
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Logger {}

impl Logger {
    pub(crate) fn from_node(node: Arc<LoggerNode>) -> Self {
        Self { node }
    }

    /// Full dotted name; empty for the root.
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// Last segment of the dotted name.
    pub fn segment(&self) -> &str {
        self.node.segment()
    }

    pub fn is_root(&self) -> bool {
        self.node.is_root()
    }

    pub fn parent(&self) -> Option<Logger> {
        self.node.parent.clone().map(Logger::from_node)
    }

    /// Whether both handles point at the same logger.
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    // Every setter holds the dispatch lock, so a walk in progress sees the
    // tree as it was when the walk started.

    // ---- level and propagation ----

    /// The logger's own level; `Unset` means inherited.
    pub fn level(&self) -> Severity {
        self.node.settings.lock().level
    }

    /// Set the logger's own level, returning the previous one.
    pub fn set_level(&self, level: Severity) -> Severity {
        let _walk = self.node.ctx.dispatch.lock();
        std::mem::replace(&mut self.node.settings.lock().level, level)
    }

    /// Threshold actually applied: own level, else nearest ancestor's, else
    /// `Warning`. Resolved on every call.
    pub fn effective_level(&self) -> Severity {
        self.node.effective_level()
    }

    pub fn propagates(&self) -> bool {
        self.node.settings.lock().propagate
    }

    /// Enable or disable propagation to the parent, returning the previous mode.
    pub fn set_propagation(&self, mode: bool) -> bool {
        let _walk = self.node.ctx.dispatch.lock();
        std::mem::replace(&mut self.node.settings.lock().propagate, mode)
    }

    // ---- sinks ----

    pub fn stream(&self) -> Option<StreamKind> {
        self.node.sinks.lock().stream.as_ref().map(StreamTarget::kind)
    }

    /// Select a console stream, returning the kind of the previous one.
    pub fn set_stream(&self, selector: SinkSelector) -> Option<StreamKind> {
        let _walk = self.node.ctx.dispatch.lock();
        self.node
            .replace_stream(StreamTarget::from_selector(selector))
            .map(|old| old.kind())
    }

    /// Write records to a caller-supplied writer.
    pub fn set_writer(&self, writer: SharedWriter) -> Option<StreamKind> {
        let _walk = self.node.ctx.dispatch.lock();
        self.node
            .replace_stream(Some(StreamTarget::Writer(writer)))
            .map(|old| old.kind())
    }

    /// Open `path` as this logger's log file; an empty path closes it.
    ///
    /// On failure the previous file stays active, an error record is logged
    /// through this logger and the error is returned.
    pub fn set_logfile(&self, path: impl AsRef<Path>) -> LogResult<()> {
        let _walk = self.node.ctx.dispatch.lock();
        let result = self.node.replace_logfile(path.as_ref());
        if let Err(e) = &result {
            tracing::warn!(logger = %self.node.label(), error = %e, "log file not changed");
            self.error(format_args!("{}", e));
        }
        result
    }

    /// Absolute path of the open log file.
    pub fn logfile(&self) -> Option<PathBuf> {
        self.node.logfile_path()
    }

    /// Whether records written here would land anywhere.
    pub fn has_sink(&self) -> bool {
        self.node.sinks.lock().is_active()
    }

    // ---- formatting ----

    /// The formatter in effect: the logger's own, else the tree default.
    pub fn formatter(&self) -> Arc<RecordFormatter> {
        self.node.effective_formatter()
    }

    pub fn has_own_formatter(&self) -> bool {
        self.node.own_formatter().is_some()
    }

    /// Attach a (possibly shared) formatter, returning the previous own one.
    pub fn set_formatter(&self, formatter: Arc<RecordFormatter>) -> Option<Arc<RecordFormatter>> {
        let _walk = self.node.ctx.dispatch.lock();
        self.node.replace_formatter(Some(formatter))
    }

    /// Fall back to the tree's default formatter.
    pub fn clear_formatter(&self) -> Option<Arc<RecordFormatter>> {
        let _walk = self.node.ctx.dispatch.lock();
        self.node.replace_formatter(None)
    }

    /// Run `f` with dispatch held, so no record is emitted while several
    /// settings are changed together.
    pub fn configure<R>(&self, f: impl FnOnce(&Logger) -> R) -> R {
        let _walk = self.node.ctx.dispatch.lock();
        f(self)
    }

    // ---- dispatch ----

    pub fn log(&self, level: Severity, args: fmt::Arguments<'_>) {
        dispatch::emit(&self.node, level.as_raw(), args);
    }

    /// Log with a raw numeric level. Out-of-range levels render as `unknown`
    /// and are compared numerically against thresholds.
    pub fn log_raw(&self, level: i32, args: fmt::Arguments<'_>) {
        dispatch::emit(&self.node, level, args);
    }

    /// Log under an explicit render gate policy.
    pub fn log_gated(&self, level: Severity, gate: RenderGate, args: fmt::Arguments<'_>) {
        dispatch::emit_with(&self.node, level.as_raw(), args, gate);
    }

    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Critical, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, args);
    }

    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Warning, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, args);
    }

    /// Self-diagnostic record: written to the tree's diagnostic stream only
    /// when autolog is on, never propagated or gated by thresholds.
    pub fn autolog(&self, level: Severity, args: fmt::Arguments<'_>) {
        self.node.ctx.autolog(self.node.label(), level, args);
    }
}
