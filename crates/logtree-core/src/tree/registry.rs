//! Lazy, memoized construction of the logger tree from dotted names.

use std::sync::{Arc, OnceLock};

use super::context::{DiagnosticBuffer, TreeContext, ROOT_ALIAS};
use super::logger::Logger;
use super::node::LoggerNode;
use crate::error::{LogError, LogResult};
use crate::format::RecordFormatter;
use crate::level::Severity;
use crate::sink::{SharedWriter, SinkSelector, StreamTarget};

/// Maximum length of a dotted logger name, in bytes.
pub const MAX_MODULE_NAME_SIZE: usize = 256;

/// Maximum number of dot-separated segments in a logger name.
pub const MAX_MODULE_SEGMENTS: usize = 24;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Owner of one logger tree and its root.
///
/// Most programs use the process-wide [`Registry::global`]; independent
/// registries are useful for embedding and for tests that need a clean tree.
pub struct Registry {
    ctx: Arc<TreeContext>,
    root: Arc<LoggerNode>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// New tree whose self-diagnostics go to stderr.
    pub fn new() -> Self {
        Self::with_target(StreamTarget::Stderr)
    }

    /// New tree whose self-diagnostics go to `writer`.
    pub fn with_diagnostics(writer: SharedWriter) -> Self {
        Self::with_target(StreamTarget::Writer(writer))
    }

    fn with_target(diagnostics: StreamTarget) -> Self {
        let ctx = Arc::new(TreeContext::new(diagnostics));
        let root = Arc::new(LoggerNode::new_root(ctx.clone()));
        Self { ctx, root }
    }

    /// The process-wide registry, built on first use.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn root(&self) -> Logger {
        Logger::from_node(self.root.clone())
    }

    /// The root logger, optionally reconfigured. `None` leaves a setting unchanged.
    pub fn root_logger(&self, level: Option<Severity>, sink: Option<SinkSelector>) -> Logger {
        let root = self.root();
        apply_unchanged(&root, level, sink);
        root
    }

    /// Look up or create the logger for `name`, creating any missing
    /// ancestors on the way. The empty name is the root.
    pub fn try_get(&self, name: &str) -> LogResult<Logger> {
        if name.is_empty() {
            return Ok(self.root());
        }
        validate_name(name)?;

        let mut diagnostics = DiagnosticBuffer::new(&self.ctx);
        let mut current = self.root.clone();
        let mut path = String::with_capacity(name.len());

        let mut index = self.ctx.index.lock();
        for (i, segment) in name.split('.').enumerate() {
            if i > 0 {
                path.push('.');
            }
            path.push_str(segment);

            let parent_label = if i == 0 { ROOT_ALIAS } else { current.name() };
            diagnostics.push(
                parent_label,
                Severity::Debug,
                format_args!("looking for module {} in dict", path),
            );

            let existing = index.get(&path);
            let expired = existing.is_some_and(|node| node.strong_count() == 0);
            match existing.and_then(|node| node.upgrade()) {
                Some(node) => {
                    diagnostics.push(
                        parent_label,
                        Severity::Debug,
                        format_args!("found existing logging instance for module {}", path),
                    );
                    current = node;
                }
                None => {
                    if expired {
                        diagnostics.push(
                            parent_label,
                            Severity::Debug,
                            format_args!("logging instance for module {} expired, replacing it", path),
                        );
                    }
                    let node = Arc::new(LoggerNode::new_child(segment, path.clone(), current.clone()));
                    index.insert(path.clone(), Arc::downgrade(&node));
                    tracing::debug!(logger = %path, "created logger");
                    diagnostics.push(
                        parent_label,
                        Severity::Debug,
                        format_args!("created new logging instance for module {}", path),
                    );
                    current = node;
                }
            }
        }
        drop(index);

        self.ctx.flush(diagnostics);
        Ok(Logger::from_node(current))
    }

    /// Look up or create `name`, then apply the given settings (`None`
    /// leaves a setting unchanged).
    ///
    /// A malformed name is a programming error: it is reported through the
    /// root logger and the diagnostic stream, and the process exits.
    pub fn get_logger(
        &self,
        name: &str,
        level: Option<Severity>,
        sink: Option<SinkSelector>,
    ) -> Logger {
        match self.try_get(name) {
            Ok(logger) => {
                apply_unchanged(&logger, level, sink);
                logger
            }
            Err(e) => {
                tracing::error!(error = %e, "invalid logger name");
                let message = e.to_string();
                self.root().critical(format_args!("{}", message));
                self.ctx.report(ROOT_ALIAS, Severity::Critical, &message);
                std::process::exit(1);
            }
        }
    }

    /// Formatter used by every logger without its own.
    pub fn default_formatter(&self) -> Arc<RecordFormatter> {
        self.ctx.default_formatter()
    }

    pub fn autolog(&self) -> bool {
        self.ctx.autolog_enabled()
    }

    /// Turn self-diagnostics on or off, returning the previous mode.
    pub fn set_autolog(&self, mode: bool) -> bool {
        self.ctx.set_autolog(mode)
    }

    /// Whether a logger named `name` currently exists.
    pub fn is_live(&self, name: &str) -> bool {
        if name.is_empty() {
            return true;
        }
        self.ctx
            .index
            .lock()
            .get(name)
            .is_some_and(|node| node.strong_count() > 0)
    }

    /// Names of all live non-root loggers, sorted.
    pub fn live_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ctx
            .index
            .lock()
            .iter()
            .filter(|(_, node)| node.strong_count() > 0)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

fn apply_unchanged(logger: &Logger, level: Option<Severity>, sink: Option<SinkSelector>) {
    if let Some(level) = level {
        logger.set_level(level);
    }
    if let Some(sink) = sink {
        logger.set_stream(sink);
    }
}

/// Reject names that are too long or have too many segments.
pub fn validate_name(name: &str) -> LogResult<()> {
    if name.len() > MAX_MODULE_NAME_SIZE {
        let mut end = MAX_MODULE_NAME_SIZE;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        return Err(LogError::NameTooLong {
            prefix: name[..end].to_string(),
            max: MAX_MODULE_NAME_SIZE,
        });
    }
    if name.split('.').count() > MAX_MODULE_SEGMENTS {
        return Err(LogError::TooManySegments {
            name: name.to_string(),
            max: MAX_MODULE_SEGMENTS,
        });
    }
    Ok(())
}
