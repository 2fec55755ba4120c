//! One node of the logger tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::{DiagnosticBuffer, TreeContext, ROOT_ALIAS};
use crate::error::{LogError, LogResult};
use crate::format::RecordFormatter;
use crate::level::{Severity, DEFAULT_THRESHOLD};
use crate::sink::file::resolve_log_path;
use crate::sink::{LogFile, SinkState, StreamTarget};

/// Level and propagation settings, guarded together.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeSettings {
    pub(crate) level: Severity,
    pub(crate) propagate: bool,
}

pub(crate) struct LoggerNode {
    /// Token between dots; empty for the root
    segment: String,
    /// Full dotted path from the root; empty for the root
    name: String,
    pub(crate) ctx: Arc<TreeContext>,
    pub(crate) settings: Mutex<NodeSettings>,
    pub(crate) sinks: Mutex<SinkState>,
    /// Own formatter; `None` means the tree's default formatter
    formatter: Mutex<Option<Arc<RecordFormatter>>>,
    /// Strong link: a child keeps its parent alive
    pub(crate) parent: Option<Arc<LoggerNode>>,
}

impl LoggerNode {
    pub(crate) fn new_root(ctx: Arc<TreeContext>) -> Self {
        Self {
            segment: String::new(),
            name: String::new(),
            ctx,
            settings: Mutex::new(NodeSettings {
                level: DEFAULT_THRESHOLD,
                propagate: false,
            }),
            sinks: Mutex::new(SinkState::default()),
            formatter: Mutex::new(None),
            parent: None,
        }
    }

    pub(crate) fn new_child(segment: &str, name: String, parent: Arc<LoggerNode>) -> Self {
        Self {
            segment: segment.to_string(),
            name,
            ctx: parent.ctx.clone(),
            settings: Mutex::new(NodeSettings {
                level: Severity::Unset,
                propagate: true,
            }),
            sinks: Mutex::new(SinkState::default()),
            formatter: Mutex::new(None),
            parent: Some(parent),
        }
    }

    pub(crate) fn segment(&self) -> &str {
        &self.segment
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Name used in diagnostics.
    pub(crate) fn label(&self) -> &str {
        if self.is_root() {
            ROOT_ALIAS
        } else {
            &self.name
        }
    }

    /// Own level if set, else the nearest ancestor's, else the default.
    pub(crate) fn effective_level(&self) -> Severity {
        let mut node = Some(self);
        while let Some(current) = node {
            let level = current.settings.lock().level;
            if !level.is_unset() {
                return level;
            }
            node = current.parent.as_deref();
        }
        DEFAULT_THRESHOLD
    }

    pub(crate) fn own_formatter(&self) -> Option<Arc<RecordFormatter>> {
        self.formatter.lock().clone()
    }

    pub(crate) fn effective_formatter(&self) -> Arc<RecordFormatter> {
        self.own_formatter()
            .unwrap_or_else(|| self.ctx.default_formatter())
    }

    pub(crate) fn replace_formatter(
        &self,
        formatter: Option<Arc<RecordFormatter>>,
    ) -> Option<Arc<RecordFormatter>> {
        std::mem::replace(&mut *self.formatter.lock(), formatter)
    }

    pub(crate) fn replace_stream(&self, stream: Option<StreamTarget>) -> Option<StreamTarget> {
        std::mem::replace(&mut self.sinks.lock().stream, stream)
    }

    pub(crate) fn logfile_path(&self) -> Option<PathBuf> {
        self.sinks.lock().file.as_ref().map(|f| f.path().to_path_buf())
    }

    /// Point the file sink at `path`, or close it for an empty path.
    ///
    /// The previous file stays open unless the new one opened successfully.
    pub(crate) fn replace_logfile(&self, path: &Path) -> LogResult<()> {
        let mut sinks = self.sinks.lock();

        if path.as_os_str().is_empty() {
            if let Some(old) = sinks.file.take() {
                tracing::debug!(logger = %self.label(), path = %old.path().display(), "closed log file");
            }
            return Ok(());
        }

        let io_error = |source| LogError::Io {
            path: path.to_path_buf(),
            source,
        };
        let resolved = resolve_log_path(path).map_err(io_error)?;
        if sinks.file.as_ref().map(|f| f.path()) == Some(resolved.as_path()) {
            return Ok(());
        }

        let file = LogFile::open_resolved(resolved).map_err(io_error)?;
        tracing::debug!(logger = %self.label(), path = %file.path().display(), "opened log file");
        sinks.file = Some(file);
        Ok(())
    }
}

impl Drop for LoggerNode {
    fn drop(&mut self) {
        let label = self.label().to_string();
        let mut diagnostics = DiagnosticBuffer::new(&self.ctx);
        diagnostics.push(
            &label,
            Severity::Debug,
            format_args!("destroying {} logging module", label),
        );

        if !self.is_root() {
            let this: *const LoggerNode = self;
            let descendant_prefix = format!("{}.", self.name);

            let mut index = self.ctx.index.lock();
            let mut live_descendant = None;

            match index.get(&self.name) {
                Some(entry) if std::ptr::eq(entry.as_ptr(), this) => {
                    // Descendants of a replacement node are not ours.
                    live_descendant = index
                        .iter()
                        .find(|(name, node)| {
                            name.starts_with(&descendant_prefix) && node.strong_count() > 0
                        })
                        .map(|(name, _)| name.clone());
                    index.remove(&self.name);
                    diagnostics.push(
                        &label,
                        Severity::Debug,
                        format_args!("orphaned, removed from the tree index"),
                    );
                }
                // A newer logger took the name; it may already be gone too.
                Some(_) | None => diagnostics.push(
                    &label,
                    Severity::Debug,
                    format_args!("a newer logger took over the name, leaving the index alone"),
                ),
            }
            drop(index);

            if let Some(child) = live_descendant {
                let err = LogError::TreeInvariant(format!(
                    "logging module {} destroyed with active leaves ({})",
                    label, child
                ));
                tracing::error!(logger = %label, "{}", err);
                diagnostics.push_always(&label, Severity::Error, format_args!("{}", err));
            }
        }

        if let Some(file) = self.sinks.get_mut().file.take() {
            tracing::debug!(logger = %label, path = %file.path().display(), "closed log file");
        }
        tracing::trace!(logger = %label, "logger destroyed");

        diagnostics.push(
            &label,
            Severity::Debug,
            format_args!("{} logging module destructed", label),
        );
        self.ctx.flush(diagnostics);
    }
}
