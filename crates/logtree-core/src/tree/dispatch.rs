//! Event dispatch up the ancestor chain.
//!
//! The message is rendered once. Each node from the origin to the root then
//! gets its own record, rendered with that node's formatter but always with
//! the origin's name and the event's level, and written to that node's sinks
//! when the event passes the node's effective threshold. The walk stops
//! after a node whose propagation flag is off.

use std::fmt;

use chrono::Local;

use super::node::LoggerNode;
use crate::format::{CallerThread, RecordFormatter};
use crate::level::Severity;

/// When a node's record gets rendered during a walk.
///
/// Both policies write exactly the same bytes; they differ only in how much
/// formatting work is spent on nodes that end up writing nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderGate {
    /// Render whenever the node has a sink, then gate the write on the
    /// node's effective threshold.
    SinkOnly,
    /// Render only when the node has a sink and the event passes the node's
    /// effective threshold.
    #[default]
    SinkAndThreshold,
}

impl RenderGate {
    pub fn should_render(self, has_sink: bool, level: i32, threshold: Severity) -> bool {
        match self {
            RenderGate::SinkOnly => has_sink,
            RenderGate::SinkAndThreshold => has_sink && passes(level, threshold),
        }
    }
}

/// Threshold comparison: `level >= threshold`.
pub fn passes(level: i32, threshold: Severity) -> bool {
    level >= threshold.as_raw()
}

pub(crate) fn emit(origin: &LoggerNode, level: i32, args: fmt::Arguments<'_>) {
    emit_with(origin, level, args, RenderGate::default());
}

pub(crate) fn emit_with(origin: &LoggerNode, level: i32, args: fmt::Arguments<'_>, gate: RenderGate) {
    let _walk = origin.ctx.dispatch.lock();

    let message = RecordFormatter::render_message(args);
    let caller = CallerThread::current();

    let mut node = Some(origin);
    while let Some(current) = node {
        let threshold = current.effective_level();
        let propagate = current.settings.lock().propagate;

        let mut sinks = current.sinks.lock();
        if gate.should_render(sinks.is_active(), level, threshold) {
            let line = current.effective_formatter().format_line(
                &Local::now(),
                &caller,
                &message,
                origin.name(),
                level,
            );
            if passes(level, threshold) {
                sinks.write_line(&line);
            }
        }
        drop(sinks);

        if !propagate {
            break;
        }
        node = current.parent.as_deref();
    }
}
