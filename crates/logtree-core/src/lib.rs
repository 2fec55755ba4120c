//! logtree core library
//!
//! Hierarchical, in-process logging: loggers named by dotted module paths
//! form a tree, and each logger may carry its own threshold, sinks and
//! formatter or inherit them from its ancestors.
//!
//! ## Overview
//!
//! - **Lazy tree**: asking for `"app.db.pool"` creates `app`, `app.db` and
//!   `app.db.pool` on first use. A logger lives as long as a handle to it or
//!   to one of its descendants does.
//! - **Inherited thresholds**: a logger left at `Unset` uses its nearest
//!   ancestor's level, or `Warning` if there is none.
//! - **Propagation**: a record is written by the logger it was emitted on and
//!   then by each ancestor, until one has propagation turned off. Every copy
//!   carries the originating logger's name.
//! - **Templates**: records are rendered from `%`-directive templates such as
//!   `"%t %I[%l] %N%m"`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use logtree_core::{get_logger, root_logger, info, Severity, SinkSelector};
//!
//! let _root = root_logger(Some(Severity::Info), Some(SinkSelector::Stderr));
//! let db = get_logger("app.db", Some(Severity::Debug), None);
//! db.set_logfile("db.log")?;
//!
//! info!(db, "pool ready with {} connections", 8);
//! // stderr:  2024/03/09:07:05:01 [info] app.db: pool ready with 8 connections
//! // db.log:  same line
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod level;
mod macros;
pub mod sink;
pub mod tree;

// Re-exports
pub use config::{LoggerConfig, TreeConfig};
pub use error::{LogError, LogResult};
pub use format::{designate_main_thread, CallerThread, RecordFormatter};
pub use level::{Severity, DEFAULT_THRESHOLD};
pub use sink::{shared_writer, MemoryWriter, SharedWriter, SinkSelector, StreamKind};
pub use tree::{Logger, Registry, RenderGate, MAX_MODULE_NAME_SIZE, MAX_MODULE_SEGMENTS};

/// Logger `name` from the process-wide tree; `None` leaves a setting
/// unchanged. Exits the process if `name` is malformed.
pub fn get_logger(name: &str, level: Option<Severity>, sink: Option<SinkSelector>) -> Logger {
    Registry::global().get_logger(name, level, sink)
}

/// Root of the process-wide tree; `None` leaves a setting unchanged.
pub fn root_logger(level: Option<Severity>, sink: Option<SinkSelector>) -> Logger {
    Registry::global().root_logger(level, sink)
}
