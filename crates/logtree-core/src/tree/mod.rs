//! The logger tree.
//!
//! ## Architecture
//!
//! ```text
//! Registry
//! ├── root: Arc<LoggerNode>            level=warning, propagate=false
//! └── TreeContext (shared by all nodes)
//!     ├── index: Mutex<HashMap<name, Weak<LoggerNode>>>   tree lock
//!     ├── dispatch: ReentrantMutex<()>                    one ancestor walk at a time
//!     ├── default formatter (built on first use)
//!     └── autolog switch + diagnostic stream
//!
//! LoggerNode "app.db"
//! ├── parent: Arc<LoggerNode "app">    child keeps parent alive
//! ├── settings: Mutex<level, propagate>
//! ├── sinks: Mutex<stream, file>
//! └── formatter: Mutex<Option<Arc<RecordFormatter>>>
//! ```
//!
//! Index entries never keep a node alive. When the last handle to a node is
//! dropped, the node removes its own entry (if it still points at it) and
//! releases its parent, which may in turn be torn down.
//!
//! Setters on a `Logger` take the dispatch lock, so they wait for any walk in
//! progress and no walk observes a half-applied change.
//!
//! Lock order: dispatch, then a node's settings, sinks or formatter slot,
//! then formatter contents. The tree lock is never held while any other lock
//! is taken; diagnostics raised under it are buffered and written afterwards.

mod context;
pub mod dispatch;
mod logger;
mod node;
mod registry;

pub use dispatch::RenderGate;
pub use logger::Logger;
pub use registry::{validate_name, Registry, MAX_MODULE_NAME_SIZE, MAX_MODULE_SEGMENTS};
