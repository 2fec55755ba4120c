//! Caller thread identification for `%i` / `%I`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

static MAIN_THREAD: RwLock<Option<ThreadId>> = RwLock::new(None);

/// Mark the calling thread as the main thread.
///
/// Records logged from the main thread render `%I` as nothing. Until this is
/// called, the thread the runtime named `"main"` is considered the main thread.
pub fn designate_main_thread() {
    *MAIN_THREAD.write() = Some(thread::current().id());
}

/// Hash-derived short identifier of a thread, stable for the process lifetime.
fn thread_tag(id: ThreadId) -> String {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    format!("{:x}", hasher.finish() as u32)
}

/// Identity of the thread a record is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerThread {
    tag: String,
    is_main: bool,
}

impl CallerThread {
    /// Capture the calling thread.
    pub fn current() -> Self {
        let current = thread::current();
        let is_main = match *MAIN_THREAD.read() {
            Some(main) => main == current.id(),
            None => current.name() == Some("main"),
        };
        Self {
            tag: thread_tag(current.id()),
            is_main,
        }
    }

    /// Explicit identity, for rendering on behalf of another thread.
    pub fn new(tag: impl Into<String>, is_main: bool) -> Self {
        Self {
            tag: tag.into(),
            is_main,
        }
    }

    /// Hex identifier rendered by `%i`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Marker rendered by `%I`: empty on the main thread, `"(<tag>) "` elsewhere.
    pub fn marker(&self) -> String {
        if self.is_main {
            String::new()
        } else {
            format!("({}) ", self.tag)
        }
    }
}
