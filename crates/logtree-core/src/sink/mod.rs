//! Output destinations for rendered records.
//!
//! A logger has at most one stream target and, independently, at most one
//! open log file. Both can be active at once; each write is followed by a
//! flush so a record is durable before the next one is written.

pub mod file;
pub mod memory;

use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub use file::LogFile;
pub use memory::MemoryWriter;

/// A writable stream shared between loggers.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Wrap any writer so it can be attached to loggers.
pub fn shared_writer<W: Write + Send + 'static>(writer: W) -> SharedWriter {
    Arc::new(Mutex::new(writer))
}

/// Console stream selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkSelector {
    /// Detach the stream target
    #[serde(alias = "devnull")]
    None,
    Stdout,
    Stderr,
    /// The diagnostic stream (unbuffered stderr)
    Stdlog,
}

impl FromStr for SinkSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "devnull" => Ok(SinkSelector::None),
            "stdout" => Ok(SinkSelector::Stdout),
            "stderr" => Ok(SinkSelector::Stderr),
            "stdlog" => Ok(SinkSelector::Stdlog),
            other => Err(format!("unknown sink '{}'", other)),
        }
    }
}

/// What kind of stream a logger currently writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
    Stdlog,
    /// A caller-supplied writer
    Writer,
}

/// A stream a logger writes records to.
#[derive(Clone)]
pub enum StreamTarget {
    Stdout,
    Stderr,
    Stdlog,
    Writer(SharedWriter),
}

impl std::fmt::Debug for StreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StreamTarget::{:?}", self.kind())
    }
}

impl StreamTarget {
    /// Target for a console selector; `None` for [`SinkSelector::None`].
    pub fn from_selector(selector: SinkSelector) -> Option<StreamTarget> {
        match selector {
            SinkSelector::None => None,
            SinkSelector::Stdout => Some(StreamTarget::Stdout),
            SinkSelector::Stderr => Some(StreamTarget::Stderr),
            SinkSelector::Stdlog => Some(StreamTarget::Stdlog),
        }
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            StreamTarget::Stdout => StreamKind::Stdout,
            StreamTarget::Stderr => StreamKind::Stderr,
            StreamTarget::Stdlog => StreamKind::Stdlog,
            StreamTarget::Writer(_) => StreamKind::Writer,
        }
    }

    /// Write one line and flush.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            StreamTarget::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(line.as_bytes())?;
                out.flush()
            }
            StreamTarget::Stderr | StreamTarget::Stdlog => {
                let mut err = io::stderr().lock();
                err.write_all(line.as_bytes())?;
                err.flush()
            }
            StreamTarget::Writer(writer) => {
                let mut w = writer.lock();
                w.write_all(line.as_bytes())?;
                w.flush()
            }
        }
    }
}

/// Sink configuration of one logger.
#[derive(Debug, Default)]
pub struct SinkState {
    pub stream: Option<StreamTarget>,
    pub file: Option<LogFile>,
}

impl SinkState {
    /// Whether a record written now would land anywhere.
    pub fn is_active(&self) -> bool {
        self.stream.is_some() || self.file.is_some()
    }

    /// Write `line` to the stream and the file. Failures are traced and
    /// otherwise ignored; logging never fails visibly.
    pub fn write_line(&mut self, line: &str) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.write_line(line) {
                tracing::warn!(kind = ?stream.kind(), error = %e, "failed to write log record to stream");
            }
        }
        if let Some(file) = &mut self.file {
            if let Err(e) = file.write_line(line) {
                tracing::warn!(path = %file.path().display(), error = %e, "failed to write log record to file");
            }
        }
    }
}
