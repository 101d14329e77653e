//! Emitter - the diagnostic sink used by the `debug`, `log`, and `logfail`
//! builders.
//!
//! Emitters are passed explicitly when a reporting strategy is built; the
//! engine never writes to process-global output on its own. The default is
//! standard output.

use parking_lot::Mutex;
use std::io::Write;

/// A sink for diagnostic text.
pub trait Emitter: Send + Sync {
    /// Emit text without a trailing newline.
    fn emit(&self, text: &str);

    /// Emit text followed by a newline.
    fn emitln(&self, text: &str);
}

/// Emitter that writes to standard output.
pub struct StdoutEmitter;

impl Emitter for StdoutEmitter {
    fn emit(&self, text: &str) {
        let mut out = std::io::stdout();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn emitln(&self, text: &str) {
        let mut out = std::io::stdout();
        let _ = writeln!(out, "{text}");
    }
}

/// Emitter that accumulates everything into an in-memory buffer.
///
/// Used by tests to observe what the reporting builders produced.
#[derive(Default)]
pub struct BufferEmitter {
    buf: Mutex<String>,
}

impl BufferEmitter {
    /// Create an empty buffering emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything emitted so far.
    pub fn contents(&self) -> String {
        self.buf.lock().clone()
    }

    /// Discard everything emitted so far.
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Emitter for BufferEmitter {
    fn emit(&self, text: &str) {
        self.buf.lock().push_str(text);
    }

    fn emitln(&self, text: &str) {
        let mut buf = self.buf.lock();
        buf.push_str(text);
        buf.push('\n');
    }
}
