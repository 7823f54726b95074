//! Side effects requested by plugin scripts.
//!
//! Host functions never touch the connection. They record what they want
//! done here, and the registry applies it once the handler returns.

use std::sync::Arc;

use parking_lot::Mutex;

/// Dispatch control value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Flow {
    /// Keep dispatching.
    Continue,
    /// Stop dispatching the current message everywhere.
    Halt,
    /// Stop dispatching and end the process.
    Shutdown,
}

impl Flow {
    /// True unless dispatch should stop.
    pub fn is_continue(self) -> bool {
        self == Flow::Continue
    }
}

#[derive(Debug, Default)]
struct Effects {
    lines: Vec<String>,
    flow: Option<Flow>,
    reload: bool,
}

/// Shared effect queue.
///
/// Cloned into every host function closure of every plugin engine; the
/// lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<Effects>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a formatted line.
    pub fn send(&self, line: String) {
        self.inner.lock().lines.push(line);
    }

    /// Queue an optional line, as produced by the reply helpers.
    pub fn send_opt(&self, line: Option<String>) {
        if let Some(line) = line {
            self.send(line);
        }
    }

    /// Request a dispatch flow; the strongest request wins.
    pub fn request(&self, flow: Flow) {
        let mut effects = self.inner.lock();
        effects.flow = effects.flow.max(Some(flow));
    }

    /// Request a plugin reload after the current message.
    pub fn request_reload(&self) {
        let mut effects = self.inner.lock();
        effects.reload = true;
        effects.flow = effects.flow.max(Some(Flow::Halt));
    }

    /// Take the pending flow request, if any.
    pub fn take_flow(&self) -> Flow {
        self.inner.lock().flow.take().unwrap_or(Flow::Continue)
    }

    pub fn take_reload(&self) -> bool {
        std::mem::take(&mut self.inner.lock().reload)
    }

    /// Drain queued lines in order.
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.lock().lines)
    }
}
