use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Info,
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Warn,
            message: message.into(),
            elapsed: None,
        }
    }
}

/// Logging capability handed into each component per call. There is no
/// process-wide logger in the library; the binary decides where events go.
pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Sink that drops everything.
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn event(&self, _event: ProgressEvent) {}
}
