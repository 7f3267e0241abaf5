use super::error::CaptureError;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → negotiated → streaming → stopped
///                        ↑   ↓       │
///                        │  failed   │
///                        └───────────┘  (start again)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Negotiated,
    Streaming,
    Stopped,
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// The failure that ended the last run, if any.
    pub fn error(&self) -> Option<&CaptureError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}
