use std::fmt;

use thiserror::Error;

/// Why a draw finished without producing a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// The output surface is hidden.
    Hidden,
    /// The renderer cannot produce a valid frame (no viewport, no scene, ...).
    CannotDraw,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Hidden => f.write_str("renderer is not visible"),
            SkipReason::CannotDraw => f.write_str("renderer cannot draw"),
        }
    }
}

/// Recoverable proxy failures, surfaced to the host which decides on retries.
#[derive(Debug, Copy, Clone, Error, Eq, PartialEq)]
pub enum ProxyError {
    #[error("proxy is not started")]
    NotStarted,

    #[error("no graphics context is waiting for renderer initialization")]
    MissingContext,

    #[error("graphics context creation failed")]
    ContextCreation,

    #[error("renderer initialization failed")]
    RendererInitialization,

    #[error("renderer has not been initialized")]
    RendererNotInitialized,

    #[error("frame skipped: {0}")]
    FrameSkipped(SkipReason),

    #[error("graphics context lost")]
    ContextLost,
}

impl ProxyError {
    /// Skips are not faults; nothing needs recovering.
    pub fn is_skip(&self) -> bool {
        matches!(self, ProxyError::FrameSkipped(_))
    }
}
