use std::sync::atomic::{AtomicU64, Ordering};

use super::{ContextLimits, GraphicsContext, LossHandle};

/// Software graphics context.
///
/// Holds no GPU resources. Loss is simulated through the `LossHandle`
/// returned by `loss_handle`.
#[derive(Debug)]
pub struct HeadlessContext {
    label: String,
    limits: ContextLimits,
    loss: LossHandle,
    flushes: AtomicU64,
}

impl HeadlessContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_limits(label, ContextLimits::default())
    }

    pub fn with_limits(label: impl Into<String>, limits: ContextLimits) -> Self {
        Self {
            label: label.into(),
            limits,
            loss: LossHandle::new(),
            flushes: AtomicU64::new(0),
        }
    }

    /// Handle that can lose this context from outside the renderer.
    pub fn loss_handle(&self) -> LossHandle {
        self.loss.clone()
    }

    /// Number of `flush` calls observed.
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl GraphicsContext for HeadlessContext {
    fn label(&self) -> &str {
        &self.label
    }

    fn limits(&self) -> ContextLimits {
        self.limits
    }

    fn is_lost(&self) -> bool {
        self.loss.is_lost()
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }
}
