use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Limits reported by a graphics context, consumed when the renderer builds
/// its capability snapshot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ContextLimits {
    /// Largest supported 2D texture edge, in pixels.
    pub max_texture_size: u32,

    /// Whether presenting a sub-rectangle of the back buffer is supported.
    pub supports_partial_swap: bool,

    /// Whether the context prefers BGRA textures over RGBA.
    pub prefers_bgra: bool,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_texture_size: 2048,
            supports_partial_swap: false,
            prefers_bgra: false,
        }
    }
}

/// Opaque connection to a GPU.
///
/// A context can be lost at any time; loss is only ever observed by polling
/// `is_lost`. Once lost, a context never recovers: a fresh one must be created.
pub trait GraphicsContext: Send {
    /// Human readable name for diagnostics.
    fn label(&self) -> &str;

    fn limits(&self) -> ContextLimits;

    fn is_lost(&self) -> bool;

    /// Pushes pending work to the device. Used as a serialization point.
    fn flush(&self) {}
}

/// Shared, sticky loss flag.
///
/// Cloned handles observe and trigger the same loss.
#[derive(Debug, Clone, Default)]
pub struct LossHandle {
    lost: Arc<AtomicBool>,
}

impl LossHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the context as lost.
    pub fn lose(&self) {
        self.lost.store(true, Ordering::Release);
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}
