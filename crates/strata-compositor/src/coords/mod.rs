//! Integer device-pixel geometry shared by the proxy, the upload queue and renderers.
//!
//! Canonical space:
//! - Device pixels (no DPI scaling at this layer)
//! - Origin top-left
//! - +X right, +Y down

mod point;
mod rect;
mod size;

pub use point::IntPoint;
pub use rect::IntRect;
pub use size::IntSize;
