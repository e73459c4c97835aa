//! Graphics contexts.
//!
//! This module is responsible for:
//! - the `GraphicsContext` contract the renderer initializes against
//! - loss signalling shared between a context and whoever observes it
//! - a software context for headless runs and tests
//! - a wgpu-backed context (adapter + device + queue, no surface)

mod context;
mod gpu;
mod headless;
mod init;

pub use context::{ContextLimits, GraphicsContext, LossHandle};
pub use gpu::WgpuContext;
pub use headless::HeadlessContext;
pub use init::DeviceInit;
