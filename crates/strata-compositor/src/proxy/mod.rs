//! Compositor proxy.
//!
//! The proxy mediates between the main-side scene host and the impl-side
//! renderer. It enforces the ordering of the commit and draw protocols, routes
//! animation events back to the host, and runs the context-loss state machine.
//!
//! Threading strategies share the [`Proxy`] interface. [`SingleThreadProxy`]
//! runs both roles on the calling thread; the role discipline it checks
//! (see [`RoleMarker`]) is the same one a split-thread variant must honour.

mod error;
mod role;
mod single_thread;

#[cfg(test)]
mod tests;

pub use error::{ProxyError, SkipReason};
pub use role::{MainBlockedGuard, Role, RoleGuard, RoleMarker};
pub use single_thread::SingleThreadProxy;

use std::time::Duration;

use crate::coords::{IntPoint, IntRect};
use crate::renderer::{RendererCapabilities, RenderingStats};

/// Operations a scene host may request from a compositor proxy, independent
/// of how the proxy schedules the impl role.
///
/// Every method requires the main role.
pub trait Proxy {
    /// Creates the renderer.
    fn start(&mut self);

    /// Tears down the renderer and severs the host. Nothing may follow but drop.
    fn stop(&mut self);

    fn is_started(&self) -> bool;

    /// Acquires a graphics context for the next `initialize_renderer`.
    fn initialize_context(&mut self) -> Result<(), ProxyError>;

    /// Initializes the renderer against the context from `initialize_context`.
    fn initialize_renderer(&mut self) -> Result<(), ProxyError>;

    /// Replaces a lost context. Only valid while the context is lost.
    fn recreate_context(&mut self) -> Result<(), ProxyError>;

    fn is_context_lost(&self) -> bool;

    /// The host reports the context as lost.
    fn lose_context(&mut self);

    /// Cached renderer capabilities; fails before the first initialization.
    fn renderer_capabilities(&self) -> Result<&RendererCapabilities, ProxyError>;

    /// Commits, draws, and reads `rect` of the frame back into `pixels` (RGBA8).
    fn composite_and_readback(&mut self, pixels: &mut [u8], rect: IntRect) -> Result<(), ProxyError>;

    /// Commits, draws, and presents.
    fn composite_immediately(&mut self) -> Result<(), ProxyError>;

    fn finish_all_rendering(&mut self);

    /// The output surface can be drawn into.
    fn set_surface_ready(&mut self);

    fn set_visible(&mut self, visible: bool);

    fn set_needs_animate(&mut self);

    fn set_needs_commit(&mut self);

    fn set_needs_redraw(&mut self);

    /// Whether a commit is already pending.
    fn commit_requested(&self) -> bool;

    fn did_add_animation(&mut self);

    fn start_page_scale_animation(
        &mut self,
        target: IntPoint,
        use_anchor: bool,
        scale: f32,
        duration: Duration,
    );

    /// Forces later swaps to serialize behind all previously issued GPU work.
    fn force_serialize_on_swap_buffers(&mut self);

    fn impl_side_rendering_stats(&self) -> Result<RenderingStats, ProxyError>;
}
