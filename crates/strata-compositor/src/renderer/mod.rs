//! Impl-side renderer contract.
//!
//! The renderer is the GPU-facing mirror of the scene. The proxy owns it
//! exclusively once started and only ever calls it from the impl role.

mod capabilities;
mod types;

pub use capabilities::{RendererCapabilities, TextureFormat};
pub use types::{
    AnimationEvent,
    AnimationEventKind,
    AnimationTarget,
    LayerId,
    RenderingStats,
    ScrollAndScaleSet,
    ScrollDelta,
};

use std::time::{Duration, Instant, SystemTime};

use anyhow::Result;

use crate::coords::{IntPoint, IntRect};
use crate::device::GraphicsContext;
use crate::resource::{ResourceProvider, UploaderKind};

/// Contract the proxy drives a renderer through.
///
/// Frame methods follow a fixed order per draw: `prepare_to_draw`,
/// `draw_layers`, `did_draw_all_layers`. The proxy only calls
/// `prepare_to_draw` after `can_draw` returned true.
pub trait Renderer {
    /// Texture store lent to the host during commits and teardown.
    type Resources: ResourceProvider;

    /// Per-frame draw descriptor, produced by `prepare_to_draw`.
    type Frame: Default;

    /// Performs GPU-side initialization against `context`.
    ///
    /// On failure the renderer stays uninitialized and drops the context.
    fn initialize(&mut self, context: Box<dyn GraphicsContext>, uploader: UploaderKind) -> Result<()>;

    /// Capability snapshot. Only meaningful after a successful `initialize`.
    fn capabilities(&self) -> RendererCapabilities;

    fn resource_provider(&mut self) -> &mut Self::Resources;

    /// Marks the renderer busy with a commit.
    fn begin_commit(&mut self);

    fn commit_complete(&mut self);

    /// Takes scroll/scale deltas accumulated on the impl tree since the last call.
    fn process_scroll_deltas(&mut self) -> ScrollAndScaleSet;

    /// Steps animations. Returns events the host should observe.
    fn animate(&mut self, monotonic: Instant, wall: SystemTime) -> Vec<AnimationEvent>;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Whether a valid frame can be produced right now.
    fn can_draw(&self) -> bool;

    fn prepare_to_draw(&mut self, frame: &mut Self::Frame);

    fn draw_layers(&mut self, frame: &Self::Frame);

    /// Frame-boundary housekeeping.
    fn did_draw_all_layers(&mut self, frame: &Self::Frame);

    /// Presents the back buffer. Returns false when nothing was presented.
    fn swap_buffers(&mut self) -> bool;

    fn is_context_lost(&self) -> bool;

    /// Copies `rect` of the current back buffer into `pixels` as RGBA8.
    fn readback(&mut self, pixels: &mut [u8], rect: IntRect);

    /// Whether content textures were dropped (e.g. while backgrounded).
    fn contents_textures_purged(&self) -> bool;

    fn reset_contents_textures_purged(&mut self);

    /// Budget the host must respect when queueing uploads.
    fn memory_allocation_limit_bytes(&self) -> usize;

    /// Forces the next frame to redraw everything.
    fn set_full_root_layer_damage(&mut self);

    /// Blocks until submitted GPU work has completed.
    fn finish_all_rendering(&mut self);

    /// Issues a no-op to the context so later swaps serialize behind it.
    fn flush(&mut self);

    fn start_page_scale_animation(
        &mut self,
        target: IntPoint,
        use_anchor: bool,
        scale: f32,
        start: Instant,
        duration: Duration,
    );

    fn rendering_stats(&self) -> RenderingStats;
}
