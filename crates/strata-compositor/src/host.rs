//! Main-side scene host contract.
//!
//! The host owns the authoritative scene. The proxy calls back into it at
//! fixed points of the commit and draw protocols. Calls that receive the
//! renderer or its resources run in the impl role; the borrow ends with the
//! call.

use std::time::SystemTime;

use anyhow::Result;

use crate::device::GraphicsContext;
use crate::renderer::{AnimationEvent, Renderer};
use crate::resource::TextureUploadQueue;

pub trait SceneHost {
    /// Renderer type this host knows how to synchronize into.
    type Renderer: Renderer;

    /// Builds the impl-side renderer. Construction only, no GPU work.
    fn create_renderer(&mut self) -> Self::Renderer;

    /// Opens a new graphics context.
    fn create_graphics_context(&mut self) -> Result<Box<dyn GraphicsContext>>;

    /// Updates the scene and queues the texture writes the next commit needs,
    /// staying within `memory_limit_bytes`.
    fn update_scene(&mut self, queue: &mut TextureUploadQueue, memory_limit_bytes: usize);

    fn will_commit(&mut self);

    /// Synchronizes the authoritative scene into `renderer`.
    fn begin_commit_on_impl(&mut self, renderer: &mut Self::Renderer);

    fn finish_commit_on_impl(&mut self, renderer: &mut Self::Renderer);

    fn commit_complete(&mut self);

    /// Drops every main-side content texture so it is regenerated.
    fn evict_all_content_textures(&mut self);

    /// Releases content textures that live in the renderer's resource store.
    fn delete_content_textures_on_impl(
        &mut self,
        resources: &mut <Self::Renderer as Renderer>::Resources,
    );

    fn did_lose_context(&mut self);

    /// A frame reflecting the latest commit was presented.
    fn did_commit_and_draw_frame(&mut self);

    /// Frame accounting for a composite is finished, whatever its outcome.
    fn did_begin_frame(&mut self);

    /// The proxy wants a composite; in single-thread mode the embedder schedules it.
    fn schedule_composite(&mut self) {}

    /// Animation events produced while stepping the impl tree.
    fn set_animation_events(&mut self, events: Vec<AnimationEvent>, wall_time: SystemTime) {
        let _ = (events, wall_time);
    }
}
