use std::time::{Duration, SystemTime};

use crate::coords::{IntPoint, IntRect};
use crate::device::GraphicsContext;
use crate::host::SceneHost;
use crate::renderer::{AnimationEvent, Renderer, RendererCapabilities, RenderingStats};
use crate::resource::{update_textures, TextureUploadQueue, UploaderKind};
use crate::time::{SystemTimeSource, TimeSource};

use super::{Proxy, ProxyError, Role, RoleMarker, SkipReason};

/// Proxy that runs the main and impl roles on the calling thread.
///
/// Scheduling belongs to the embedder: nothing happens until the host calls
/// [`SingleThreadProxy::commit_and_composite`] (or one of the composite
/// entry points of [`Proxy`]). Every call runs to completion before returning.
///
/// Lifecycle: `new` → `start` → any operations → `stop` → drop.
pub struct SingleThreadProxy<H: SceneHost> {
    /// Back-reference to the scene host; cleared by `stop`.
    host: Option<H>,

    /// Exists exactly while started.
    renderer: Option<H::Renderer>,

    /// Context created by `initialize_context`, consumed by `initialize_renderer`.
    context_before_initialization: Option<Box<dyn GraphicsContext>>,

    /// Snapshot taken at the last successful renderer initialization.
    capabilities: Option<RendererCapabilities>,

    context_lost: bool,

    /// Set by a commit, consumed by the first swap after it.
    next_frame_is_newly_committed_frame: bool,

    roles: RoleMarker,

    clock: Box<dyn TimeSource>,
}

impl<H: SceneHost> SingleThreadProxy<H> {
    pub fn new(host: H) -> Self {
        Self::with_time_source(host, Box::new(SystemTimeSource))
    }

    /// Creates a proxy that samples animation time from `clock`.
    pub fn with_time_source(host: H, clock: Box<dyn TimeSource>) -> Self {
        log::debug!("creating single-thread proxy");
        Self {
            host: Some(host),
            renderer: None,
            context_before_initialization: None,
            capabilities: None,
            context_lost: false,
            next_frame_is_newly_committed_frame: false,
            roles: RoleMarker::new(),
            clock,
        }
    }

    /// Role marker checked by this proxy. Collaborators may clone it to assert
    /// which role they are being called in.
    pub fn roles(&self) -> &RoleMarker {
        &self.roles
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn renderer(&self) -> Option<&H::Renderer> {
        self.renderer.as_ref()
    }

    /// Runs `f` against the renderer inside the impl role.
    pub fn with_renderer<R>(&mut self, f: impl FnOnce(&mut H::Renderer) -> R) -> Option<R> {
        let _impl = self.roles.enter(Role::Impl);
        self.renderer.as_mut().map(f)
    }

    fn renderer_initialized(&self) -> bool {
        self.capabilities.is_some()
    }

    fn parts(&mut self) -> Result<(&mut H, &mut H::Renderer), ProxyError> {
        match (self.host.as_mut(), self.renderer.as_mut()) {
            (Some(host), Some(renderer)) => Ok((host, renderer)),
            _ => Err(ProxyError::NotStarted),
        }
    }

    fn host_or_err(&mut self) -> Result<&mut H, ProxyError> {
        self.host.as_mut().ok_or(ProxyError::NotStarted)
    }

    fn renderer_mut(&mut self) -> Result<&mut H::Renderer, ProxyError> {
        self.renderer.as_mut().ok_or(ProxyError::NotStarted)
    }

    fn initialize_renderer_if_needed(&mut self) -> Result<(), ProxyError> {
        if !self.renderer_initialized() {
            self.initialize_context()?;
            self.initialize_renderer()?;
        }
        if self.context_lost {
            self.recreate_context()?;
        }
        Ok(())
    }

    /// Full synchronous frame: update, commit, draw.
    ///
    /// Presenting is left to the caller (see [`Proxy::composite_immediately`]).
    pub fn commit_and_composite(&mut self) -> Result<(), ProxyError> {
        debug_assert!(self.roles.is_main(), "commit_and_composite requires the main role");

        self.initialize_renderer_if_needed()?;

        let mut queue = TextureUploadQueue::new();
        {
            let (host, renderer) = self.parts()?;
            if renderer.contents_textures_purged() {
                log::debug!("contents textures were purged, evicting host copies");
                host.evict_all_content_textures();
            }

            host.update_scene(&mut queue, renderer.memory_allocation_limit_bytes());
            renderer.reset_contents_textures_purged();
            host.will_commit();
        }

        self.do_commit(&mut queue)?;
        let result = self.do_composite();

        if let Some(host) = self.host.as_mut() {
            host.did_begin_frame();
        }
        result
    }

    /// Hands the scene and `queue` over to the renderer.
    ///
    /// `queue` is empty on return. No draw can interleave with the impl-side
    /// section.
    pub fn do_commit(&mut self, queue: &mut TextureUploadQueue) -> Result<(), ProxyError> {
        debug_assert!(self.roles.is_main(), "do_commit requires the main role");
        log::trace!("commit: {} uploads, {} bytes", queue.len(), queue.byte_size());

        {
            let _blocked = self.roles.block_main();
            let _impl = self.roles.enter(Role::Impl);
            let (host, renderer) = self.parts()?;

            renderer.begin_commit();
            host.begin_commit_on_impl(renderer);

            update_textures(renderer.resource_provider(), queue);

            host.finish_commit_on_impl(renderer);
            renderer.commit_complete();

            // Nothing but this proxy touches the impl tree between commits.
            #[cfg(debug_assertions)]
            {
                let scroll_info = renderer.process_scroll_deltas();
                assert!(
                    scroll_info.scrolls.is_empty(),
                    "impl-side scroll deltas appeared in single-thread mode: {:?}",
                    scroll_info.scrolls
                );
            }
        }

        self.host_or_err()?.commit_complete();
        self.next_frame_is_newly_committed_frame = true;
        Ok(())
    }

    /// Animates and draws one frame without presenting it.
    pub fn do_composite(&mut self) -> Result<(), ProxyError> {
        debug_assert!(!self.context_lost, "draw attempted while the graphics context is lost");
        if self.context_lost {
            return Err(ProxyError::ContextLost);
        }

        {
            let _impl = self.roles.enter(Role::Impl);
            let timestamps = self.clock.now();

            let renderer = self.renderer_mut()?;
            if !renderer.is_visible() {
                log::trace!("draw skipped: renderer hidden");
                return Err(ProxyError::FrameSkipped(SkipReason::Hidden));
            }

            let events = renderer.animate(timestamps.monotonic, timestamps.wall);
            if !events.is_empty() {
                self.post_animation_events_to_main(events, timestamps.wall);
            }

            // prepare_to_draw always produces a frame, so it may only run when
            // a valid one is possible.
            let renderer = self.renderer_mut()?;
            if !renderer.can_draw() {
                log::trace!("draw skipped: renderer cannot draw");
                return Err(ProxyError::FrameSkipped(SkipReason::CannotDraw));
            }

            let mut frame = <H::Renderer as Renderer>::Frame::default();
            renderer.prepare_to_draw(&mut frame);
            renderer.draw_layers(&frame);
            renderer.did_draw_all_layers(&frame);
        }

        if self.renderer.as_ref().is_some_and(|r| r.is_context_lost()) {
            log::warn!("graphics context lost while drawing");
            self.context_lost = true;
            self.host_or_err()?.did_lose_context();
            return Err(ProxyError::ContextLost);
        }

        Ok(())
    }

    fn post_animation_events_to_main(&mut self, events: Vec<AnimationEvent>, wall: SystemTime) {
        debug_assert!(self.roles.is_impl(), "animation events originate on the impl side");
        let _main = self.roles.enter(Role::Main);
        if let Some(host) = self.host.as_mut() {
            host.set_animation_events(events, wall);
        }
    }

    /// Presents the drawn frame; notifies the host once per commit.
    fn swap_and_notify(&mut self) -> bool {
        let swapped = {
            let _impl = self.roles.enter(Role::Impl);
            self.renderer.as_mut().is_some_and(|r| r.swap_buffers())
        };

        if swapped {
            self.did_swap_frame();
        } else {
            log::warn!("swap did not present a frame");
        }
        swapped
    }

    fn did_swap_frame(&mut self) {
        if self.next_frame_is_newly_committed_frame {
            self.next_frame_is_newly_committed_frame = false;
            if let Some(host) = self.host.as_mut() {
                host.did_commit_and_draw_frame();
            }
        }
    }
}

impl<H: SceneHost> Proxy for SingleThreadProxy<H> {
    fn start(&mut self) {
        debug_assert!(self.roles.is_main(), "start requires the main role");
        debug_assert!(self.renderer.is_none(), "proxy started twice");

        let _impl = self.roles.enter(Role::Impl);
        match self.host.as_mut() {
            Some(host) => {
                self.renderer = Some(host.create_renderer());
                log::debug!("proxy started");
            }
            None => log::error!("start called on a stopped proxy"),
        }
    }

    fn stop(&mut self) {
        debug_assert!(self.roles.is_main(), "stop requires the main role");

        {
            let _blocked = self.roles.block_main();
            let _impl = self.roles.enter(Role::Impl);

            if let (Some(host), Some(renderer)) = (self.host.as_mut(), self.renderer.as_mut()) {
                if !renderer.contents_textures_purged() {
                    host.delete_content_textures_on_impl(renderer.resource_provider());
                }
            }
            self.renderer = None;
        }

        self.context_before_initialization = None;
        self.host = None;
        log::debug!("proxy stopped");
    }

    fn is_started(&self) -> bool {
        debug_assert!(self.roles.is_main(), "is_started requires the main role");
        self.renderer.is_some()
    }

    fn initialize_context(&mut self) -> Result<(), ProxyError> {
        debug_assert!(self.roles.is_main(), "initialize_context requires the main role");

        match self.host_or_err()?.create_graphics_context() {
            Ok(context) => {
                log::debug!("created graphics context '{}'", context.label());
                self.context_before_initialization = Some(context);
                Ok(())
            }
            Err(err) => {
                log::warn!("graphics context creation failed: {err:#}");
                Err(ProxyError::ContextCreation)
            }
        }
    }

    fn initialize_renderer(&mut self) -> Result<(), ProxyError> {
        debug_assert!(self.roles.is_main(), "initialize_renderer requires the main role");
        debug_assert!(
            self.context_before_initialization.is_some(),
            "initialize_renderer called without a graphics context"
        );

        let context = self
            .context_before_initialization
            .take()
            .ok_or(ProxyError::MissingContext)?;

        let _impl = self.roles.enter(Role::Impl);
        let renderer = self.renderer_mut()?;
        match renderer.initialize(context, UploaderKind::Unthrottled) {
            Ok(()) => {
                let capabilities = renderer.capabilities();
                log::debug!("renderer initialized: {capabilities:?}");
                self.capabilities = Some(capabilities);
                Ok(())
            }
            Err(err) => {
                log::warn!("renderer initialization failed: {err:#}");
                Err(ProxyError::RendererInitialization)
            }
        }
    }

    fn recreate_context(&mut self) -> Result<(), ProxyError> {
        debug_assert!(self.roles.is_main(), "recreate_context requires the main role");
        debug_assert!(self.context_lost, "recreate_context called while the context is healthy");

        let context = match self.host_or_err()?.create_graphics_context() {
            Ok(context) => context,
            Err(err) => {
                log::warn!("graphics context recreation failed: {err:#}");
                return Err(ProxyError::ContextCreation);
            }
        };

        let initialized = {
            let _blocked = self.roles.block_main();
            let _impl = self.roles.enter(Role::Impl);
            let (host, renderer) = self.parts()?;

            if !renderer.contents_textures_purged() {
                host.delete_content_textures_on_impl(renderer.resource_provider());
            }
            renderer
                .initialize(context, UploaderKind::Unthrottled)
                .map(|()| renderer.capabilities())
        };

        match initialized {
            Ok(capabilities) => {
                self.capabilities = Some(capabilities);
                self.context_lost = false;
                log::info!("graphics context recreated");
                Ok(())
            }
            Err(err) => {
                log::warn!("renderer re-initialization failed: {err:#}");
                Err(ProxyError::RendererInitialization)
            }
        }
    }

    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn lose_context(&mut self) {
        debug_assert!(self.roles.is_main(), "lose_context requires the main role");
        log::warn!("host reported graphics context loss");

        if let Some(host) = self.host.as_mut() {
            host.did_lose_context();
        }
        self.context_lost = true;
    }

    fn renderer_capabilities(&self) -> Result<&RendererCapabilities, ProxyError> {
        // Also read by the host during commits, while the impl role is active.
        self.capabilities
            .as_ref()
            .ok_or(ProxyError::RendererNotInitialized)
    }

    fn composite_and_readback(&mut self, pixels: &mut [u8], rect: IntRect) -> Result<(), ProxyError> {
        debug_assert!(self.roles.is_main(), "composite_and_readback requires the main role");

        self.commit_and_composite()?;

        let lost = {
            let _impl = self.roles.enter(Role::Impl);
            let renderer = self.renderer_mut()?;
            renderer.readback(pixels, rect);
            renderer.is_context_lost()
        };
        if lost {
            log::warn!("graphics context lost during readback");
            return Err(ProxyError::ContextLost);
        }

        self.swap_and_notify();
        Ok(())
    }

    fn composite_immediately(&mut self) -> Result<(), ProxyError> {
        self.commit_and_composite()?;
        self.swap_and_notify();
        Ok(())
    }

    fn finish_all_rendering(&mut self) {
        debug_assert!(self.roles.is_main(), "finish_all_rendering requires the main role");
        let _impl = self.roles.enter(Role::Impl);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.finish_all_rendering();
        }
    }

    fn set_surface_ready(&mut self) {
        // The embedder schedules frames in single-thread mode.
    }

    fn set_visible(&mut self, visible: bool) {
        let _impl = self.roles.enter(Role::Impl);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_visible(visible);
        }
    }

    fn set_needs_animate(&mut self) {
        log::error!("set_needs_animate is only supported by split-thread proxies");
        if cfg!(debug_assertions) {
            panic!("set_needs_animate is only supported by split-thread proxies");
        }
    }

    fn set_needs_commit(&mut self) {
        debug_assert!(self.roles.is_main(), "set_needs_commit requires the main role");
        if let Some(host) = self.host.as_mut() {
            host.schedule_composite();
        }
    }

    fn set_needs_redraw(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_full_root_layer_damage();
        }
        self.set_needs_commit();
    }

    fn commit_requested(&self) -> bool {
        false
    }

    fn did_add_animation(&mut self) {}

    fn start_page_scale_animation(
        &mut self,
        target: IntPoint,
        use_anchor: bool,
        scale: f32,
        duration: Duration,
    ) {
        let start = self.clock.monotonic_now();
        let _impl = self.roles.enter(Role::Impl);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.start_page_scale_animation(target, use_anchor, scale, start, duration);
        }
    }

    fn force_serialize_on_swap_buffers(&mut self) {
        let _impl = self.roles.enter(Role::Impl);
        if self.renderer_initialized() {
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.flush();
            }
        }
    }

    fn impl_side_rendering_stats(&self) -> Result<RenderingStats, ProxyError> {
        self.renderer
            .as_ref()
            .map(|r| r.rendering_stats())
            .ok_or(ProxyError::NotStarted)
    }
}

impl<H: SceneHost> Drop for SingleThreadProxy<H> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                self.renderer.is_none() && self.host.is_none(),
                "proxy dropped without stop()"
            );
        }
    }
}
