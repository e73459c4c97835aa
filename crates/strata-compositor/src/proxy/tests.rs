use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{bail, Result};

use super::*;
use crate::coords::{IntPoint, IntRect, IntSize};
use crate::device::{GraphicsContext, HeadlessContext, LossHandle};
use crate::headless::{HeadlessInit, HeadlessLayer, HeadlessRenderer, HeadlessResources};
use crate::host::SceneHost;
use crate::logging::{init_logging, LoggingConfig};
use crate::renderer::{
    AnimationEvent, AnimationEventKind, AnimationTarget, LayerId, Renderer, RendererCapabilities,
    RenderingStats, ScrollAndScaleSet, ScrollDelta,
};
use crate::resource::{
    ResourceProvider, TextureId, TextureUpload, TextureUploadQueue, UploadError, UploaderKind,
};
use crate::time::ManualTimeSource;

// ── recording collaborators ───────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Call {
    name: &'static str,
    role: Role,
    main_blocked: bool,
}

/// State shared by the mock host, its renderer and the test body.
#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    roles: Option<RoleMarker>,

    hidden: bool,
    cannot_draw: bool,
    swap_fails: bool,
    lose_on_draw: bool,
    lose_on_readback: bool,
    context_creation_fails: bool,
    init_fails: bool,
    purged: bool,
    stray_scroll: bool,
    lost: bool,
    initializations: u32,

    uploads_per_update: usize,
    animation_events: Vec<AnimationEvent>,
    delivered_events: Vec<AnimationEvent>,
}

type Handle = Rc<RefCell<Shared>>;

fn record(shared: &Handle, name: &'static str) {
    let mut s = shared.borrow_mut();
    let (role, main_blocked) = s
        .roles
        .as_ref()
        .map_or((Role::Main, false), |r| (r.current(), r.is_main_blocked()));
    s.calls.push(Call {
        name,
        role,
        main_blocked,
    });
}

struct MockResources {
    shared: Handle,
    textures: Vec<TextureId>,
}

impl ResourceProvider for MockResources {
    fn apply_upload(&mut self, upload: TextureUpload) -> Result<(), UploadError> {
        record(&self.shared, "resources.apply_upload");
        self.textures.push(upload.target());
        Ok(())
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.textures.retain(|t| *t != id);
    }

    fn delete_all_textures(&mut self) {
        self.textures.clear();
    }

    fn contains_texture(&self, id: TextureId) -> bool {
        self.textures.contains(&id)
    }

    fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn resident_bytes(&self) -> usize {
        self.textures.len() * 4
    }
}

struct MockRenderer {
    shared: Handle,
    resources: MockResources,
}

impl Renderer for MockRenderer {
    type Resources = MockResources;
    type Frame = ();

    fn initialize(&mut self, _context: Box<dyn GraphicsContext>, _uploader: UploaderKind) -> Result<()> {
        record(&self.shared, "renderer.initialize");
        let mut s = self.shared.borrow_mut();
        if s.init_fails {
            bail!("initialization refused");
        }
        s.lost = false;
        s.initializations += 1;
        Ok(())
    }

    fn capabilities(&self) -> RendererCapabilities {
        // Each successful initialization reports a distinct limit.
        RendererCapabilities {
            max_texture_size: 1024 * self.shared.borrow().initializations,
            ..RendererCapabilities::default()
        }
    }

    fn resource_provider(&mut self) -> &mut MockResources {
        &mut self.resources
    }

    fn begin_commit(&mut self) {
        record(&self.shared, "renderer.begin_commit");
    }

    fn commit_complete(&mut self) {
        record(&self.shared, "renderer.commit_complete");
    }

    fn process_scroll_deltas(&mut self) -> ScrollAndScaleSet {
        let mut set = ScrollAndScaleSet::default();
        if self.shared.borrow().stray_scroll {
            set.scrolls.push(ScrollDelta {
                layer: LayerId(1),
                delta: IntPoint::new(0, 5),
            });
        }
        set
    }

    fn animate(&mut self, _monotonic: Instant, _wall: SystemTime) -> Vec<AnimationEvent> {
        record(&self.shared, "renderer.animate");
        std::mem::take(&mut self.shared.borrow_mut().animation_events)
    }

    fn is_visible(&self) -> bool {
        !self.shared.borrow().hidden
    }

    fn set_visible(&mut self, visible: bool) {
        record(&self.shared, "renderer.set_visible");
        self.shared.borrow_mut().hidden = !visible;
    }

    fn can_draw(&self) -> bool {
        !self.shared.borrow().cannot_draw
    }

    fn prepare_to_draw(&mut self, _frame: &mut ()) {
        record(&self.shared, "renderer.prepare_to_draw");
    }

    fn draw_layers(&mut self, _frame: &()) {
        record(&self.shared, "renderer.draw_layers");
    }

    fn did_draw_all_layers(&mut self, _frame: &()) {
        record(&self.shared, "renderer.did_draw_all_layers");
        let mut s = self.shared.borrow_mut();
        if s.lose_on_draw {
            s.lost = true;
        }
    }

    fn swap_buffers(&mut self) -> bool {
        record(&self.shared, "renderer.swap_buffers");
        let s = self.shared.borrow();
        !s.swap_fails && !s.lost
    }

    fn is_context_lost(&self) -> bool {
        self.shared.borrow().lost
    }

    fn readback(&mut self, pixels: &mut [u8], _rect: IntRect) {
        record(&self.shared, "renderer.readback");
        pixels.fill(0xab);
        let mut s = self.shared.borrow_mut();
        if s.lose_on_readback {
            s.lost = true;
        }
    }

    fn contents_textures_purged(&self) -> bool {
        self.shared.borrow().purged
    }

    fn reset_contents_textures_purged(&mut self) {
        record(&self.shared, "renderer.reset_contents_textures_purged");
        self.shared.borrow_mut().purged = false;
    }

    fn memory_allocation_limit_bytes(&self) -> usize {
        4096
    }

    fn set_full_root_layer_damage(&mut self) {
        record(&self.shared, "renderer.set_full_root_layer_damage");
    }

    fn finish_all_rendering(&mut self) {
        record(&self.shared, "renderer.finish_all_rendering");
    }

    fn flush(&mut self) {
        record(&self.shared, "renderer.flush");
    }

    fn start_page_scale_animation(
        &mut self,
        _target: IntPoint,
        _use_anchor: bool,
        _scale: f32,
        _start: Instant,
        _duration: Duration,
    ) {
        record(&self.shared, "renderer.start_page_scale_animation");
    }

    fn rendering_stats(&self) -> RenderingStats {
        RenderingStats {
            commits: 3,
            ..RenderingStats::default()
        }
    }
}

struct MockHost {
    shared: Handle,
}

impl SceneHost for MockHost {
    type Renderer = MockRenderer;

    fn create_renderer(&mut self) -> MockRenderer {
        record(&self.shared, "host.create_renderer");
        MockRenderer {
            shared: self.shared.clone(),
            resources: MockResources {
                shared: self.shared.clone(),
                textures: Vec::new(),
            },
        }
    }

    fn create_graphics_context(&mut self) -> Result<Box<dyn GraphicsContext>> {
        record(&self.shared, "host.create_graphics_context");
        if self.shared.borrow().context_creation_fails {
            bail!("no adapter");
        }
        Ok(Box::new(HeadlessContext::new("mock")))
    }

    fn update_scene(&mut self, queue: &mut TextureUploadQueue, _memory_limit_bytes: usize) {
        record(&self.shared, "host.update_scene");
        let uploads = self.shared.borrow().uploads_per_update;
        for i in 0..uploads {
            queue.push_full(TextureId(i as u64), IntSize::new(1, 1), vec![0; 4]);
        }
    }

    fn will_commit(&mut self) {
        record(&self.shared, "host.will_commit");
    }

    fn begin_commit_on_impl(&mut self, _renderer: &mut MockRenderer) {
        record(&self.shared, "host.begin_commit_on_impl");
    }

    fn finish_commit_on_impl(&mut self, _renderer: &mut MockRenderer) {
        record(&self.shared, "host.finish_commit_on_impl");
    }

    fn commit_complete(&mut self) {
        record(&self.shared, "host.commit_complete");
    }

    fn evict_all_content_textures(&mut self) {
        record(&self.shared, "host.evict_all_content_textures");
    }

    fn delete_content_textures_on_impl(&mut self, resources: &mut MockResources) {
        record(&self.shared, "host.delete_content_textures_on_impl");
        resources.delete_all_textures();
    }

    fn did_lose_context(&mut self) {
        record(&self.shared, "host.did_lose_context");
    }

    fn did_commit_and_draw_frame(&mut self) {
        record(&self.shared, "host.did_commit_and_draw_frame");
    }

    fn did_begin_frame(&mut self) {
        record(&self.shared, "host.did_begin_frame");
    }

    fn schedule_composite(&mut self) {
        record(&self.shared, "host.schedule_composite");
    }

    fn set_animation_events(&mut self, events: Vec<AnimationEvent>, _wall_time: SystemTime) {
        record(&self.shared, "host.set_animation_events");
        self.shared.borrow_mut().delivered_events.extend(events);
    }
}

struct Fixture {
    shared: Handle,
    proxy: SingleThreadProxy<MockHost>,
}

impl Fixture {
    fn new() -> Self {
        Self::configured(|_| {})
    }

    fn configured(configure: impl FnOnce(&mut Shared)) -> Self {
        init_logging(LoggingConfig::for_tests());

        let shared: Handle = Rc::default();
        configure(&mut shared.borrow_mut());

        let proxy = SingleThreadProxy::with_time_source(
            MockHost {
                shared: shared.clone(),
            },
            Box::new(ManualTimeSource::new()),
        );
        shared.borrow_mut().roles = Some(proxy.roles().clone());
        Self { shared, proxy }
    }

    fn started() -> Self {
        let mut fixture = Self::new();
        fixture.proxy.start();
        fixture
    }

    fn set(&self, configure: impl FnOnce(&mut Shared)) {
        configure(&mut self.shared.borrow_mut());
    }

    fn names(&self) -> Vec<&'static str> {
        self.shared.borrow().calls.iter().map(|c| c.name).collect()
    }

    fn calls_named(&self, name: &str) -> Vec<Call> {
        self.shared
            .borrow()
            .calls
            .iter()
            .filter(|c| c.name == name)
            .copied()
            .collect()
    }

    fn count(&self, name: &str) -> usize {
        self.calls_named(name).len()
    }

    fn clear_calls(&self) {
        self.shared.borrow_mut().calls.clear();
    }

    fn stop(mut self) {
        self.proxy.stop();
    }
}

fn position(names: &[&str], name: &str) -> usize {
    names
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("{name} was never called"))
}

// ── lifecycle ─────────────────────────────────────────────────────────────

#[test]
fn start_creates_renderer_in_impl_role() {
    let mut f = Fixture::new();
    assert!(!f.proxy.is_started());

    f.proxy.start();

    assert!(f.proxy.is_started());
    let create = f.calls_named("host.create_renderer");
    assert_eq!(create.len(), 1);
    assert_eq!(create[0].role, Role::Impl);
    assert!(f.proxy.roles().is_main());
    f.stop();
}

#[test]
fn stop_releases_content_textures_and_severs_host() {
    let mut f = Fixture::started();
    f.proxy.stop();

    let deletes = f.calls_named("host.delete_content_textures_on_impl");
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].role, Role::Impl);
    assert!(deletes[0].main_blocked);

    assert!(!f.proxy.is_started());
    assert!(f.proxy.host().is_none());
    assert!(!f.proxy.roles().is_main_blocked());
}

#[test]
fn stop_skips_texture_release_when_purged() {
    let f = Fixture::started();
    f.set(|s| s.purged = true);

    let shared = f.shared.clone();
    f.stop();

    assert!(
        !shared
            .borrow()
            .calls
            .iter()
            .any(|c| c.name == "host.delete_content_textures_on_impl")
    );
}

#[test]
fn operations_before_start_report_not_started() {
    let mut f = Fixture::new();
    assert_eq!(f.proxy.impl_side_rendering_stats(), Err(ProxyError::NotStarted));

    f.proxy.initialize_context().unwrap();
    assert_eq!(f.proxy.initialize_renderer(), Err(ProxyError::NotStarted));
    f.stop();
}

// ── initialization ────────────────────────────────────────────────────────

#[test]
fn capabilities_unavailable_before_initialization() {
    let mut f = Fixture::started();
    assert_eq!(
        f.proxy.renderer_capabilities(),
        Err(ProxyError::RendererNotInitialized)
    );

    f.proxy.initialize_context().unwrap();
    f.proxy.initialize_renderer().unwrap();

    assert_eq!(f.proxy.renderer_capabilities().unwrap().max_texture_size, 1024);
    assert_eq!(f.calls_named("renderer.initialize")[0].role, Role::Impl);
    f.stop();
}

#[test]
fn initialize_renderer_consumes_context() {
    let mut f = Fixture::started();
    f.proxy.initialize_context().unwrap();
    f.proxy.initialize_renderer().unwrap();

    f.proxy.initialize_context().unwrap();
    f.proxy.initialize_renderer().unwrap();
    assert_eq!(f.count("host.create_graphics_context"), 2);
    assert_eq!(f.count("renderer.initialize"), 2);
    f.stop();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "initialize_renderer called without a graphics context")]
fn initialize_renderer_without_context_is_a_bug() {
    let mut f = Fixture::started();
    let _ = f.proxy.initialize_renderer();
}

#[cfg(not(debug_assertions))]
#[test]
fn initialize_renderer_without_context_fails() {
    let mut f = Fixture::started();
    assert_eq!(f.proxy.initialize_renderer(), Err(ProxyError::MissingContext));
    f.stop();
}

#[test]
fn context_creation_failure_is_reported() {
    let mut f = Fixture::started();
    f.set(|s| s.context_creation_fails = true);

    assert_eq!(f.proxy.initialize_context(), Err(ProxyError::ContextCreation));
    assert_eq!(f.proxy.commit_and_composite(), Err(ProxyError::ContextCreation));
    assert_eq!(f.count("host.update_scene"), 0);
    f.stop();
}

#[test]
fn renderer_initialization_failure_leaves_capabilities_unset() {
    let mut f = Fixture::started();
    f.set(|s| s.init_fails = true);

    f.proxy.initialize_context().unwrap();
    assert_eq!(
        f.proxy.initialize_renderer(),
        Err(ProxyError::RendererInitialization)
    );
    assert!(f.proxy.renderer_capabilities().is_err());
    f.stop();
}

// ── commit ────────────────────────────────────────────────────────────────

#[test]
fn commit_and_composite_follows_protocol_order() {
    let mut f = Fixture::started();
    f.set(|s| s.uploads_per_update = 2);
    f.clear_calls();

    f.proxy.commit_and_composite().unwrap();

    assert_eq!(
        f.names(),
        vec![
            "host.create_graphics_context",
            "renderer.initialize",
            "host.update_scene",
            "renderer.reset_contents_textures_purged",
            "host.will_commit",
            "renderer.begin_commit",
            "host.begin_commit_on_impl",
            "resources.apply_upload",
            "resources.apply_upload",
            "host.finish_commit_on_impl",
            "renderer.commit_complete",
            "host.commit_complete",
            "renderer.animate",
            "renderer.prepare_to_draw",
            "renderer.draw_layers",
            "renderer.did_draw_all_layers",
            "host.did_begin_frame",
        ]
    );
    f.stop();
}

#[test]
fn commit_runs_impl_side_with_main_blocked() {
    let mut f = Fixture::started();
    f.set(|s| s.uploads_per_update = 1);
    f.proxy.commit_and_composite().unwrap();

    for name in [
        "renderer.begin_commit",
        "host.begin_commit_on_impl",
        "resources.apply_upload",
        "host.finish_commit_on_impl",
        "renderer.commit_complete",
    ] {
        let call = f.calls_named(name)[0];
        assert_eq!(call.role, Role::Impl, "{name}");
        assert!(call.main_blocked, "{name}");
    }

    let complete = f.calls_named("host.commit_complete")[0];
    assert_eq!(complete.role, Role::Main);
    assert!(!complete.main_blocked);

    let update = f.calls_named("host.update_scene")[0];
    assert_eq!(update.role, Role::Main);
    f.stop();
}

#[test]
fn do_commit_drains_queue() {
    let mut f = Fixture::started();
    let mut queue = TextureUploadQueue::new();
    for i in 0..3 {
        queue.push_full(TextureId(i), IntSize::new(1, 1), vec![0; 4]);
    }

    f.proxy.do_commit(&mut queue).unwrap();

    assert!(queue.is_empty());
    let names = f.names();
    let begin = position(&names, "host.begin_commit_on_impl");
    let finish = position(&names, "host.finish_commit_on_impl");
    let uploads: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == "resources.apply_upload")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(uploads.len(), 3);
    assert!(uploads.iter().all(|&i| begin < i && i < finish));
    f.stop();
}

#[test]
fn purged_textures_are_evicted_before_update() {
    let mut f = Fixture::started();
    f.set(|s| s.purged = true);

    f.proxy.commit_and_composite().unwrap();

    let names = f.names();
    assert!(
        position(&names, "host.evict_all_content_textures") < position(&names, "host.update_scene")
    );
    assert!(!f.shared.borrow().purged);
    f.stop();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "impl-side scroll deltas")]
fn stray_scroll_deltas_are_rejected() {
    let mut f = Fixture::started();
    f.set(|s| s.stray_scroll = true);
    let _ = f.proxy.commit_and_composite();
}

// ── draw ──────────────────────────────────────────────────────────────────

#[test]
fn hidden_renderer_skips_draw_but_commits() {
    let mut f = Fixture::started();
    f.set(|s| s.hidden = true);

    assert_eq!(
        f.proxy.composite_immediately(),
        Err(ProxyError::FrameSkipped(SkipReason::Hidden))
    );
    assert_eq!(f.count("host.commit_complete"), 1);
    assert_eq!(f.count("renderer.animate"), 0);
    assert_eq!(f.count("renderer.swap_buffers"), 0);
    assert_eq!(f.count("host.did_begin_frame"), 1);
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 0);
    f.stop();
}

#[test]
fn undrawable_renderer_never_prepares_a_frame() {
    let mut f = Fixture::started();
    f.set(|s| s.cannot_draw = true);

    let err = f.proxy.composite_immediately().unwrap_err();
    assert_eq!(err, ProxyError::FrameSkipped(SkipReason::CannotDraw));
    assert!(err.is_skip());
    assert_eq!(f.count("renderer.animate"), 1);
    assert_eq!(f.count("renderer.prepare_to_draw"), 0);
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 0);
    f.stop();
}

#[test]
fn each_presented_commit_notifies_once() {
    let mut f = Fixture::started();

    f.proxy.composite_immediately().unwrap();
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 1);

    f.proxy.composite_immediately().unwrap();
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 2);

    let names = f.names();
    assert!(position(&names, "renderer.swap_buffers") < position(&names, "host.did_commit_and_draw_frame"));
    f.stop();
}

#[test]
fn failed_swap_does_not_notify() {
    let mut f = Fixture::started();
    f.set(|s| s.swap_fails = true);

    f.proxy.composite_immediately().unwrap();

    assert_eq!(f.count("renderer.swap_buffers"), 1);
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 0);

    f.set(|s| s.swap_fails = false);
    f.proxy.composite_immediately().unwrap();

    assert_eq!(f.count("renderer.swap_buffers"), 2);
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 1);
    f.stop();
}

#[test]
fn animation_events_are_delivered_in_main_role() {
    let mut f = Fixture::started();
    let event = AnimationEvent {
        kind: AnimationEventKind::Started,
        target: AnimationTarget::Layer(LayerId(4)),
        monotonic_time: Instant::now(),
    };
    f.set(|s| s.animation_events = vec![event]);

    f.proxy.composite_immediately().unwrap();

    let delivered = f.calls_named("host.set_animation_events");
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].role, Role::Main);
    assert_eq!(f.calls_named("renderer.animate")[0].role, Role::Impl);
    assert_eq!(f.shared.borrow().delivered_events, vec![event]);
    f.stop();
}

#[test]
fn no_events_means_no_delivery() {
    let mut f = Fixture::started();
    f.proxy.composite_immediately().unwrap();
    assert_eq!(f.count("host.set_animation_events"), 0);
    f.stop();
}

// ── context loss ──────────────────────────────────────────────────────────

#[test]
fn loss_during_draw_blocks_swap_and_notifies_host() {
    let mut f = Fixture::started();
    f.set(|s| s.lose_on_draw = true);

    assert_eq!(f.proxy.composite_immediately(), Err(ProxyError::ContextLost));

    assert!(f.proxy.is_context_lost());
    assert_eq!(f.count("host.did_lose_context"), 1);
    assert_eq!(f.count("renderer.draw_layers"), 1);
    assert_eq!(f.count("renderer.swap_buffers"), 0);
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 0);
    assert_eq!(f.count("host.did_begin_frame"), 1);
    f.stop();
}

#[test]
fn next_frame_recreates_lost_context() {
    let mut f = Fixture::started();
    f.set(|s| s.lose_on_draw = true);
    let _ = f.proxy.composite_immediately();
    assert_eq!(f.proxy.renderer_capabilities().unwrap().max_texture_size, 1024);

    f.set(|s| s.lose_on_draw = false);
    f.clear_calls();

    f.proxy.composite_immediately().unwrap();

    assert!(!f.proxy.is_context_lost());
    assert_eq!(f.proxy.renderer_capabilities().unwrap().max_texture_size, 2048);
    let names = f.names();
    assert_eq!(&names[..3], &[
        "host.create_graphics_context",
        "host.delete_content_textures_on_impl",
        "renderer.initialize",
    ]);
    assert_eq!(f.calls_named("renderer.initialize")[0].role, Role::Impl);
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 1);
    f.stop();
}

#[test]
fn failed_recreation_keeps_context_lost() {
    let mut f = Fixture::started();
    f.proxy.composite_immediately().unwrap();
    f.proxy.lose_context();
    f.set(|s| s.context_creation_fails = true);

    assert_eq!(f.proxy.composite_immediately(), Err(ProxyError::ContextCreation));
    assert!(f.proxy.is_context_lost());
    assert_eq!(f.count("host.update_scene"), 1);

    f.set(|s| s.context_creation_fails = false);
    f.proxy.composite_immediately().unwrap();
    assert!(!f.proxy.is_context_lost());
    f.stop();
}

#[test]
fn host_reported_loss_is_recorded() {
    let mut f = Fixture::started();
    f.proxy.lose_context();

    assert!(f.proxy.is_context_lost());
    assert_eq!(f.count("host.did_lose_context"), 1);
    f.stop();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "recreate_context called while the context is healthy")]
fn recreate_while_healthy_is_a_bug() {
    let mut f = Fixture::started();
    let _ = f.proxy.recreate_context();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "draw attempted while the graphics context is lost")]
fn composite_while_lost_is_a_bug() {
    let mut f = Fixture::started();
    f.proxy.lose_context();
    let _ = f.proxy.do_composite();
}

// ── readback ──────────────────────────────────────────────────────────────

#[test]
fn composite_and_readback_reads_before_swapping() {
    let mut f = Fixture::started();
    let mut pixels = vec![0u8; 16];

    f.proxy
        .composite_and_readback(&mut pixels, IntRect::new(0, 0, 2, 2))
        .unwrap();

    assert!(pixels.iter().all(|&b| b == 0xab));
    let names = f.names();
    assert!(position(&names, "renderer.readback") < position(&names, "renderer.swap_buffers"));
    assert_eq!(f.count("host.did_commit_and_draw_frame"), 1);
    f.stop();
}

#[test]
fn loss_during_readback_fails_without_swap() {
    let mut f = Fixture::started();
    f.set(|s| s.lose_on_readback = true);
    let mut pixels = vec![0u8; 4];

    assert_eq!(
        f.proxy.composite_and_readback(&mut pixels, IntRect::new(0, 0, 1, 1)),
        Err(ProxyError::ContextLost)
    );
    assert_eq!(f.count("renderer.swap_buffers"), 0);
    // Picked up by the next draw through the renderer.
    assert!(!f.proxy.is_context_lost());
    f.stop();
}

#[test]
fn readback_propagates_skipped_frames() {
    let mut f = Fixture::started();
    f.set(|s| s.hidden = true);
    let mut pixels = vec![0u8; 4];

    assert_eq!(
        f.proxy.composite_and_readback(&mut pixels, IntRect::new(0, 0, 1, 1)),
        Err(ProxyError::FrameSkipped(SkipReason::Hidden))
    );
    assert_eq!(f.count("renderer.readback"), 0);
    f.stop();
}

// ── requests ──────────────────────────────────────────────────────────────

#[test]
fn set_needs_redraw_damages_root_and_schedules() {
    let mut f = Fixture::started();
    f.proxy.set_needs_redraw();

    assert_eq!(f.count("renderer.set_full_root_layer_damage"), 1);
    assert_eq!(f.count("host.schedule_composite"), 1);
    assert!(!f.proxy.commit_requested());
    f.stop();
}

#[test]
fn set_visible_forwards_in_impl_role() {
    let mut f = Fixture::started();
    f.proxy.set_visible(false);

    assert_eq!(f.calls_named("renderer.set_visible")[0].role, Role::Impl);
    assert!(f.shared.borrow().hidden);
    f.stop();
}

#[test]
fn force_serialize_flushes_only_initialized_renderer() {
    let mut f = Fixture::started();
    f.proxy.force_serialize_on_swap_buffers();
    assert_eq!(f.count("renderer.flush"), 0);

    f.proxy.initialize_context().unwrap();
    f.proxy.initialize_renderer().unwrap();
    f.proxy.force_serialize_on_swap_buffers();
    assert_eq!(f.count("renderer.flush"), 1);
    f.stop();
}

#[test]
fn finish_all_rendering_reaches_renderer() {
    let mut f = Fixture::started();
    f.proxy.finish_all_rendering();
    assert_eq!(f.count("renderer.finish_all_rendering"), 1);
    f.stop();
}

#[test]
fn page_scale_animation_is_forwarded() {
    let mut f = Fixture::started();
    f.proxy
        .start_page_scale_animation(IntPoint::new(4, 4), true, 2.0, Duration::from_millis(250));

    let calls = f.calls_named("renderer.start_page_scale_animation");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].role, Role::Impl);
    f.stop();
}

#[test]
fn rendering_stats_come_from_renderer() {
    let mut f = Fixture::started();
    assert_eq!(f.proxy.impl_side_rendering_stats().unwrap().commits, 3);
    f.stop();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "only supported by split-thread proxies")]
fn set_needs_animate_is_unsupported() {
    let mut f = Fixture::started();
    f.proxy.set_needs_animate();
}

// ── headless end to end ───────────────────────────────────────────────────

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

/// Host with one solid background and one textured layer.
struct PaintHost {
    layers: Vec<HeadlessLayer>,
    texture_pixels: Vec<u8>,
    losses: Vec<LossHandle>,
    presented: usize,
    lost: usize,
    evictions: usize,
}

impl PaintHost {
    fn new() -> Self {
        Self {
            layers: vec![
                HeadlessLayer::solid(LayerId(1), IntRect::new(0, 0, 4, 4), RED),
                HeadlessLayer::textured(LayerId(2), IntRect::new(2, 2, 2, 2), TextureId(9)),
            ],
            texture_pixels: GREEN.repeat(4),
            losses: Vec::new(),
            presented: 0,
            lost: 0,
            evictions: 0,
        }
    }
}

impl SceneHost for PaintHost {
    type Renderer = HeadlessRenderer;

    fn create_renderer(&mut self) -> HeadlessRenderer {
        HeadlessRenderer::new(HeadlessInit {
            viewport: IntSize::new(4, 4),
            ..HeadlessInit::default()
        })
    }

    fn create_graphics_context(&mut self) -> Result<Box<dyn GraphicsContext>> {
        let context = HeadlessContext::new(format!("paint-{}", self.losses.len()));
        self.losses.push(context.loss_handle());
        Ok(Box::new(context))
    }

    fn update_scene(&mut self, queue: &mut TextureUploadQueue, memory_limit_bytes: usize) {
        if self.texture_pixels.len() <= memory_limit_bytes {
            queue.push_full(TextureId(9), IntSize::new(2, 2), self.texture_pixels.clone());
        }
    }

    fn will_commit(&mut self) {}

    fn begin_commit_on_impl(&mut self, renderer: &mut HeadlessRenderer) {
        renderer.set_layers(self.layers.clone());
    }

    fn finish_commit_on_impl(&mut self, renderer: &mut HeadlessRenderer) {
        for layer in &self.layers {
            renderer.damage_rect(layer.bounds);
        }
    }

    fn commit_complete(&mut self) {}

    fn evict_all_content_textures(&mut self) {
        self.evictions += 1;
    }

    fn delete_content_textures_on_impl(&mut self, resources: &mut HeadlessResources) {
        resources.delete_all_textures();
    }

    fn did_lose_context(&mut self) {
        self.lost += 1;
    }

    fn did_commit_and_draw_frame(&mut self) {
        self.presented += 1;
    }

    fn did_begin_frame(&mut self) {}
}

fn read_pixel(pixels: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
    let i = (y * width + x) * 4;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

#[test]
fn headless_frame_reads_back_committed_scene() {
    let mut proxy = SingleThreadProxy::new(PaintHost::new());
    proxy.start();

    let mut pixels = vec![0u8; 4 * 4 * 4];
    proxy
        .composite_and_readback(&mut pixels, IntRect::new(0, 0, 4, 4))
        .unwrap();

    assert_eq!(read_pixel(&pixels, 4, 0, 0), RED);
    assert_eq!(read_pixel(&pixels, 4, 3, 3), GREEN);
    assert_eq!(proxy.host().map(|h| h.presented), Some(1));

    let stats = proxy.impl_side_rendering_stats().unwrap();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.frames_swapped, 1);
    assert_eq!(stats.textures_uploaded, 1);

    proxy.stop();
}

#[test]
fn headless_recovers_from_context_loss() {
    let mut proxy = SingleThreadProxy::new(PaintHost::new());
    proxy.start();
    proxy.composite_immediately().unwrap();

    if let Some(host) = proxy.host() {
        host.losses[0].lose();
    }
    assert_eq!(proxy.composite_immediately(), Err(ProxyError::ContextLost));
    assert!(proxy.is_context_lost());
    assert_eq!(proxy.host().map(|h| h.lost), Some(1));

    let mut pixels = vec![0u8; 4 * 4 * 4];
    proxy
        .composite_and_readback(&mut pixels, IntRect::new(0, 0, 4, 4))
        .unwrap();

    assert!(!proxy.is_context_lost());
    assert_eq!(read_pixel(&pixels, 4, 3, 3), GREEN);
    assert_eq!(
        proxy.renderer().and_then(|r| r.context_label()),
        Some("paint-1")
    );
    assert_eq!(proxy.host().map(|h| h.presented), Some(2));

    proxy.stop();
}

#[test]
fn headless_hidden_output_skips_frames() {
    let mut proxy = SingleThreadProxy::new(PaintHost::new());
    proxy.start();
    proxy.set_visible(false);

    let err = proxy.composite_immediately().unwrap_err();
    assert!(err.is_skip());

    proxy.set_visible(true);
    proxy.composite_immediately().unwrap();
    assert_eq!(proxy.host().map(|h| h.presented), Some(1));

    proxy.stop();
}

#[test]
fn headless_page_scale_animation_follows_proxy_clock() {
    let clock = ManualTimeSource::new();
    let mut proxy = SingleThreadProxy::with_time_source(PaintHost::new(), Box::new(clock.clone()));
    proxy.start();
    proxy.composite_immediately().unwrap();

    proxy.start_page_scale_animation(IntPoint::new(0, 0), true, 3.0, Duration::from_millis(100));
    clock.advance(Duration::from_millis(200));
    proxy.composite_immediately().unwrap();

    assert_eq!(proxy.renderer().map(|r| r.page_scale()), Some(3.0));
    proxy.stop();
}

#[test]
fn headless_purge_is_repaired_by_next_commit() {
    let mut proxy = SingleThreadProxy::new(PaintHost::new());
    proxy.start();
    proxy.composite_immediately().unwrap();

    proxy.with_renderer(|r| r.purge_contents_textures());
    assert_eq!(proxy.renderer().map(|r| r.resources().texture_count()), Some(0));

    let mut pixels = vec![0u8; 4 * 4 * 4];
    proxy
        .composite_and_readback(&mut pixels, IntRect::new(0, 0, 4, 4))
        .unwrap();

    assert_eq!(proxy.host().map(|h| h.evictions), Some(1));
    assert_eq!(read_pixel(&pixels, 4, 3, 3), GREEN);
    assert_eq!(proxy.renderer().map(|r| r.contents_textures_purged()), Some(false));

    proxy.stop();
}
