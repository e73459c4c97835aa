use std::time::Duration;

use anyhow::{bail, Context, Result};
use strata_compositor::coords::{IntPoint, IntRect, IntSize};
use strata_compositor::device::{DeviceInit, GraphicsContext, HeadlessContext, LossHandle, WgpuContext};
use strata_compositor::headless::{HeadlessInit, HeadlessLayer, HeadlessRenderer, HeadlessResources};
use strata_compositor::host::SceneHost;
use strata_compositor::logging::{init_logging, LoggingConfig};
use strata_compositor::proxy::{Proxy, ProxyError, SingleThreadProxy};
use strata_compositor::renderer::{AnimationEvent, LayerId};
use strata_compositor::resource::{ResourceProvider, TextureId, TextureUploadQueue};

const VIEWPORT: IntSize = IntSize::new(64, 48);
const SPRITE: TextureId = TextureId(1);
const SPRITE_SIZE: IntSize = IntSize::new(8, 8);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Backend {
    Headless,
    Wgpu,
}

#[derive(Debug, Clone)]
struct StudioConfig {
    backend: Backend,
    frames: u32,
}

impl StudioConfig {
    fn from_env() -> Result<Self> {
        let backend = match std::env::var("STRATA_BACKEND").as_deref() {
            Err(_) | Ok("headless") => Backend::Headless,
            Ok("wgpu") => Backend::Wgpu,
            Ok(other) => bail!("unknown STRATA_BACKEND '{other}' (expected headless or wgpu)"),
        };
        let frames = match std::env::var("STRATA_FRAMES") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("STRATA_FRAMES must be a frame count, got '{raw}'"))?,
            Err(_) => 12,
        };
        Ok(Self { backend, frames })
    }
}

/// Scene of a backdrop and a sprite sliding across it.
struct StudioHost {
    backend: Backend,
    frame: u32,
    sprite_dirty: bool,
    contexts_created: u32,
    loss: Option<LossHandle>,
    presented: u32,
    animation_events: usize,
}

impl StudioHost {
    fn new(backend: Backend) -> Self {
        Self {
            backend,
            frame: 0,
            sprite_dirty: true,
            contexts_created: 0,
            loss: None,
            presented: 0,
            animation_events: 0,
        }
    }

    fn layers(&self) -> Vec<HeadlessLayer> {
        let x = (self.frame as i32 * 4) % (VIEWPORT.width as i32 - SPRITE_SIZE.width as i32);
        vec![
            HeadlessLayer::solid(LayerId(1), IntRect::from_size(VIEWPORT), [24, 28, 40, 255]),
            HeadlessLayer::textured(
                LayerId(2),
                IntRect::new(x, 20, SPRITE_SIZE.width, SPRITE_SIZE.height),
                SPRITE,
            ),
        ]
    }

    fn sprite_pixels() -> Vec<u8> {
        let mut pixels = Vec::with_capacity(SPRITE_SIZE.rgba_len().unwrap_or_default());
        for y in 0..SPRITE_SIZE.height {
            for x in 0..SPRITE_SIZE.width {
                let lit = (x + y) % 2 == 0;
                pixels.extend_from_slice(if lit { &[240, 180, 40, 255] } else { &[200, 80, 20, 255] });
            }
        }
        pixels
    }

    /// Loses the current context as a driver reset would.
    fn simulate_context_loss(&self) {
        if let Some(loss) = &self.loss {
            log::info!("simulating graphics context loss");
            loss.lose();
        }
    }
}

impl SceneHost for StudioHost {
    type Renderer = HeadlessRenderer;

    fn create_renderer(&mut self) -> HeadlessRenderer {
        HeadlessRenderer::new(HeadlessInit {
            viewport: VIEWPORT,
            ..HeadlessInit::default()
        })
    }

    fn create_graphics_context(&mut self) -> Result<Box<dyn GraphicsContext>> {
        self.contexts_created += 1;
        let label = format!("studio-{}", self.contexts_created);

        let context: Box<dyn GraphicsContext> = match self.backend {
            Backend::Headless => {
                let context = HeadlessContext::new(label);
                self.loss = Some(context.loss_handle());
                Box::new(context)
            }
            Backend::Wgpu => {
                let context = WgpuContext::new_blocking(DeviceInit {
                    label,
                    ..DeviceInit::default()
                })?;
                log::info!("using adapter {:?}", context.adapter_info().name);
                log::debug!("device features: {:?}", context.device().features());
                self.loss = Some(context.loss_handle());
                Box::new(context)
            }
        };
        Ok(context)
    }

    fn update_scene(&mut self, queue: &mut TextureUploadQueue, memory_limit_bytes: usize) {
        if self.sprite_dirty {
            if SPRITE_SIZE.rgba_len().is_none_or(|len| len > memory_limit_bytes) {
                log::warn!("sprite does not fit the upload budget of {memory_limit_bytes} bytes");
                return;
            }
            queue.push_full(SPRITE, SPRITE_SIZE, Self::sprite_pixels());
            self.sprite_dirty = false;
        }
    }

    fn will_commit(&mut self) {}

    fn begin_commit_on_impl(&mut self, renderer: &mut HeadlessRenderer) {
        renderer.set_layers(self.layers());
    }

    fn finish_commit_on_impl(&mut self, _renderer: &mut HeadlessRenderer) {}

    fn commit_complete(&mut self) {
        log::trace!("frame {} committed", self.frame);
    }

    fn evict_all_content_textures(&mut self) {
        self.sprite_dirty = true;
    }

    fn delete_content_textures_on_impl(&mut self, resources: &mut HeadlessResources) {
        resources.delete_all_textures();
        self.sprite_dirty = true;
    }

    fn did_lose_context(&mut self) {
        log::warn!("scene host notified of context loss");
    }

    fn did_commit_and_draw_frame(&mut self) {
        self.presented += 1;
    }

    fn did_begin_frame(&mut self) {
        self.frame += 1;
    }

    fn set_animation_events(&mut self, events: Vec<AnimationEvent>, _wall_time: std::time::SystemTime) {
        for event in &events {
            log::debug!("animation {:?} on {:?}", event.kind, event.target);
        }
        self.animation_events += events.len();
    }
}

fn checksum(pixels: &[u8]) -> u32 {
    pixels
        .iter()
        .fold(0u32, |acc, &b| acc.rotate_left(5) ^ u32::from(b))
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::from_env()?;
    log::info!("studio session: {config:?}");

    let mut proxy = SingleThreadProxy::new(StudioHost::new(config.backend));
    proxy.start();

    let session = run_session(&mut proxy, &config);
    proxy.stop();
    session
}

fn run_session(proxy: &mut SingleThreadProxy<StudioHost>, config: &StudioConfig) -> Result<()> {
    let lose_at = config.frames / 2;
    let purge_at = config.frames - config.frames / 4;

    for frame in 0..config.frames {
        if frame == 2 {
            proxy.start_page_scale_animation(IntPoint::zero(), true, 1.5, Duration::ZERO);
        }
        if frame == lose_at && frame > 0 {
            if let Some(host) = proxy.host() {
                host.simulate_context_loss();
            }
        }

        if frame == purge_at && frame > lose_at {
            log::info!("simulating memory pressure");
            proxy.with_renderer(|renderer| renderer.purge_contents_textures());
        }

        match proxy.composite_immediately() {
            Ok(()) => log::debug!("frame {frame} presented"),
            Err(err) if err.is_skip() => log::info!("frame {frame} skipped: {err}"),
            Err(ProxyError::ContextLost) => log::warn!("frame {frame} lost its context"),
            Err(err) => return Err(err).with_context(|| format!("frame {frame} failed")),
        }
    }

    let mut pixels = vec![0u8; VIEWPORT.rgba_len().context("viewport too large to read back")?];
    proxy
        .composite_and_readback(&mut pixels, IntRect::from_size(VIEWPORT))
        .context("final readback failed")?;

    let stats = proxy.impl_side_rendering_stats()?;
    let capabilities = *proxy.renderer_capabilities()?;
    if let Some(host) = proxy.host() {
        log::info!(
            "presented {} frames over {} contexts, {} animation events",
            host.presented,
            host.contexts_created,
            host.animation_events
        );
    }
    log::info!("capabilities: {capabilities:?}");
    log::info!("stats: {stats:?}");
    log::info!("final frame checksum {:08x}", checksum(&pixels));
    Ok(())
}
