use std::time::{Duration, Instant, SystemTime};

use anyhow::{bail, ensure, Result};

use crate::coords::{IntPoint, IntRect, IntSize};
use crate::device::GraphicsContext;
use crate::renderer::{
    AnimationEvent, AnimationEventKind, AnimationTarget, LayerId, Renderer, RendererCapabilities,
    RenderingStats, ScrollAndScaleSet, ScrollDelta,
};
use crate::resource::{ResourceProvider, TextureId, UploaderKind};

use super::{HeadlessInit, HeadlessResources};

/// One quad in the impl-side tree, drawn in list order (back to front).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessLayer {
    pub id: LayerId,
    pub bounds: IntRect,
    /// Fill used where no texture texel is available.
    pub color: [u8; 4],
    pub texture: Option<TextureId>,
}

impl HeadlessLayer {
    pub fn solid(id: LayerId, bounds: IntRect, color: [u8; 4]) -> Self {
        Self {
            id,
            bounds,
            color,
            texture: None,
        }
    }

    pub fn textured(id: LayerId, bounds: IntRect, texture: TextureId) -> Self {
        Self {
            id,
            bounds,
            color: [0, 0, 0, 0],
            texture: Some(texture),
        }
    }
}

/// Draw descriptor for one headless frame.
#[derive(Debug, Default, Clone)]
pub struct HeadlessFrame {
    /// Region of the back buffer that is redrawn.
    pub damage: IntRect,
    /// Indices of layers touching `damage`, back to front.
    pub layers: Vec<usize>,
}

#[derive(Debug, Clone)]
struct PageScaleAnimation {
    from: f32,
    to: f32,
    target: IntPoint,
    use_anchor: bool,
    start: Instant,
    duration: Duration,
    started: bool,
}

/// CPU implementation of [`Renderer`].
pub struct HeadlessRenderer {
    init: HeadlessInit,
    context: Option<Box<dyn GraphicsContext>>,
    capabilities: RendererCapabilities,
    resources: HeadlessResources,

    layers: Vec<HeadlessLayer>,
    viewport: IntSize,
    visible: bool,
    in_commit: bool,

    back_buffer: Vec<[u8; 4]>,
    front_buffer: Vec<[u8; 4]>,

    /// Damage accumulated since the last drawn frame.
    damage: IntRect,
    full_damage: bool,

    contents_textures_purged: bool,

    pending_scrolls: Vec<ScrollDelta>,
    scroll_offset: IntPoint,
    page_scale: f32,
    page_scale_animation: Option<PageScaleAnimation>,

    stats: RenderingStats,
}

impl HeadlessRenderer {
    pub fn new(init: HeadlessInit) -> Self {
        let viewport = init.viewport;
        let visible = init.visible;
        let clear = init.clear_color;
        Self {
            init,
            context: None,
            capabilities: RendererCapabilities::default(),
            resources: HeadlessResources::new(0),
            layers: Vec::new(),
            viewport,
            visible,
            in_commit: false,
            back_buffer: vec![clear; viewport.area()],
            front_buffer: vec![clear; viewport.area()],
            damage: IntRect::default(),
            full_damage: true,
            contents_textures_purged: false,
            pending_scrolls: Vec::new(),
            scroll_offset: IntPoint::zero(),
            page_scale: 1.0,
            page_scale_animation: None,
            stats: RenderingStats::default(),
        }
    }

    /// Label of the current context, if initialized.
    pub fn context_label(&self) -> Option<&str> {
        self.context.as_deref().map(|c| c.label())
    }

    pub fn viewport(&self) -> IntSize {
        self.viewport
    }

    /// Resizes the back and front buffers. The next frame redraws everything.
    pub fn set_viewport(&mut self, viewport: IntSize) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.back_buffer = vec![self.init.clear_color; viewport.area()];
        self.front_buffer = vec![self.init.clear_color; viewport.area()];
        self.full_damage = true;
    }

    pub fn layers(&self) -> &[HeadlessLayer] {
        &self.layers
    }

    /// Replaces the impl-side layer list, damaging whatever changed.
    pub fn set_layers(&mut self, layers: Vec<HeadlessLayer>) {
        let count = self.layers.len().max(layers.len());
        for i in 0..count {
            let old = self.layers.get(i);
            let new = layers.get(i);
            if old != new {
                for layer in [old, new].into_iter().flatten() {
                    self.damage = self.damage.union(layer.bounds);
                }
            }
        }
        self.layers = layers;
    }

    /// Damages `rect` (e.g. after a texture behind a layer was re-uploaded).
    pub fn damage_rect(&mut self, rect: IntRect) {
        self.damage = self.damage.union(rect);
    }

    pub fn resources(&self) -> &HeadlessResources {
        &self.resources
    }

    /// Drops all content textures, as a platform would under memory pressure.
    pub fn purge_contents_textures(&mut self) {
        log::debug!(
            "purging {} content textures",
            self.resources.texture_count()
        );
        self.resources.delete_all_textures();
        self.contents_textures_purged = true;
        self.full_damage = true;
    }

    /// Scrolls a layer from the impl side.
    ///
    /// The delta is reported by the next `process_scroll_deltas`.
    pub fn scroll_by(&mut self, layer: LayerId, delta: IntPoint) {
        self.pending_scrolls.push(ScrollDelta { layer, delta });
    }

    pub fn scroll_offset(&self) -> IntPoint {
        self.scroll_offset
    }

    pub fn page_scale(&self) -> f32 {
        self.page_scale
    }

    pub fn is_in_commit(&self) -> bool {
        self.in_commit
    }

    /// Pixel of the last presented frame.
    pub fn presented_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        self.front_buffer
            .get(y as usize * self.viewport.width as usize + x as usize)
            .copied()
    }

    fn viewport_rect(&self) -> IntRect {
        IntRect::from_size(self.viewport)
    }

    fn shade(&self, layer: &HeadlessLayer, x: i32, y: i32) -> [u8; 4] {
        layer
            .texture
            .and_then(|id| {
                let u = u32::try_from(x - layer.bounds.origin.x).ok()?;
                let v = u32::try_from(y - layer.bounds.origin.y).ok()?;
                self.resources.texel(id, u, v)
            })
            .unwrap_or(layer.color)
    }
}

impl Renderer for HeadlessRenderer {
    type Resources = HeadlessResources;
    type Frame = HeadlessFrame;

    fn initialize(&mut self, context: Box<dyn GraphicsContext>, uploader: UploaderKind) -> Result<()> {
        self.context = None;

        if context.is_lost() {
            bail!("context '{}' is already lost", context.label());
        }

        let limits = context.limits();
        let max = limits.max_texture_size;
        ensure!(
            self.viewport.width <= max && self.viewport.height <= max,
            "viewport {:?} exceeds the maximum texture size {max}",
            self.viewport
        );

        self.capabilities = RendererCapabilities {
            using_set_visibility: true,
            allow_partial_texture_updates: uploader == UploaderKind::Unthrottled,
            ..RendererCapabilities::from_limits(limits)
        };
        self.resources.set_max_texture_size(max);
        self.full_damage = true;

        log::debug!("headless renderer bound to context '{}'", context.label());
        self.context = Some(context);
        Ok(())
    }

    fn capabilities(&self) -> RendererCapabilities {
        self.capabilities
    }

    fn resource_provider(&mut self) -> &mut HeadlessResources {
        &mut self.resources
    }

    fn begin_commit(&mut self) {
        debug_assert!(!self.in_commit, "begin_commit while already committing");
        self.in_commit = true;
    }

    fn commit_complete(&mut self) {
        self.in_commit = false;
        self.stats.commits += 1;
    }

    fn process_scroll_deltas(&mut self) -> ScrollAndScaleSet {
        ScrollAndScaleSet {
            scrolls: std::mem::take(&mut self.pending_scrolls),
            page_scale_delta: 1.0,
        }
    }

    fn animate(&mut self, monotonic: Instant, _wall: SystemTime) -> Vec<AnimationEvent> {
        let Some(anim) = self.page_scale_animation.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if !anim.started {
            anim.started = true;
            events.push(AnimationEvent {
                kind: AnimationEventKind::Started,
                target: AnimationTarget::PageScale,
                monotonic_time: monotonic,
            });
        }

        let elapsed = monotonic.saturating_duration_since(anim.start);
        let t = if anim.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / anim.duration.as_secs_f32()).min(1.0)
        };
        self.page_scale = anim.from + (anim.to - anim.from) * t;

        if t >= 1.0 {
            if !anim.use_anchor {
                self.scroll_offset = anim.target;
            }
            events.push(AnimationEvent {
                kind: AnimationEventKind::Finished,
                target: AnimationTarget::PageScale,
                monotonic_time: monotonic,
            });
            self.page_scale_animation = None;
        }

        self.full_damage = true;
        self.stats.animation_frames += 1;
        events
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.full_damage = true;
        }
        self.visible = visible;
    }

    fn can_draw(&self) -> bool {
        self.context.is_some() && !self.viewport.is_empty() && !self.layers.is_empty()
    }

    fn prepare_to_draw(&mut self, frame: &mut HeadlessFrame) {
        debug_assert!(!self.in_commit, "draw prepared during a commit");
        debug_assert!(self.can_draw(), "prepare_to_draw requires can_draw");

        let viewport = self.viewport_rect();
        frame.damage = if self.full_damage {
            viewport
        } else {
            self.damage.intersect(viewport).unwrap_or_default()
        };

        frame.layers.clear();
        if frame.damage.is_empty() {
            return;
        }
        frame.layers.extend(
            self.layers
                .iter()
                .enumerate()
                .filter(|(_, layer)| layer.bounds.intersect(frame.damage).is_some())
                .map(|(i, _)| i),
        );
    }

    fn draw_layers(&mut self, frame: &HeadlessFrame) {
        let damage = frame.damage;
        if damage.is_empty() {
            return;
        }

        let width = self.viewport.width as usize;
        let clear = self.init.clear_color;
        for y in damage.origin.y..damage.max().y {
            let row = y as usize * width;
            for x in damage.origin.x..damage.max().x {
                self.back_buffer[row + x as usize] = clear;
            }
        }

        for &index in &frame.layers {
            let layer = &self.layers[index];
            let Some(area) = layer.bounds.intersect(damage) else {
                continue;
            };
            for y in area.origin.y..area.max().y {
                let row = y as usize * width;
                for x in area.origin.x..area.max().x {
                    let texel = self.shade(layer, x, y);
                    self.back_buffer[row + x as usize] = texel;
                }
            }
        }
    }

    fn did_draw_all_layers(&mut self, _frame: &HeadlessFrame) {
        self.damage = IntRect::default();
        self.full_damage = false;
        self.stats.frames_drawn += 1;
    }

    fn swap_buffers(&mut self) -> bool {
        if self.context.is_none() || self.is_context_lost() {
            return false;
        }
        self.front_buffer.copy_from_slice(&self.back_buffer);
        self.stats.frames_swapped += 1;
        true
    }

    fn is_context_lost(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.is_lost())
    }

    fn readback(&mut self, pixels: &mut [u8], rect: IntRect) {
        match rect.size.rgba_len() {
            Some(needed) if pixels.len() >= needed => {}
            Some(needed) => {
                log::warn!(
                    "readback buffer holds {} bytes, {:?} needs {needed}",
                    pixels.len(),
                    rect
                );
                return;
            }
            None => {
                log::warn!("readback of {rect:?} exceeds addressable memory");
                return;
            }
        }
        let Some(visible) = rect.intersect(self.viewport_rect()) else {
            return;
        };

        let width = self.viewport.width as usize;
        let out_stride = rect.size.width as usize * 4;
        let span = visible.size.width as usize;
        for y in visible.origin.y..visible.max().y {
            let src_start = y as usize * width + visible.origin.x as usize;
            let src: &[u8] = bytemuck::cast_slice(&self.back_buffer[src_start..src_start + span]);

            let out_row = (y - rect.origin.y) as usize;
            let out_col = (visible.origin.x - rect.origin.x) as usize;
            let dst_start = out_row * out_stride + out_col * 4;
            pixels[dst_start..dst_start + src.len()].copy_from_slice(src);
        }
    }

    fn contents_textures_purged(&self) -> bool {
        self.contents_textures_purged
    }

    fn reset_contents_textures_purged(&mut self) {
        self.contents_textures_purged = false;
    }

    fn memory_allocation_limit_bytes(&self) -> usize {
        self.init.memory_limit_bytes
    }

    fn set_full_root_layer_damage(&mut self) {
        self.full_damage = true;
    }

    fn finish_all_rendering(&mut self) {
        if let Some(context) = self.context.as_deref() {
            context.flush();
        }
    }

    fn flush(&mut self) {
        if let Some(context) = self.context.as_deref() {
            context.flush();
        }
    }

    fn start_page_scale_animation(
        &mut self,
        target: IntPoint,
        use_anchor: bool,
        scale: f32,
        start: Instant,
        duration: Duration,
    ) {
        self.page_scale_animation = Some(PageScaleAnimation {
            from: self.page_scale,
            to: scale,
            target,
            use_anchor,
            start,
            duration,
            started: false,
        });
    }

    fn rendering_stats(&self) -> RenderingStats {
        RenderingStats {
            textures_uploaded: self.resources.upload_count(),
            upload_bytes: self.resources.upload_bytes(),
            ..self.stats
        }
    }
}
