use std::time::Instant;

use crate::coords::IntPoint;

/// Identifier of a layer in the impl-side tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Scroll offset accumulated on one layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScrollDelta {
    pub layer: LayerId,
    pub delta: IntPoint,
}

/// Scroll and page-scale changes made on the impl side since the last commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAndScaleSet {
    pub scrolls: Vec<ScrollDelta>,
    pub page_scale_delta: f32,
}

impl Default for ScrollAndScaleSet {
    fn default() -> Self {
        Self {
            scrolls: Vec::new(),
            page_scale_delta: 1.0,
        }
    }
}

impl ScrollAndScaleSet {
    pub fn is_empty(&self) -> bool {
        self.scrolls.is_empty() && self.page_scale_delta == 1.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationEventKind {
    Started,
    Finished,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationTarget {
    PageScale,
    Layer(LayerId),
}

/// Animation state change observed while stepping the impl tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AnimationEvent {
    pub kind: AnimationEventKind,
    pub target: AnimationTarget,
    pub monotonic_time: Instant,
}

/// Counters reported by the impl side.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderingStats {
    pub commits: u64,
    pub frames_drawn: u64,
    pub frames_swapped: u64,
    pub animation_frames: u64,
    pub textures_uploaded: u64,
    pub upload_bytes: u64,
}
