use std::collections::VecDeque;

use crate::coords::{IntPoint, IntSize};

use super::TextureId;

/// One pending texture write. Pixel data is tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureUpload {
    /// Replaces (or creates) the whole texture.
    Full {
        texture: TextureId,
        size: IntSize,
        pixels: Vec<u8>,
    },
    /// Writes `pixels` (of `source_size`) at `dest` inside an existing texture.
    Partial {
        texture: TextureId,
        source_size: IntSize,
        pixels: Vec<u8>,
        dest: IntPoint,
    },
    /// Copies the top-left `size` region of `source` into `dest`.
    Copy {
        source: TextureId,
        dest: TextureId,
        size: IntSize,
    },
}

impl TextureUpload {
    /// Texture written by this entry.
    pub fn target(&self) -> TextureId {
        match self {
            TextureUpload::Full { texture, .. } | TextureUpload::Partial { texture, .. } => *texture,
            TextureUpload::Copy { dest, .. } => *dest,
        }
    }

    /// Bytes transferred from the host.
    pub fn byte_size(&self) -> usize {
        match self {
            TextureUpload::Full { pixels, .. } | TextureUpload::Partial { pixels, .. } => {
                pixels.len()
            }
            TextureUpload::Copy { .. } => 0,
        }
    }
}

/// Ordered texture writes for a single commit.
///
/// Built by the host in `update_scene`, consumed by the commit. Entries are
/// applied in insertion order.
#[derive(Debug, Default)]
pub struct TextureUploadQueue {
    entries: VecDeque<TextureUpload>,
}

impl TextureUploadQueue {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, upload: TextureUpload) {
        self.entries.push_back(upload);
    }

    pub fn push_full(&mut self, texture: TextureId, size: IntSize, pixels: Vec<u8>) {
        self.push(TextureUpload::Full {
            texture,
            size,
            pixels,
        });
    }

    pub fn push_partial(
        &mut self,
        texture: TextureId,
        source_size: IntSize,
        pixels: Vec<u8>,
        dest: IntPoint,
    ) {
        self.push(TextureUpload::Partial {
            texture,
            source_size,
            pixels,
            dest,
        });
    }

    pub fn push_copy(&mut self, source: TextureId, dest: TextureId, size: IntSize) {
        self.push(TextureUpload::Copy { source, dest, size });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total pixel bytes still queued.
    pub fn byte_size(&self) -> usize {
        self.entries.iter().map(TextureUpload::byte_size).sum()
    }

    /// Removes and yields every entry in order.
    pub fn drain(&mut self) -> impl Iterator<Item = TextureUpload> + '_ {
        self.entries.drain(..)
    }
}
