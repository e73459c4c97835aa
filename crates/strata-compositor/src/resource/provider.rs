use thiserror::Error;

use crate::coords::IntSize;

use super::TextureUpload;

/// Handle to a texture owned by a resource provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Upload pacing requested from the renderer at initialization.
///
/// The single-thread proxy always asks for `Unthrottled`: uploads complete
/// inside the commit that queued them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploaderKind {
    Throttled,
    Unthrottled,
}

/// Reasons a single upload could not be applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("texture {0:?} does not exist")]
    UnknownTexture(TextureId),

    #[error("upload carries {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("region {size:?} does not fit texture {texture:?}")]
    OutOfBounds { texture: TextureId, size: IntSize },

    #[error("texture edge {edge} exceeds the maximum of {max}")]
    TooLarge { edge: u32, max: u32 },
}

/// Impl-side texture store exposed by a renderer.
///
/// Hosts reach it during commits (uploads) and teardown (deletion); it is
/// never held past the call that lent it.
pub trait ResourceProvider {
    /// Called before the first upload of a commit.
    fn begin_uploads(&mut self) {}

    /// Applies one queued write.
    fn apply_upload(&mut self, upload: TextureUpload) -> Result<(), UploadError>;

    /// Called after the last upload of a commit.
    fn end_uploads(&mut self) {}

    fn delete_texture(&mut self, id: TextureId);

    /// Releases every texture.
    fn delete_all_textures(&mut self);

    fn contains_texture(&self, id: TextureId) -> bool;

    fn texture_count(&self) -> usize;

    /// Bytes currently resident.
    fn resident_bytes(&self) -> usize;
}
