use std::collections::BTreeMap;

use crate::coords::{IntPoint, IntRect, IntSize};
use crate::resource::{ResourceProvider, TextureId, TextureUpload, UploadError};

#[derive(Debug, Clone)]
struct Texture {
    size: IntSize,
    texels: Vec<[u8; 4]>,
}

impl Texture {
    fn filled(size: IntSize) -> Self {
        Self {
            size,
            texels: vec![[0; 4]; size.area()],
        }
    }

    fn bounds(&self) -> IntRect {
        IntRect::from_size(self.size)
    }

    fn write(&mut self, dest: IntPoint, size: IntSize, source: &[[u8; 4]]) {
        let row_len = size.width as usize;
        for row in 0..size.height as usize {
            let src = &source[row * row_len..(row + 1) * row_len];
            let start = (dest.y as usize + row) * self.size.width as usize + dest.x as usize;
            self.texels[start..start + row_len].copy_from_slice(src);
        }
    }

    fn read(&self, size: IntSize) -> Vec<[u8; 4]> {
        let row_len = size.width as usize;
        let mut out = Vec::with_capacity(size.area());
        for row in 0..size.height as usize {
            let start = row * self.size.width as usize;
            out.extend_from_slice(&self.texels[start..start + row_len]);
        }
        out
    }
}

/// Host-memory texture store.
#[derive(Debug, Clone)]
pub struct HeadlessResources {
    textures: BTreeMap<TextureId, Texture>,
    max_texture_size: u32,
    uploads: u64,
    upload_bytes: u64,
    in_upload_batch: bool,
}

impl HeadlessResources {
    pub fn new(max_texture_size: u32) -> Self {
        Self {
            textures: BTreeMap::new(),
            max_texture_size,
            uploads: 0,
            upload_bytes: 0,
            in_upload_batch: false,
        }
    }

    pub fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    pub(crate) fn set_max_texture_size(&mut self, max: u32) {
        self.max_texture_size = max;
    }

    pub fn texture_size(&self, id: TextureId) -> Option<IntSize> {
        self.textures.get(&id).map(|t| t.size)
    }

    /// Texel at `(x, y)`, if the texture exists and covers it.
    pub fn texel(&self, id: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        let texture = self.textures.get(&id)?;
        if x >= texture.size.width || y >= texture.size.height {
            return None;
        }
        texture
            .texels
            .get(y as usize * texture.size.width as usize + x as usize)
            .copied()
    }

    /// Uploads applied since creation.
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    pub fn upload_bytes(&self) -> u64 {
        self.upload_bytes
    }

    fn check_edge(&self, size: IntSize) -> Result<(), UploadError> {
        let edge = size.width.max(size.height);
        if edge > self.max_texture_size {
            return Err(UploadError::TooLarge {
                edge,
                max: self.max_texture_size,
            });
        }
        Ok(())
    }

    fn texels_from(size: IntSize, pixels: &[u8]) -> Result<&[[u8; 4]], UploadError> {
        let expected = size.rgba_len();
        if expected != Some(pixels.len()) {
            return Err(UploadError::SizeMismatch {
                expected: expected.unwrap_or(usize::MAX),
                actual: pixels.len(),
            });
        }
        Ok(bytemuck::cast_slice(pixels))
    }
}

impl ResourceProvider for HeadlessResources {
    fn begin_uploads(&mut self) {
        debug_assert!(!self.in_upload_batch, "nested upload batches");
        self.in_upload_batch = true;
    }

    fn apply_upload(&mut self, upload: TextureUpload) -> Result<(), UploadError> {
        let bytes = upload.byte_size();
        match upload {
            TextureUpload::Full {
                texture,
                size,
                pixels,
            } => {
                self.check_edge(size)?;
                let texels = Self::texels_from(size, &pixels)?.to_vec();
                self.textures.insert(texture, Texture { size, texels });
            }
            TextureUpload::Partial {
                texture,
                source_size,
                pixels,
                dest,
            } => {
                let texels = Self::texels_from(source_size, &pixels)?;
                let target = self
                    .textures
                    .get_mut(&texture)
                    .ok_or(UploadError::UnknownTexture(texture))?;
                let region = IntRect::from_origin_size(dest, source_size);
                if target.bounds().intersect(region) != Some(region) {
                    return Err(UploadError::OutOfBounds {
                        texture,
                        size: source_size,
                    });
                }
                target.write(dest, source_size, texels);
            }
            TextureUpload::Copy { source, dest, size } => {
                let from = self
                    .textures
                    .get(&source)
                    .ok_or(UploadError::UnknownTexture(source))?;
                if from.bounds().intersect(IntRect::from_size(size)) != Some(IntRect::from_size(size)) {
                    return Err(UploadError::OutOfBounds {
                        texture: source,
                        size,
                    });
                }
                let texels = from.read(size);

                let to = self
                    .textures
                    .entry(dest)
                    .or_insert_with(|| Texture::filled(size));
                if to.bounds().intersect(IntRect::from_size(size)) != Some(IntRect::from_size(size)) {
                    return Err(UploadError::OutOfBounds {
                        texture: dest,
                        size,
                    });
                }
                to.write(IntPoint::zero(), size, &texels);
            }
        }

        self.uploads += 1;
        self.upload_bytes += bytes as u64;
        Ok(())
    }

    fn end_uploads(&mut self) {
        self.in_upload_batch = false;
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
    }

    fn delete_all_textures(&mut self) {
        self.textures.clear();
    }

    fn contains_texture(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn resident_bytes(&self) -> usize {
        self.textures
            .values()
            .map(|t| std::mem::size_of_val(t.texels.as_slice()))
            .sum()
    }
}
