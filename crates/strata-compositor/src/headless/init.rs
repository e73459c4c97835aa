use crate::coords::IntSize;

/// Configuration for a [`HeadlessRenderer`](super::HeadlessRenderer).
#[derive(Debug, Clone)]
pub struct HeadlessInit {
    /// Back-buffer size in device pixels.
    pub viewport: IntSize,

    /// Upload budget handed to the host on every commit.
    pub memory_limit_bytes: usize,

    /// Color of pixels not covered by any layer (RGBA8).
    pub clear_color: [u8; 4],

    /// Initial visibility.
    pub visible: bool,
}

impl Default for HeadlessInit {
    fn default() -> Self {
        Self {
            viewport: IntSize::new(256, 256),
            memory_limit_bytes: 64 * 1024 * 1024,
            clear_color: [0, 0, 0, 255],
            visible: true,
        }
    }
}
