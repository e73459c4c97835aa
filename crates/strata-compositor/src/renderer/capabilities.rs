use crate::device::ContextLimits;

/// Preferred texel layout for uploads.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TextureFormat {
    #[default]
    Rgba8,
    Bgra8,
}

/// Feature flags and limits of an initialized renderer.
///
/// The proxy caches a copy so the main side can read it without touching the
/// renderer, which may be busy with a commit.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RendererCapabilities {
    pub max_texture_size: u32,
    pub best_texture_format: TextureFormat,
    pub using_partial_swap: bool,
    pub using_set_visibility: bool,
    pub using_swap_complete_callback: bool,
    pub using_gpu_memory_manager: bool,
    pub allow_partial_texture_updates: bool,
}

impl RendererCapabilities {
    /// Baseline capabilities implied by a context's limits.
    pub fn from_limits(limits: ContextLimits) -> Self {
        Self {
            max_texture_size: limits.max_texture_size,
            best_texture_format: if limits.prefers_bgra {
                TextureFormat::Bgra8
            } else {
                TextureFormat::Rgba8
            },
            using_partial_swap: limits.supports_partial_swap,
            ..Self::default()
        }
    }
}
