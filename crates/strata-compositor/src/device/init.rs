/// Initialization parameters for a wgpu-backed context.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Label attached to the logical device.
    pub label: String,

    /// Adapter power preference.
    pub power_preference: wgpu::PowerPreference,

    /// Allow falling back to a software adapter when no hardware one exists.
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Report partial-swap support to the renderer.
    ///
    /// wgpu has no damage-rect present; leave this off unless the embedder
    /// provides one.
    pub partial_swap: bool,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            label: "strata device".to_string(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            partial_swap: false,
        }
    }
}
