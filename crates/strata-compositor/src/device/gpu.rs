use anyhow::{Context, Result};

use super::{ContextLimits, DeviceInit, GraphicsContext, LossHandle};

/// wgpu-backed graphics context.
///
/// Owns the adapter, logical device and queue. There is no surface: presenting
/// is the embedder's concern, the compositor only needs a device whose loss it
/// can observe.
pub struct WgpuContext {
    /// Label reported through `GraphicsContext::label`.
    label: String,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Limits derived from the device at creation.
    limits: ContextLimits,

    /// Set by the device-lost callback.
    loss: LossHandle,
}

impl WgpuContext {
    /// Creates a context on the best available adapter.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: DeviceInit) -> Result<Self> {
        let DeviceInit {
            label,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
            partial_swap,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(label.as_str()),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let loss = LossHandle::new();
        let observer = loss.clone();
        let device_label = label.clone();
        device.set_device_lost_callback(move |reason, message| {
            observer.lose();
            log::error!("device '{device_label}' lost ({reason:?}): {message}");
        });

        let limits = ContextLimits {
            max_texture_size: device.limits().max_texture_dimension_2d,
            supports_partial_swap: partial_swap,
            prefers_bgra: cfg!(any(target_os = "windows", target_os = "macos")),
        };

        let info = adapter.get_info();
        log::info!(
            "created wgpu context '{label}' on {} ({:?})",
            info.name,
            info.backend
        );

        Ok(Self {
            label,
            adapter,
            device,
            queue,
            limits,
            loss,
        })
    }

    /// Blocking variant of [`WgpuContext::new`] for synchronous hosts.
    pub fn new_blocking(init: DeviceInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    /// Returns information about the selected adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Handle observing (and able to force) loss of this device.
    pub fn loss_handle(&self) -> LossHandle {
        self.loss.clone()
    }
}

impl GraphicsContext for WgpuContext {
    fn label(&self) -> &str {
        &self.label
    }

    fn limits(&self) -> ContextLimits {
        self.limits
    }

    fn is_lost(&self) -> bool {
        self.loss.is_lost()
    }

    fn flush(&self) {
        self.queue.submit(std::iter::empty::<wgpu::CommandBuffer>());
    }
}
