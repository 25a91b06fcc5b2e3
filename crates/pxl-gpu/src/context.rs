//! GPU context and device management.

use std::sync::Arc;

use wgpu::{Device, DeviceDescriptor, Features, Instance, Queue};

use crate::{GpuError, GpuResult};

/// GPU context holding the device and queue.
pub struct GpuContext {
    pub(crate) device: Arc<Device>,
    pub(crate) queue: Arc<Queue>,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Probes for a usable adapter without creating a device.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Creates a new GPU context on the highest-performance adapter.
    pub fn new() -> GpuResult<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> GpuResult<Self> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        let adapter_limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("pxl_gpu_device"),
                    required_features: Features::empty(),
                    required_limits: adapter_limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    /// Adapter info (GPU name, vendor, backend).
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Device name as reported by the adapter.
    pub fn device_name(&self) -> &str {
        &self.adapter_info.name
    }

    /// Largest storage buffer the device accepts, in bytes.
    pub(crate) fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("device", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish()
    }
}
