//! GPU executor: pipeline compilation and one-shot filter application.

use std::sync::Arc;

use pxl_core::{FilterRequest, PixelBuffer};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use crate::context::GpuContext;
use crate::graph::GraphSession;
use crate::{shaders, GpuResult};

/// Identifies one of the compiled compute pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PipelineKind {
    Grayscale,
    Convolve,
    EdgeDetect,
    Brightness,
    Saturation,
    Noise,
    FlipH,
    FlipV,
    Rotate90,
    RotateAngle,
    Downsample,
}

/// All filter pipelines, compiled once at executor construction.
pub(crate) struct Pipelines {
    grayscale: wgpu::ComputePipeline,
    convolve: wgpu::ComputePipeline,
    edge_detect: wgpu::ComputePipeline,
    brightness: wgpu::ComputePipeline,
    saturation: wgpu::ComputePipeline,
    noise: wgpu::ComputePipeline,
    flip_h: wgpu::ComputePipeline,
    flip_v: wgpu::ComputePipeline,
    rotate90: wgpu::ComputePipeline,
    rotate_angle: wgpu::ComputePipeline,
    downsample: wgpu::ComputePipeline,
}

impl Pipelines {
    fn create(device: &wgpu::Device) -> Self {
        let create_pipeline = |source: &str, label: &str| -> wgpu::ComputePipeline {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None, // Auto layout
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        Self {
            grayscale: create_pipeline(shaders::GRAYSCALE, "grayscale_pipeline"),
            convolve: create_pipeline(shaders::CONVOLVE, "convolve_pipeline"),
            edge_detect: create_pipeline(shaders::EDGE_DETECT, "edge_detect_pipeline"),
            brightness: create_pipeline(shaders::BRIGHTNESS, "brightness_pipeline"),
            saturation: create_pipeline(shaders::SATURATION, "saturation_pipeline"),
            noise: create_pipeline(shaders::NOISE, "noise_pipeline"),
            flip_h: create_pipeline(shaders::FLIP_H, "flip_h_pipeline"),
            flip_v: create_pipeline(shaders::FLIP_V, "flip_v_pipeline"),
            rotate90: create_pipeline(shaders::ROTATE90, "rotate90_pipeline"),
            rotate_angle: create_pipeline(shaders::ROTATE_ANGLE, "rotate_angle_pipeline"),
            downsample: create_pipeline(shaders::DOWNSAMPLE, "downsample_pipeline"),
        }
    }

    pub(crate) fn get(&self, kind: PipelineKind) -> &wgpu::ComputePipeline {
        match kind {
            PipelineKind::Grayscale => &self.grayscale,
            PipelineKind::Convolve => &self.convolve,
            PipelineKind::EdgeDetect => &self.edge_detect,
            PipelineKind::Brightness => &self.brightness,
            PipelineKind::Saturation => &self.saturation,
            PipelineKind::Noise => &self.noise,
            PipelineKind::FlipH => &self.flip_h,
            PipelineKind::FlipV => &self.flip_v,
            PipelineKind::Rotate90 => &self.rotate90,
            PipelineKind::RotateAngle => &self.rotate_angle,
            PipelineKind::Downsample => &self.downsample,
        }
    }
}

/// GPU filter executor.
///
/// Holds the device, queue, and the compiled pipeline set. Sessions
/// created from one executor share its pipelines; building the executor
/// is the expensive step and happens once per process.
pub struct GpuExecutor {
    pub(crate) context: GpuContext,
    pub(crate) pipelines: Arc<Pipelines>,
}

impl GpuExecutor {
    /// Probes for a usable adapter without creating a device.
    pub fn is_available() -> bool {
        GpuContext::is_available()
    }

    /// Acquires a device and compiles all filter pipelines.
    pub fn new() -> GpuResult<Self> {
        let context = GpuContext::new()?;
        info!(
            device = %context.device_name(),
            backend = ?context.adapter_info().backend,
            "GPU executor ready"
        );
        let pipelines = Arc::new(Pipelines::create(&context.device));
        Ok(Self { context, pipelines })
    }

    /// Device name as reported by the adapter.
    pub fn device_name(&self) -> &str {
        self.context.device_name()
    }

    /// Allocates device buffers for the given image shape and returns an
    /// un-instantiated session. Call [`GraphSession::record`] next.
    pub fn begin_session(
        &self,
        width: u32,
        height: u32,
        channels: u32,
    ) -> GpuResult<GraphSession> {
        GraphSession::initialize(self, width, height, channels)
    }

    /// Applies one filter through a throwaway single-op session.
    pub fn apply(&self, src: &PixelBuffer, request: &FilterRequest) -> GpuResult<PixelBuffer> {
        trace!(filter = request.name(), "gpu apply");
        let (w, h, c) = src.dimensions();
        let mut session = self.begin_session(w as u32, h as u32, c as u32)?;
        session.record(std::slice::from_ref(request))?;
        session.upload(src)?;
        session.execute()?;
        session.fetch()
    }
}

impl std::fmt::Debug for GpuExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuExecutor")
            .field("context", &self.context)
            .finish()
    }
}
