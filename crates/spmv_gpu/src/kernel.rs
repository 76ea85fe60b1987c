//! WGSL kernel compilation.

use pollster::block_on;
use wgpu::{ComputePipelineDescriptor, ShaderModuleDescriptor, ShaderSource};

use spmv_core::ExecError;

use crate::device::GpuContext;

/// A compute pipeline built from opaque WGSL source.
///
/// The bind group layout is derived from the shader, and the entry point is
/// left to wgpu, which requires the source to declare exactly one compute
/// entry point. Build failures surface through a validation error scope so
/// the caller gets the native message instead of a device loss.
pub struct CompiledKernel {
    pub pipeline: wgpu::ComputePipeline,
}

impl CompiledKernel {
    pub fn new(ctx: &GpuContext, source: &str, label: &str) -> Result<Self, ExecError> {
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = ctx.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: ShaderSource::Wgsl(source.into()),
        });
        let pipeline = ctx
            .device
            .create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &module,
                entry_point: None,
                compilation_options: Default::default(),
                cache: None,
            });

        if let Some(err) = block_on(ctx.device.pop_error_scope()) {
            return Err(ExecError::Launch(format!("kernel build failed: {err}")));
        }
        Ok(Self { pipeline })
    }
}
