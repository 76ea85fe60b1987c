//! wgpu implementation of the core executor contract.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use pollster::block_on;
use wgpu::{
    BindGroupDescriptor, BindGroupEntry, BufferDescriptor, BufferUsages,
    CommandEncoderDescriptor, ComputePassDescriptor,
};

use spmv_core::{BufferHandle, ExecError, KernelExecutor, PingPong, Run};

use crate::binding::ArgumentBinding;
use crate::device::GpuContext;
use crate::kernel::CompiledKernel;

/// A compiled kernel plus its bound argument buffers, dispatchable per run.
///
/// The bind group is rebuilt lazily after a rebind; everything else is
/// allocated once at construction.
pub struct WgpuExecutor {
    ctx: GpuContext,
    kernel: CompiledKernel,
    buffers: Vec<wgpu::Buffer>,
    slots: Vec<BufferHandle>,
    ping_pong: PingPong,
    bind_group: Option<wgpu::BindGroup>,
}

impl WgpuExecutor {
    pub fn new(ctx: GpuContext, kernel: CompiledKernel, binding: ArgumentBinding) -> Self {
        Self {
            ctx,
            kernel,
            buffers: binding.buffers,
            slots: binding.slots,
            ping_pong: binding.ping_pong,
            bind_group: None,
        }
    }

    /// The input/output slot pair recorded at binding time.
    pub fn ping_pong(&self) -> PingPong {
        self.ping_pong
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&wgpu::Buffer, ExecError> {
        self.buffers
            .get(handle.0 as usize)
            .ok_or_else(|| ExecError::Device(format!("unknown buffer handle {}", handle.0)))
    }

    fn ensure_bind_group(&mut self) {
        if self.bind_group.is_some() {
            return;
        }
        let entries: Vec<BindGroupEntry> = self
            .slots
            .iter()
            .enumerate()
            .map(|(slot, handle)| BindGroupEntry {
                binding: slot as u32,
                resource: self.buffers[handle.0 as usize].as_entire_binding(),
            })
            .collect();
        let layout = self.kernel.pipeline.get_bind_group_layout(0);
        self.bind_group = Some(self.ctx.device.create_bind_group(&BindGroupDescriptor {
            label: Some("spmv bind group"),
            layout: &layout,
            entries: &entries,
        }));
    }
}

impl KernelExecutor for WgpuExecutor {
    fn launch(&mut self, run: &Run) -> Result<Duration, ExecError> {
        self.ensure_bind_group();
        let Some(bind_group) = self.bind_group.as_ref() else {
            return Err(ExecError::Launch("bind group missing".into()));
        };
        let [x, y, z] = run.workgroup_count();

        self.ctx
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let start = Instant::now();

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("spmv dispatch encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor::default());
            pass.set_pipeline(&self.kernel.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        self.ctx.queue.submit(Some(encoder.finish()));
        let _ = self.ctx.device.poll(wgpu::MaintainBase::Wait);

        let elapsed = start.elapsed();
        if let Some(err) = block_on(self.ctx.device.pop_error_scope()) {
            return Err(ExecError::Launch(err.to_string()));
        }
        Ok(elapsed)
    }

    fn rebind(&mut self, slot: u32, buffer: BufferHandle) -> Result<(), ExecError> {
        if buffer.0 as usize >= self.buffers.len() {
            return Err(ExecError::Device(format!(
                "unknown buffer handle {}",
                buffer.0
            )));
        }
        let Some(bound) = self.slots.get_mut(slot as usize) else {
            return Err(ExecError::InvalidSlot { slot });
        };
        *bound = buffer;
        self.bind_group = None;
        Ok(())
    }

    fn upload(&mut self, buffer: BufferHandle, bytes: &[u8]) -> Result<(), ExecError> {
        let target = self.buffer(buffer)?;
        if bytes.len() as u64 > target.size() {
            return Err(ExecError::Transfer(format!(
                "upload of {} bytes into a {}-byte buffer",
                bytes.len(),
                target.size()
            )));
        }
        self.ctx.queue.write_buffer(target, 0, bytes);
        self.ctx.queue.submit(std::iter::empty());
        let _ = self.ctx.device.poll(wgpu::MaintainBase::Wait);
        Ok(())
    }

    fn download(&mut self, buffer: BufferHandle) -> Result<Vec<u8>, ExecError> {
        let source = self.buffer(buffer)?;
        let size = source.size();

        let staging = self.ctx.device.create_buffer(&BufferDescriptor {
            label: Some("spmv staging"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("spmv readback encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
        self.ctx.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.ctx.device.poll(wgpu::MaintainBase::Wait);
        receiver
            .recv()
            .map_err(|_| ExecError::Transfer("map callback dropped".into()))?
            .map_err(|err| ExecError::Transfer(err.to_string()))?;

        let data = slice.get_mapped_range();
        let bytes = data.to_vec();
        drop(data);
        staging.unmap();

        Ok(bytes)
    }
}
