//! Ordered kernel-argument specification and its device binding.

use wgpu::util::DeviceExt;
use wgpu::{BufferDescriptor, BufferUsages};

use spmv_core::{BufferHandle, ExecError, PingPong};

use crate::device::GpuContext;

/// One logical kernel argument, in the order the kernel declares them.
#[derive(Debug, Clone)]
pub enum KernelArg {
    /// Storage buffer uploaded once from host bytes.
    Global(Vec<u8>),
    /// Device-only zero-initialized storage of the given byte size.
    ScratchGlobal(u64),
    /// Workgroup-local scratch. WGSL fixes workgroup memory at compile
    /// time, so this consumes no binding slot; the size is validated against
    /// the device limit.
    ScratchLocal(u64),
    /// 32-bit float scalar, bound as a uniform.
    Value(f32),
    /// Unsigned size scalar, bound as a uniform.
    Size(u32),
}

/// The full argument list plus which entries play the input and output
/// vectors.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    args: Vec<KernelArg>,
    input: usize,
    output: usize,
}

impl ArgumentSpec {
    /// `input` and `output` index into `args` and must name buffer-backed
    /// entries (Global or ScratchGlobal).
    pub fn new(args: Vec<KernelArg>, input: usize, output: usize) -> Result<Self, ExecError> {
        for (role, index) in [("input", input), ("output", output)] {
            match args.get(index) {
                Some(KernelArg::Global(_)) | Some(KernelArg::ScratchGlobal(_)) => {}
                _ => {
                    tracing::error!(role, index, "ping-pong argument is not a buffer");
                    return Err(ExecError::InvalidSlot { slot: index as u32 });
                }
            }
        }
        Ok(Self {
            args,
            input,
            output,
        })
    }

    pub fn args(&self) -> &[KernelArg] {
        &self.args
    }
}

/// Device buffers allocated for an [`ArgumentSpec`], with the binding-slot
/// assignment and the initial ping-pong pair.
///
/// Slot order is fixed for the binding's lifetime: bindable arguments take
/// consecutive binding indices in declaration order, and swapping only ever
/// changes which buffer sits at the two recorded slots.
pub struct ArgumentBinding {
    pub(crate) buffers: Vec<wgpu::Buffer>,
    pub(crate) slots: Vec<BufferHandle>,
    pub(crate) ping_pong: PingPong,
}

impl ArgumentBinding {
    pub fn bind(ctx: &GpuContext, spec: &ArgumentSpec) -> Result<Self, ExecError> {
        let limits = ctx.limits();
        let mut buffers: Vec<wgpu::Buffer> = Vec::new();
        let mut slots: Vec<BufferHandle> = Vec::new();
        let mut input = None;
        let mut output = None;
        let mut local_total: u64 = 0;

        for (index, arg) in spec.args().iter().enumerate() {
            let handle = BufferHandle(buffers.len() as u32);
            let label = format!("spmv arg {index}");

            match arg {
                KernelArg::Global(bytes) => {
                    check_buffer_size(bytes.len() as u64, limits.max_buffer_size, index)?;
                    buffers.push(ctx.device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some(&label),
                            contents: bytes,
                            usage: BufferUsages::STORAGE
                                | BufferUsages::COPY_SRC
                                | BufferUsages::COPY_DST,
                        },
                    ));
                }
                KernelArg::ScratchGlobal(size) => {
                    check_buffer_size(*size, limits.max_buffer_size, index)?;
                    buffers.push(ctx.device.create_buffer(&BufferDescriptor {
                        label: Some(&label),
                        size: *size,
                        usage: BufferUsages::STORAGE
                            | BufferUsages::COPY_SRC
                            | BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }));
                }
                KernelArg::Value(value) => {
                    buffers.push(ctx.device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some(&label),
                            contents: bytemuck::bytes_of(value),
                            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                        },
                    ));
                }
                KernelArg::Size(value) => {
                    buffers.push(ctx.device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some(&label),
                            contents: bytemuck::bytes_of(value),
                            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                        },
                    ));
                }
                KernelArg::ScratchLocal(size) => {
                    local_total += size;
                    let limit = limits.max_compute_workgroup_storage_size as u64;
                    if local_total > limit {
                        return Err(ExecError::Allocation(format!(
                            "workgroup scratch of {local_total} bytes exceeds the device limit of {limit}"
                        )));
                    }
                    continue;
                }
            }

            if index == spec.input {
                input = Some((slots.len() as u32, handle));
            }
            if index == spec.output {
                output = Some((slots.len() as u32, handle));
            }
            slots.push(handle);
        }

        // ArgumentSpec::new already pinned both roles to buffer args.
        let ((input_slot, input), (output_slot, output)) = match (input, output) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                return Err(ExecError::InvalidSlot {
                    slot: spec.input as u32,
                })
            }
        };

        Ok(Self {
            buffers,
            slots,
            ping_pong: PingPong {
                input_slot,
                output_slot,
                input,
                output,
            },
        })
    }
}

fn check_buffer_size(size: u64, max: u64, index: usize) -> Result<(), ExecError> {
    if size > max {
        return Err(ExecError::Allocation(format!(
            "argument {index} needs {size} bytes, device allows {max}"
        )));
    }
    Ok(())
}
