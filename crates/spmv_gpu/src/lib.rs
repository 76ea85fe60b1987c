//! wgpu implementation of the SPMV harness executor contract.
//!
//! Responsibilities:
//! - adapter discovery and selection by a (platform, device) index pair
//! - WGSL kernel compilation
//! - argument binding: buffer allocation, one-time upload, slot assignment
//! - the executor itself: timed dispatch, ping-pong rebinds, and synchronous
//!   host/device transfers

pub mod binding;
pub mod device;
pub mod executor;
pub mod kernel;
pub mod wgsl;

pub use binding::{ArgumentBinding, ArgumentSpec, KernelArg};
pub use device::GpuContext;
pub use executor::WgpuExecutor;
pub use kernel::CompiledKernel;
