//! Contract between the harnesses and a device execution backend.
//!
//! The harnesses only ever see this trait, so they can be exercised with a
//! scripted executor in tests while the wgpu backend satisfies it in
//! production.

use std::time::Duration;

use thiserror::Error;

use crate::run::Run;

/// Opaque identifier for a device buffer owned by the executor's binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Failures surfaced by an executor. All are considered unrecoverable at the
/// harness layer and are returned to the driving caller, which decides
/// whether to terminate the process.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("device buffer allocation failed: {0}")]
    Allocation(String),
    #[error("kernel launch failed: {0}")]
    Launch(String),
    #[error("host/device transfer failed: {0}")]
    Transfer(String),
    #[error("argument slot {slot} is not bound")]
    InvalidSlot { slot: u32 },
    #[error("device error: {0}")]
    Device(String),
}

/// A kernel bound to its argument buffers, ready to dispatch.
///
/// Launches are strictly sequential: every call blocks until the device work
/// completes, so a launch's buffer writes are visible to the following
/// `download`.
pub trait KernelExecutor {
    /// Dispatches the kernel with the given work geometry and returns the
    /// elapsed execution time at nanosecond resolution.
    fn launch(&mut self, run: &Run) -> Result<Duration, ExecError>;

    /// Repoints one argument slot at a different device buffer without
    /// touching any other slot. This is the ping-pong primitive.
    fn rebind(&mut self, slot: u32, buffer: BufferHandle) -> Result<(), ExecError>;

    /// Synchronously copies host bytes into a device buffer.
    fn upload(&mut self, buffer: BufferHandle, bytes: &[u8]) -> Result<(), ExecError>;

    /// Synchronously copies a device buffer back into host memory.
    fn download(&mut self, buffer: BufferHandle) -> Result<Vec<u8>, ExecError>;
}

/// The two argument slots playing input and output, plus the buffers
/// currently bound there. Only the iterative harness rotates the pair; the
/// slot indices themselves never change after binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong {
    pub input_slot: u32,
    pub output_slot: u32,
    pub input: BufferHandle,
    pub output: BufferHandle,
}
