//! Core SPMV benchmarking logic that remains independent of GPU backends.
//!
//! This crate hosts:
//! - work configurations and result records with their persistence rendering
//! - the sparse-matrix loader, its ELLPACK device encoding, and the CPU
//!   reference multiply
//! - the convergence checker and the float view it reads byte buffers through
//! - the `KernelExecutor` contract plus the iterative and single-shot
//!   harnesses driving it

pub mod config;
pub mod convergence;
pub mod executor;
pub mod harness;
pub mod matrix;
pub mod record;
pub mod run;
pub mod vectors;
pub mod view;

/// Convenience re-export for the scalar type flowing through device buffers.
pub type Scalar = f32;

pub use config::BenchOptions;
pub use executor::{BufferHandle, ExecError, KernelExecutor, PingPong};
pub use record::{Correctness, ResultRecord, Termination, TrialKind};
pub use run::Run;
