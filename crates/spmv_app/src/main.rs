//! CLI driver for the SPMV kernel benchmark harness.
//!
//! Exit codes: 0 on success, 2 for a non-square input matrix (detected
//! before any device work), 1 for everything else (device selection, kernel
//! build, launch, or file errors).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use spmv_core::harness::{IterativeHarness, SingleShotHarness};
use spmv_core::matrix::{self, EllMatrix, SparseMatrix};
use spmv_core::record::{self, ResultRecord};
use spmv_core::vectors::VectorPattern;
use spmv_core::view::bytes_of_floats;
use spmv_core::{BenchOptions, Scalar};
use spmv_gpu::{ArgumentBinding, ArgumentSpec, CompiledKernel, GpuContext, KernelArg, WgpuExecutor};

/// Benchmark harness for SPMV sparse-matrix dense-vector multiplication
/// kernels.
#[derive(Debug, Parser)]
#[command(name = "spmv-bench", version)]
struct Cli {
    /// GPU platform index (backend group, in enumeration order)
    #[arg(short, long, default_value_t = 0)]
    platform: u32,

    /// Device index within the platform
    #[arg(short, long, default_value_t = 0)]
    device: u32,

    /// Number of benchmark trials per run configuration
    #[arg(short, long, default_value_t = 10)]
    iterations: u32,

    /// Input matrix (MatrixMarket coordinate format)
    #[arg(short, long)]
    matrix: PathBuf,

    /// WGSL kernel file, or "builtin" for the bundled ELLPACK kernel
    #[arg(short, long)]
    kernel: String,

    /// Run configuration file: one `global1,local1[,global2,local2]` per row
    #[arg(short, long)]
    runfile: PathBuf,

    /// Host the harness is running on, recorded with every result
    #[arg(short = 'n', long)]
    hostname: String,

    /// An experiment ID for data reporting
    #[arg(short, long)]
    experiment: String,

    /// Delta for floating point comparisons
    #[arg(short = 't', long, default_value_t = 0.0001)]
    delta: Scalar,

    /// Per-trial kernel-time budget in milliseconds (0 disables)
    #[arg(long, default_value_t = 100.0)]
    timeout: f64,

    /// Which harness drives the kernel
    #[arg(long, value_enum, default_value_t = Mode::Spmv)]
    mode: Mode,

    /// Check each trial's output against the CPU reference multiply
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Independent timed trials of one kernel launch, with a median summary.
    Spmv,
    /// Ping-pong refinement until convergence or the iteration cap.
    Eigenvector,
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt().try_init();
    let cli = Cli::parse();

    let matrix = match matrix::load_matrix(&cli.matrix) {
        Ok(matrix) => matrix,
        Err(err) => {
            eprintln!("failed to load matrix: {err:#}");
            return ExitCode::from(1);
        }
    };

    if !matrix.is_square() {
        // Reported on both streams before any device work happens.
        println!("Matrix is not square. Failing computation.");
        eprintln!("Matrix is not square. Failing computation.");
        return ExitCode::from(2);
    }
    info!(
        width = matrix.width(),
        height = matrix.height(),
        "matrix is square"
    );

    match bench(&cli, &matrix) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("benchmark failed: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn bench(cli: &Cli, matrix: &SparseMatrix) -> Result<()> {
    let (kernel_source, kernel_name) = load_kernel(&cli.kernel)?;
    let runs = spmv_core::run::load_runs(&cli.runfile)?;
    for run in &runs {
        info!(%run, "loaded run configuration");
    }

    let ell = EllMatrix::encode(matrix, 0.0);
    info!(
        row_width = ell.row_width,
        height = ell.height,
        "encoded ELLPACK matrix"
    );

    let alpha = 1.0;
    let beta = 0.0;
    let x = VectorPattern::Constant(1.0).generate(matrix.width());
    let y = VectorPattern::Constant(0.0).generate(matrix.height());

    let args = vec![
        KernelArg::Global(ell.index_bytes()),
        KernelArg::Global(ell.value_bytes()),
        KernelArg::Global(bytes_of_floats(&x)),
        KernelArg::Global(bytes_of_floats(&y)),
        KernelArg::Value(alpha),
        KernelArg::Value(beta),
        KernelArg::ScratchGlobal(ell.output_bytes() as u64),
        KernelArg::Size(ell.row_width),
        KernelArg::Size(ell.height),
    ];
    let spec = ArgumentSpec::new(args, 2, 6)?;

    let ctx = GpuContext::new(cli.platform, cli.device)?;
    let device_name = ctx.adapter_name().to_string();
    let kernel = CompiledKernel::new(&ctx, &kernel_source, &kernel_name)?;
    let binding = ArgumentBinding::bind(&ctx, &spec)?;
    let exec = WgpuExecutor::new(ctx, kernel, binding);
    let io = exec.ping_pong();

    let opts = BenchOptions {
        iterations: cli.iterations,
        delta: cli.delta,
        timeout_ms: cli.timeout,
    };
    let matrix_name = file_stem(&cli.matrix);
    let host_name = cli.hostname.clone();

    let report = |records: &[ResultRecord]| {
        println!("runtimes: [");
        for record in records {
            println!(
                "\t{}",
                record.render(&kernel_name, &host_name, &device_name, &matrix_name, &cli.experiment)
            );
        }
        println!("]");
        println!(
            "{}",
            record::insert_statement(
                records,
                &kernel_name,
                &host_name,
                &device_name,
                &matrix_name,
                &cli.experiment,
            )
        );
    };

    match cli.mode {
        Mode::Spmv => {
            let mut harness =
                SingleShotHarness::new(exec, io.output, ell.output_bytes(), opts.clone())
                    .with_scratch(io.output, ell.output_bytes());
            if cli.check {
                harness = harness.with_reference(matrix::spmv(matrix, &x, &y, alpha, beta));
            }
            for run in &runs {
                println!("Benchmarking run: {run}");
                let records = harness.benchmark(run)?;
                report(&records);
            }
        }
        Mode::Eigenvector => {
            let mut harness = IterativeHarness::new(
                exec,
                io,
                bytes_of_floats(&x),
                ell.output_bytes(),
                opts.clone(),
            );
            for run in &runs {
                println!("Benchmarking run: {run}");
                let records = harness.benchmark(run)?;
                report(&records);
            }
        }
    }

    Ok(())
}

fn load_kernel(kernel: &str) -> Result<(String, String)> {
    if kernel == "builtin" {
        return Ok((
            spmv_gpu::wgsl::SPMV_ELLPACK.to_string(),
            spmv_gpu::wgsl::SPMV_ELLPACK_NAME.to_string(),
        ));
    }
    let path = Path::new(kernel);
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read kernel file {}", path.display()))?;
    Ok((source, file_stem(path)))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

