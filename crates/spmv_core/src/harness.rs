//! Iterative and single-shot benchmark drivers over a bound kernel.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::BenchOptions;
use crate::convergence;
use crate::executor::{BufferHandle, ExecError, KernelExecutor, PingPong};
use crate::record::{Correctness, ResultRecord, Termination, TrialKind};
use crate::run::Run;
use crate::view::FloatView;
use crate::Scalar;

/// Hard cap on ping-pong refinement steps within one outer trial. Reaching
/// it ends the trial as [`Termination::CappedOut`]; it is not an error.
pub const MAX_INNER_ITERATIONS: u32 = 10;

/// Drives repeated launches of an iterative kernel, swapping the input and
/// output buffer roles each step until the outputs stop moving.
pub struct IterativeHarness<E> {
    exec: E,
    io: PingPong,
    initial_input: Vec<u8>,
    output_len: usize,
    opts: BenchOptions,
}

impl<E: KernelExecutor> IterativeHarness<E> {
    /// `io` names the two swappable slots and their freshly bound buffers;
    /// `initial_input` is the starting vector re-uploaded at every trial
    /// reset; `output_len` is the output buffer's byte size.
    pub fn new(
        exec: E,
        io: PingPong,
        initial_input: Vec<u8>,
        output_len: usize,
        opts: BenchOptions,
    ) -> Self {
        Self {
            exec,
            io,
            initial_input,
            output_len,
            opts,
        }
    }

    pub fn into_executor(self) -> E {
        self.exec
    }

    /// Runs up to `iterations` refinement trials and returns one raw record
    /// per launch plus one per-trial sum record tagged with how the trial
    /// ended. Aggregation beyond the per-trial sum is left to the caller.
    pub fn benchmark(&mut self, run: &Run) -> Result<Vec<ResultRecord>, ExecError> {
        let mut records = Vec::new();

        for trial in 0..self.opts.iterations {
            self.reset()?;
            // Explicit rotating pair: element 0 is the buffer currently
            // playing input, element 1 the output. Slot indices stay fixed.
            let mut buffers = [self.io.input, self.io.output];
            let mut input_shadow = self.initial_input.clone();

            let mut trial_total = Duration::ZERO;
            let mut termination = Termination::CappedOut;

            for iteration in 0..MAX_INNER_ITERATIONS {
                let elapsed = self.exec.launch(run)?;
                trial_total += elapsed;
                let output_shadow = self.exec.download(buffers[1])?;

                records.push(ResultRecord {
                    duration: elapsed,
                    correctness: Correctness::NotChecked,
                    global: run.global1,
                    local: run.local1,
                    kind: TrialKind::Raw,
                    trial,
                    iteration,
                    termination: None,
                });

                if convergence::converged(&input_shadow, &output_shadow, self.opts.delta) {
                    termination = Termination::Converged;
                    break;
                }

                buffers.swap(0, 1);
                self.exec.rebind(self.io.input_slot, buffers[0])?;
                self.exec.rebind(self.io.output_slot, buffers[1])?;
                input_shadow = output_shadow;
            }

            records.push(ResultRecord {
                duration: trial_total,
                correctness: Correctness::StatisticValue,
                global: run.global1,
                local: run.local1,
                kind: TrialKind::MultiIterationSum,
                trial,
                iteration: 0,
                termination: Some(termination),
            });

            let trial_ms = trial_total.as_secs_f64() * 1000.0;
            if self.opts.timeout_ms > 0.0 && trial_ms >= self.opts.timeout_ms {
                debug!(
                    trial,
                    trial_ms, "trial exceeded the time budget, stopping further trials"
                );
                break;
            }
        }

        Ok(records)
    }

    /// Restores the setup-time state: initial vector in the original input
    /// buffer, zeroed output, slots pointing at their original buffers.
    fn reset(&mut self) -> Result<(), ExecError> {
        self.exec.upload(self.io.input, &self.initial_input)?;
        self.exec.upload(self.io.output, &vec![0u8; self.output_len])?;
        self.exec.rebind(self.io.input_slot, self.io.input)?;
        self.exec.rebind(self.io.output_slot, self.io.output)?;
        Ok(())
    }
}

/// Runs a fixed number of independent timed trials of one kernel and
/// appends a median summary record.
pub struct SingleShotHarness<E> {
    exec: E,
    output: BufferHandle,
    output_len: usize,
    scratch: Vec<(BufferHandle, usize)>,
    reference: Option<Vec<Scalar>>,
    opts: BenchOptions,
}

impl<E: KernelExecutor> SingleShotHarness<E> {
    pub fn new(exec: E, output: BufferHandle, output_len: usize, opts: BenchOptions) -> Self {
        Self {
            exec,
            output,
            output_len,
            scratch: Vec::new(),
            reference: None,
            opts,
        }
    }

    /// Registers a buffer to be zeroed before every trial.
    pub fn with_scratch(mut self, buffer: BufferHandle, len: usize) -> Self {
        self.scratch.push((buffer, len));
        self
    }

    /// Supplies the expected output; each trial is then tagged Correct,
    /// BadValues, or BadLength instead of NotChecked.
    pub fn with_reference(mut self, expected: Vec<Scalar>) -> Self {
        self.reference = Some(expected);
        self
    }

    pub fn into_executor(self) -> E {
        self.exec
    }

    /// Returns the per-trial raw records sorted by duration ascending,
    /// followed by one median record (upper median for even trial counts).
    pub fn benchmark(&mut self, run: &Run) -> Result<Vec<ResultRecord>, ExecError> {
        let blank = vec![0u8; self.output_len];
        let mut records = Vec::with_capacity(self.opts.iterations as usize + 1);

        for trial in 0..self.opts.iterations {
            for (buffer, len) in &self.scratch {
                self.exec.upload(*buffer, &vec![0u8; *len])?;
            }

            let elapsed = self.exec.launch(run)?;
            let output = self.exec.download(self.output)?;

            if output == blank {
                warn!(trial, "output buffer is identical to the zeroed reference; the kernel may not have run");
            }

            records.push(ResultRecord {
                duration: elapsed,
                correctness: self.judge(&output),
                global: run.global1,
                local: run.local1,
                kind: TrialKind::Raw,
                trial,
                iteration: 0,
                termination: None,
            });
        }

        records.sort_by_key(|record| record.duration);
        let median = records[records.len() / 2].duration;
        records.push(ResultRecord::new(
            median,
            Correctness::StatisticValue,
            run.global1,
            run.local1,
            TrialKind::Median,
        ));

        Ok(records)
    }

    fn judge(&self, output: &[u8]) -> Correctness {
        let Some(expected) = &self.reference else {
            return Correctness::NotChecked;
        };
        let actual = FloatView::new(output);
        if actual.len() != expected.len() {
            return Correctness::BadLength;
        }
        let within = actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| (a - e).abs() < self.opts.delta);
        if within {
            Correctness::Correct
        } else {
            Correctness::BadValues
        }
    }
}
