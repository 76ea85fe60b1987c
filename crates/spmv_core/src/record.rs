//! Measured-trial records and their persistence rendering.
//!
//! The rendered tuple and the aggregate `INSERT` statement are an external
//! output contract: downstream consumers parse them, so the field order, the
//! punctuation, and the label strings must not drift.

use std::time::Duration;

/// Correctness tag persisted with each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correctness {
    Correct,
    NotChecked,
    GenericFailure,
    BadLength,
    BadValues,
    StatisticValue,
}

impl Correctness {
    pub fn label(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::NotChecked => "notchecked",
            Self::GenericFailure => "genericfailure",
            Self::BadLength => "badlength",
            Self::BadValues => "badvalues",
            Self::StatisticValue => "statisticvalue",
        }
    }
}

/// What a record measures: one launch, a per-trial sum, or the median trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialKind {
    Raw,
    MultiIterationSum,
    Median,
}

impl TrialKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Raw => "RAW_RESULT",
            Self::MultiIterationSum => "MULTI_ITERATION_SUM",
            Self::Median => "MEDIAN_RESULT",
        }
    }
}

/// How an iterative trial ended. Carried on the per-trial aggregate record so
/// callers can tell early convergence from hitting the iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    CappedOut,
}

/// One measured trial or aggregate, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub duration: Duration,
    pub correctness: Correctness,
    pub global: u32,
    pub local: u32,
    pub kind: TrialKind,
    pub trial: u32,
    pub iteration: u32,
    pub termination: Option<Termination>,
}

impl ResultRecord {
    pub fn new(
        duration: Duration,
        correctness: Correctness,
        global: u32,
        local: u32,
        kind: TrialKind,
    ) -> Self {
        Self {
            duration,
            correctness,
            global,
            local,
            kind,
            trial: 0,
            iteration: 0,
            termination: None,
        }
    }

    pub fn time_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    /// Renders the single-row tuple in the persisted field order.
    pub fn render(
        &self,
        kernel_name: &str,
        host_name: &str,
        device_name: &str,
        matrix_name: &str,
        experiment_id: &str,
    ) -> String {
        format!(
            "({}, \"{}\", \"{}\", {}, {}, \"{}\", \"{}\", \"{}\",{},{},\"{}\", \"{}\")",
            self.time_ms(),
            self.correctness.label(),
            kernel_name,
            self.global,
            self.local,
            host_name,
            device_name,
            matrix_name,
            self.iteration,
            self.trial,
            self.kind.label(),
            experiment_id,
        )
    }
}

const INSERT_HEADER: &str = "INSERT INTO table_name (time, correct, kernel, \
global, local, host, device, matrix, iteration, trial,\
statistic, experiment_id) VALUES ";

/// Renders a full benchmark run as one aggregate `INSERT` statement.
pub fn insert_statement(
    records: &[ResultRecord],
    kernel_name: &str,
    host_name: &str,
    device_name: &str,
    matrix_name: &str,
    experiment_id: &str,
) -> String {
    let mut out = String::from(INSERT_HEADER);
    for (i, record) in records.iter().enumerate() {
        if i != 0 {
            out.push_str(", ");
        }
        out.push_str(&record.render(
            kernel_name,
            host_name,
            device_name,
            matrix_name,
            experiment_id,
        ));
    }
    out.push(';');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultRecord {
        ResultRecord {
            duration: Duration::from_nanos(1_234_567),
            correctness: Correctness::NotChecked,
            global: 1024,
            local: 64,
            kind: TrialKind::Raw,
            trial: 3,
            iteration: 7,
            termination: None,
        }
    }

    #[test]
    fn renders_persisted_field_order() {
        let row = sample().render("kern", "host", "dev", "mat", "exp1");
        assert_eq!(
            row,
            "(1.234567, \"notchecked\", \"kern\", 1024, 64, \"host\", \"dev\", \"mat\",7,3,\"RAW_RESULT\", \"exp1\")"
        );
    }

    #[test]
    fn tuple_round_trips_numeric_fields() {
        let record = sample();
        let row = record.render("kern", "host", "dev", "mat", "exp1");
        let inner = row.trim_start_matches('(').trim_end_matches(')');
        let fields: Vec<&str> = inner.split(',').map(str::trim).collect();

        assert_eq!(fields[0].parse::<f64>().unwrap(), record.time_ms());
        assert_eq!(fields[3].parse::<u32>().unwrap(), record.global);
        assert_eq!(fields[4].parse::<u32>().unwrap(), record.local);
        assert_eq!(fields[8].parse::<u32>().unwrap(), record.iteration);
        assert_eq!(fields[9].parse::<u32>().unwrap(), record.trial);
    }

    #[test]
    fn insert_statement_shape() {
        let records = vec![sample(), sample()];
        let statement = insert_statement(&records, "kern", "host", "dev", "mat", "exp1");
        assert!(statement.starts_with(
            "INSERT INTO table_name (time, correct, kernel, global, local, host, device, matrix, iteration, trial,statistic, experiment_id) VALUES "
        ));
        assert!(statement.ends_with(';'));
        assert_eq!(statement.matches("RAW_RESULT").count(), 2);
        assert_eq!(statement.matches("), (").count(), 1);
    }

    #[test]
    fn all_labels_are_stable() {
        assert_eq!(Correctness::Correct.label(), "correct");
        assert_eq!(Correctness::NotChecked.label(), "notchecked");
        assert_eq!(Correctness::GenericFailure.label(), "genericfailure");
        assert_eq!(Correctness::BadLength.label(), "badlength");
        assert_eq!(Correctness::BadValues.label(), "badvalues");
        assert_eq!(Correctness::StatisticValue.label(), "statisticvalue");
        assert_eq!(TrialKind::Raw.label(), "RAW_RESULT");
        assert_eq!(TrialKind::MultiIterationSum.label(), "MULTI_ITERATION_SUM");
        assert_eq!(TrialKind::Median.label(), "MEDIAN_RESULT");
    }
}
