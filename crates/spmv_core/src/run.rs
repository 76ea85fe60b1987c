//! Work-group geometry for a single kernel dispatch, parsed from run files.

use std::{fmt, fs, path::Path};

use anyhow::{bail, Context, Result};

/// Global and local work sizes for up to two dispatch dimensions.
///
/// One-dimensional kernels leave the second dimension at `1/1`. The local
/// size is the work-group size the kernel was compiled for; the executor only
/// derives work-group counts from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub global1: u32,
    pub local1: u32,
    pub global2: u32,
    pub local2: u32,
}

impl Run {
    pub fn one_dim(global1: u32, local1: u32) -> Self {
        Self {
            global1,
            local1,
            global2: 1,
            local2: 1,
        }
    }

    pub fn two_dim(global1: u32, local1: u32, global2: u32, local2: u32) -> Self {
        Self {
            global1,
            local1,
            global2,
            local2,
        }
    }

    /// Work-group counts for a dispatch covering the global size.
    pub fn workgroup_count(&self) -> [u32; 3] {
        [
            self.global1.div_ceil(self.local1),
            self.global2.div_ceil(self.local2),
            1,
        ]
    }

    fn from_csv_line(line: &str) -> Result<Self> {
        let fields: Vec<u32> = line
            .split(',')
            .map(|field| {
                field
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("invalid work size '{}'", field.trim()))
            })
            .collect::<Result<_>>()?;

        let run = match fields.as_slice() {
            [g1, l1] => Self::one_dim(*g1, *l1),
            [g1, l1, g2, l2] => Self::two_dim(*g1, *l1, *g2, *l2),
            other => bail!(
                "expected 2 or 4 work sizes per row, found {}",
                other.len()
            ),
        };
        if run.global1 == 0 || run.local1 == 0 || run.global2 == 0 || run.local2 == 0 {
            bail!("work sizes must be non-zero");
        }
        Ok(run)
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "global={}x{} local={}x{}",
            self.global1, self.global2, self.local1, self.local2
        )
    }
}

/// Loads one [`Run`] per CSV row: `global1,local1[,global2,local2]`.
///
/// Blank lines and `#` comments are skipped; an empty run set is an error.
pub fn load_runs(path: impl AsRef<Path>) -> Result<Vec<Run>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read run file {}", path.display()))?;

    let mut runs = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let run = Run::from_csv_line(trimmed)
            .with_context(|| format!("{}:{}", path.display(), number + 1))?;
        runs.push(run);
    }

    if runs.is_empty() {
        bail!("run file {} contains no run configurations", path.display());
    }
    Ok(runs)
}
