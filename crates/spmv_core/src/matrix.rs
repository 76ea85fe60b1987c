//! Sparse-matrix loading, ELLPACK device encoding, and the CPU reference
//! multiply.
//!
//! The loader understands MatrixMarket coordinate files:
//! - an optional `%%MatrixMarket matrix coordinate <field> <symmetry>` banner
//!   (`real`, `integer`, and `pattern` fields; `general` and `symmetric`
//!   symmetry, the latter mirrored on load)
//! - `%` comment lines
//! - a `rows cols nnz` size line followed by 1-based `row col [value]`
//!   entries; `pattern` entries default to 1.0.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use crate::view::bytes_of_floats;
use crate::Scalar;

/// Row-major sparse matrix: one `(column, value)` list per row.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    height: usize,
    width: usize,
    rows: Vec<Vec<(u32, Scalar)>>,
}

impl SparseMatrix {
    pub fn from_entries(
        height: usize,
        width: usize,
        entries: impl IntoIterator<Item = (usize, usize, Scalar)>,
    ) -> Result<Self> {
        let mut rows = vec![Vec::new(); height];
        for (row, col, value) in entries {
            if row >= height || col >= width {
                bail!(
                    "entry ({row}, {col}) outside a {height}x{width} matrix"
                );
            }
            rows[row].push((col as u32, value));
        }
        for row in &mut rows {
            row.sort_by_key(|(col, _)| *col);
        }
        Ok(Self {
            height,
            width,
            rows,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_square(&self) -> bool {
        self.height == self.width
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Longest row, which becomes the padded row length of the ELLPACK form.
    pub fn max_row_entries(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> &[(u32, Scalar)] {
        &self.rows[index]
    }
}

/// Loads a matrix from a MatrixMarket coordinate file.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<SparseMatrix> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read matrix file {}", path.display()))?;
    parse_matrix_market(&text)
        .with_context(|| format!("failed to parse matrix file {}", path.display()))
}

fn parse_matrix_market(text: &str) -> Result<SparseMatrix> {
    let mut pattern = false;
    let mut symmetric = false;
    let mut lines = text.lines().enumerate().peekable();

    if let Some((_, first)) = lines.peek() {
        if let Some(banner) = first.strip_prefix("%%MatrixMarket") {
            let tokens: Vec<&str> = banner.split_whitespace().collect();
            match tokens.as_slice() {
                ["matrix", "coordinate", field, symmetry] => {
                    pattern = match *field {
                        "real" | "integer" => false,
                        "pattern" => true,
                        other => bail!("unsupported matrix field '{other}'"),
                    };
                    symmetric = match *symmetry {
                        "general" => false,
                        "symmetric" => true,
                        other => bail!("unsupported matrix symmetry '{other}'"),
                    };
                }
                _ => bail!("unsupported MatrixMarket banner '{first}'"),
            }
            lines.next();
        }
    }

    let mut size: Option<(usize, usize, usize)> = None;
    let mut entries: Vec<(usize, usize, Scalar)> = Vec::new();

    for (number, line) in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();

        if size.is_none() {
            let [rows, cols, nnz] = tokens.as_slice() else {
                bail!("line {}: expected 'rows cols nnz'", number + 1);
            };
            size = Some((
                rows.parse().with_context(|| format!("line {}", number + 1))?,
                cols.parse().with_context(|| format!("line {}", number + 1))?,
                nnz.parse().with_context(|| format!("line {}", number + 1))?,
            ));
            continue;
        }

        let (row, col, value): (usize, usize, Scalar) = match tokens.as_slice() {
            [row, col] if pattern => (row.parse()?, col.parse()?, 1.0),
            [row, col, value] if !pattern => {
                (row.parse()?, col.parse()?, value.parse()?)
            }
            _ => bail!("line {}: malformed matrix entry", number + 1),
        };
        if row == 0 || col == 0 {
            bail!("line {}: matrix entries are 1-based", number + 1);
        }
        entries.push((row - 1, col - 1, value));
        if symmetric && row != col {
            entries.push((col - 1, row - 1, value));
        }
    }

    let Some((height, width, nnz)) = size else {
        bail!("missing size line");
    };
    let declared = entries.len();
    if !symmetric && declared != nnz {
        bail!("file declared {nnz} entries but contained {declared}");
    }

    SparseMatrix::from_entries(height, width, entries)
}

/// ELLPACK encoding: fixed-width rows of column indices and values, padded
/// with index 0 and the pad value so every row has `row_width` slots.
#[derive(Debug, Clone)]
pub struct EllMatrix {
    pub row_width: u32,
    pub height: u32,
    pub width: u32,
    pub indices: Vec<u32>,
    pub values: Vec<Scalar>,
}

impl EllMatrix {
    pub fn encode(matrix: &SparseMatrix, pad: Scalar) -> Self {
        let row_width = matrix.max_row_entries();
        let slots = matrix.height() * row_width;
        let mut indices = vec![0u32; slots];
        let mut values = vec![pad; slots];

        for row in 0..matrix.height() {
            for (j, (col, value)) in matrix.row(row).iter().enumerate() {
                indices[row * row_width + j] = *col;
                values[row * row_width + j] = *value;
            }
        }

        Self {
            row_width: row_width as u32,
            height: matrix.height() as u32,
            width: matrix.width() as u32,
            indices,
            values,
        }
    }

    pub fn index_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.indices).to_vec()
    }

    pub fn value_bytes(&self) -> Vec<u8> {
        bytes_of_floats(&self.values)
    }

    /// Byte size of the dense output vector the kernel writes.
    pub fn output_bytes(&self) -> usize {
        self.height as usize * std::mem::size_of::<Scalar>()
    }
}

/// CPU reference: `alpha * A * x + beta * y`.
///
/// Backs the single-shot correctness check and the end-to-end tests.
pub fn spmv(
    matrix: &SparseMatrix,
    x: &[Scalar],
    y: &[Scalar],
    alpha: Scalar,
    beta: Scalar,
) -> Vec<Scalar> {
    (0..matrix.height())
        .map(|row| {
            let acc: Scalar = matrix
                .row(row)
                .iter()
                .map(|(col, value)| value * x[*col as usize])
                .sum();
            alpha * acc + beta * y.get(row).copied().unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut rng = thread_rng();
        let path = std::env::temp_dir().join(format!("spmv_matrix_{}.mtx", rng.gen::<u64>()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    fn four_by_four() -> SparseMatrix {
        SparseMatrix::from_entries(
            4,
            4,
            vec![
                (0, 0, 2.0),
                (0, 3, 1.0),
                (1, 1, 3.0),
                (2, 0, -1.0),
                (2, 2, 4.0),
                (3, 3, 5.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn parses_coordinate_files() {
        let path = write_temp(
            "%%MatrixMarket matrix coordinate real general\n\
             % a comment\n\
             3 3 4\n\
             1 1 1.5\n\
             2 2 2.5\n\
             3 1 -1.0\n\
             3 3 3.5\n",
        );
        let matrix = load_matrix(&path).unwrap();
        assert_eq!((matrix.height(), matrix.width()), (3, 3));
        assert!(matrix.is_square());
        assert_eq!(matrix.nnz(), 4);
        assert_eq!(matrix.row(2), &[(0, -1.0), (2, 3.5)]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn mirrors_symmetric_files_and_defaults_pattern_values() {
        let path = write_temp(
            "%%MatrixMarket matrix coordinate pattern symmetric\n\
             3 3 2\n\
             2 1\n\
             3 3\n",
        );
        let matrix = load_matrix(&path).unwrap();
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.row(0), &[(1, 1.0)]);
        assert_eq!(matrix.row(1), &[(0, 1.0)]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rejects_declared_count_mismatch_and_garbage() {
        let path = write_temp("3 3 2\n1 1 1.0\n");
        assert!(load_matrix(&path).is_err());
        let _ = std::fs::remove_file(path);

        let path = write_temp("not a matrix\n");
        assert!(load_matrix(&path).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loader_accepts_non_square_matrices() {
        // Squareness is the caller's precondition, not the loader's.
        let path = write_temp("2 3 1\n1 1 1.0\n");
        let matrix = load_matrix(&path).unwrap();
        assert!(!matrix.is_square());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn ellpack_pads_short_rows() {
        let ell = EllMatrix::encode(&four_by_four(), 0.0);
        assert_eq!(ell.row_width, 2);
        assert_eq!(ell.indices.len(), 8);
        assert_eq!(ell.indices, vec![0, 3, 1, 0, 0, 2, 3, 0]);
        assert_eq!(ell.values, vec![2.0, 1.0, 3.0, 0.0, -1.0, 4.0, 5.0, 0.0]);
        assert_eq!(ell.output_bytes(), 16);
    }

    #[test]
    fn reference_spmv_of_ones_is_row_sums() {
        let matrix = four_by_four();
        let x = vec![1.0; 4];
        let y = vec![0.0; 4];
        let out = spmv(&matrix, &x, &y, 1.0, 0.0);
        assert_eq!(out, vec![3.0, 3.0, 3.0, 5.0]);
    }

    #[test]
    fn reference_spmv_applies_alpha_and_beta() {
        let matrix = four_by_four();
        let x = vec![1.0; 4];
        let y = vec![10.0; 4];
        let out = spmv(&matrix, &x, &y, 2.0, 0.5);
        assert_eq!(out, vec![11.0, 11.0, 11.0, 15.0]);
    }
}
