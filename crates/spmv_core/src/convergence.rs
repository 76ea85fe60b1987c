//! Elementwise convergence test between two equal-role buffers.

use crate::view::FloatView;
use crate::Scalar;

/// True iff every pair of corresponding elements differs by strictly less
/// than `tolerance`.
///
/// Both buffers are read as f32 elements; comparison covers only the shared
/// prefix when the element counts differ, so a length mismatch can report
/// convergence against a truncated buffer. Short-circuits on the first pair
/// at or beyond the tolerance.
pub fn converged(input: &[u8], output: &[u8], tolerance: Scalar) -> bool {
    let a = FloatView::new(input);
    let b = FloatView::new(output);
    let shared = a.len().min(b.len());

    for i in 0..shared {
        let (x, y) = match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };
        if !((x - y).abs() < tolerance) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::bytes_of_floats;

    #[test]
    fn all_within_tolerance_converges() {
        let a = bytes_of_floats(&[1.0, 2.0, 3.0]);
        let b = bytes_of_floats(&[1.00005, 1.99995, 3.0]);
        assert!(converged(&a, &b, 1e-4));
    }

    #[test]
    fn single_pair_at_or_beyond_tolerance_fails() {
        let a = bytes_of_floats(&[1.0, 2.0, 3.0]);
        let b = bytes_of_floats(&[1.0, 2.5, 3.0]);
        assert!(!converged(&a, &b, 1e-4));
    }

    #[test]
    fn exactly_tolerance_is_not_convergent() {
        // The contract is strict `<`.
        let a = bytes_of_floats(&[1.0]);
        let b = bytes_of_floats(&[1.5]);
        assert!(!converged(&a, &b, 0.5));
        assert!(converged(&a, &b, 0.5000001));
    }

    #[test]
    fn unequal_lengths_compare_the_shared_prefix() {
        // Documents the truncation policy: the buffers differ only at index
        // 5, past the shorter buffer's end, so the check still passes.
        let a = bytes_of_floats(&[1.0, 2.0, 3.0, 4.0]);
        let b = bytes_of_floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 99.0]);
        assert!(converged(&a, &b, 1e-4));
    }

    #[test]
    fn nan_elements_never_converge() {
        let a = bytes_of_floats(&[f32::NAN]);
        let b = bytes_of_floats(&[f32::NAN]);
        assert!(!converged(&a, &b, 1.0));
    }
}
