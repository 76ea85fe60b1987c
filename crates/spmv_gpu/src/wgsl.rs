//! Built-in WGSL kernel sources.

/// Reference ELLPACK SPMV kernel matching the standard argument order.
pub const SPMV_ELLPACK: &str = include_str!("kernels/spmv_ellpack.wgsl");

/// Entry point / display name of the built-in kernel.
pub const SPMV_ELLPACK_NAME: &str = "spmv_ellpack";

#[cfg(test)]
mod tests {
    use super::*;
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    #[test]
    fn builtin_kernel_validates() {
        let module = naga::front::wgsl::parse_str(SPMV_ELLPACK)
            .unwrap_or_else(|err| panic!("spmv_ellpack: {err:?}"));
        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        let info = validator
            .validate(&module)
            .unwrap_or_else(|err| panic!("spmv_ellpack: {err:?}"));

        assert_eq!(module.entry_points.len(), 1);
        assert_eq!(module.entry_points[0].name, SPMV_ELLPACK_NAME);
        let _ = info;
    }
}
