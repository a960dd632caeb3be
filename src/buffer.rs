//! Device buffer staging.

use std::ffi::c_void;
use std::ptr;

use opencl3::context::Context;
use opencl3::memory::{Buffer, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use opencl3::types::{cl_float, cl_mem_flags};

use crate::{BenchError, BenchResult};

/// How a host array is mirrored into device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingMode {
    /// Read-only snapshot: host data is copied into device memory at
    /// creation and the region is frozen for kernel reads.
    InputCopy,
    /// Kernel-written output: the region is sized like the host array
    /// but its initial contents are unspecified; no host copy is made.
    Output,
}

impl StagingMode {
    fn flags(self) -> cl_mem_flags {
        match self {
            StagingMode::InputCopy => CL_MEM_READ_ONLY | CL_MEM_COPY_HOST_PTR,
            StagingMode::Output => CL_MEM_WRITE_ONLY,
        }
    }
}

/// Allocate a device buffer mirroring `host`.
///
/// The buffer is sized from `host.len()` in both modes; in `Output`
/// mode the host contents are irrelevant and nothing is copied.
pub fn stage(
    context: &Context,
    host: &[f32],
    mode: StagingMode,
) -> BenchResult<Buffer<cl_float>> {
    let host_ptr = match mode {
        StagingMode::InputCopy => host.as_ptr() as *mut c_void,
        StagingMode::Output => ptr::null_mut(),
    };
    unsafe {
        Buffer::<cl_float>::create(context, mode.flags(), host.len(), host_ptr)
            .map_err(|e| BenchError::Allocation(e.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_copy_flags() {
        let flags = StagingMode::InputCopy.flags();
        assert_ne!(flags & CL_MEM_READ_ONLY, 0);
        assert_ne!(flags & CL_MEM_COPY_HOST_PTR, 0);
        assert_eq!(flags & CL_MEM_WRITE_ONLY, 0);
    }

    #[test]
    fn test_output_flags_skip_host_copy() {
        // The kernel writes the output buffer; it must not be staged
        // read-only and needs no host snapshot.
        let flags = StagingMode::Output.flags();
        assert_ne!(flags & CL_MEM_WRITE_ONLY, 0);
        assert_eq!(flags & CL_MEM_READ_ONLY, 0);
        assert_eq!(flags & CL_MEM_COPY_HOST_PTR, 0);
    }

    #[test]
    fn test_stage_both_modes() {
        let device = match crate::device::select_device() {
            Ok(d) => d,
            Err(_) => return, // no OpenCL device, skip
        };
        let context = Context::from_device(&device).unwrap();

        let host = vec![1.0f32; 256];
        assert!(stage(&context, &host, StagingMode::InputCopy).is_ok());
        assert!(stage(&context, &host, StagingMode::Output).is_ok());
    }
}
