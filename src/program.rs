//! Kernel source loading and program compilation.

use std::fs;
use std::path::Path;

use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::program::Program;

use crate::{BenchError, BenchResult};

/// Read an entire kernel source file into memory.
///
/// Fails with [`BenchError::SourceNotFound`] without touching the
/// device, so a bad path never allocates device memory.
pub fn read_source(path: &Path) -> BenchResult<String> {
    fs::read_to_string(path).map_err(|_| BenchError::SourceNotFound(path.display().to_string()))
}

/// Compile kernel source into a program for the selected device.
///
/// The build is synchronous with no compiler options. On failure the
/// full build log is fetched and surfaced verbatim in
/// [`BenchError::Compile`] — it is the primary diagnostic and is never
/// truncated. The caller may drop the source string once this returns;
/// the OpenCL runtime keeps its own copy.
pub fn build_program(context: &Context, device: &Device, source: &str) -> BenchResult<Program> {
    let mut program = Program::create_from_source(context, source).map_err(|e| {
        BenchError::Compile {
            log: format!("create program failed (status {})", e.0),
        }
    })?;

    if program.build(&[device.id()], "").is_err() {
        let log = program
            .get_build_log(device.id())
            .unwrap_or_else(|e| format!("build log unavailable (status {})", e.0));
        return Err(BenchError::Compile { log });
    }

    Ok(program)
}
