//! Single-shot benchmark pipeline.
//!
//! Composes the stages in a strictly linear order: select device →
//! create context → build program → create queue → create kernel →
//! stage buffers → dispatch → verify. There is no loop, no retry, and
//! no branching back; the first failure unwinds the run and releases
//! every handle acquired so far.

use std::path::PathBuf;
use std::time::Instant;

use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::kernel::Kernel;
use opencl3::memory::Buffer;
use opencl3::program::Program;
use opencl3::types::cl_float;

use crate::buffer::{stage, StagingMode};
use crate::device::select_device;
use crate::dispatch::{dispatch, KernelTimings};
use crate::program::{build_program, read_source};
use crate::verify::verify;
use crate::{BenchError, BenchResult, ARRAY_SIZE, KERNEL_FUNC, PROGRAM_FILE, TOLERANCE};

/// Benchmark configuration.
///
/// The element count, kernel entry point, and tolerance are fixed
/// properties of the benchmark and default to the crate constants; the
/// source path may be overridden from the command line.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Path of the kernel source file.
    pub kernel_path: PathBuf,
    /// Exported kernel function name.
    pub kernel_func: String,
    /// Element count shared by all three buffers and the global range.
    pub array_size: usize,
    /// Absolute tolerance for result verification.
    pub tolerance: f32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            kernel_path: PathBuf::from(PROGRAM_FILE),
            kernel_func: KERNEL_FUNC.to_string(),
            array_size: ARRAY_SIZE,
            tolerance: TOLERANCE,
        }
    }
}

/// Measurements from one successful pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct BenchReport {
    /// Device-clock timestamps of the kernel dispatch.
    pub timings: KernelTimings,
    /// Host wall-clock time for the whole pipeline, in milliseconds.
    pub wall_ms: f64,
}

/// Exclusive owner of every device-side handle for one pipeline run.
///
/// Field order is release order: Rust drops fields in declaration
/// order, so teardown runs kernel → buffers → queue → program →
/// context, the reverse of acquisition. Handles that never make it
/// into the struct (because an earlier stage failed) are released by
/// their own scoped drops as the error propagates.
struct Runtime {
    kernel: Kernel,
    input_buffer: Buffer<cl_float>,
    bias_buffer: Buffer<cl_float>,
    output_buffer: Buffer<cl_float>,
    queue: CommandQueue,
    _program: Program,
    _context: Context,
    _device: Device,
}

/// Run the full benchmark pipeline once.
///
/// The kernel source is read before any device interaction, so a bad
/// path fails without allocating device memory. Every device call is
/// followed by a synchronous wait; the single host thread observes the
/// kernel only through its completion event.
pub fn run(config: &BenchConfig) -> BenchResult<BenchReport> {
    let wall_start = Instant::now();

    let source = read_source(&config.kernel_path)?;

    let device = select_device()?;
    let context = Context::from_device(&device).map_err(|e| BenchError::ContextCreate(e.0))?;
    let program = build_program(&context, &device, &source)?;
    drop(source);

    #[allow(deprecated)]
    let queue = CommandQueue::create_default(&context, CL_QUEUE_PROFILING_ENABLE)
        .map_err(|e| BenchError::QueueCreate(e.0))?;

    let kernel =
        Kernel::create(&program, &config.kernel_func).map_err(|e| BenchError::KernelCreate(e.0))?;

    let input: Vec<f32> = (0..config.array_size).map(|i| i as f32).collect();
    let bias = vec![10_000.0f32; config.array_size];
    // Only sizes the output buffer; the kernel overwrites every element.
    let scratch = vec![0.0f32; config.array_size];

    let runtime = Runtime {
        input_buffer: stage(&context, &input, StagingMode::InputCopy)?,
        bias_buffer: stage(&context, &bias, StagingMode::InputCopy)?,
        output_buffer: stage(&context, &scratch, StagingMode::Output)?,
        kernel,
        queue,
        _program: program,
        _context: context,
        _device: device,
    };

    let timings = dispatch(
        &runtime.queue,
        &runtime.kernel,
        &runtime.input_buffer,
        &runtime.bias_buffer,
        &runtime.output_buffer,
        config.array_size,
    )?;

    verify(
        &runtime.queue,
        &runtime.output_buffer,
        &input,
        &bias,
        config.tolerance,
    )?;

    let wall_ms = wall_start.elapsed().as_secs_f64() * 1000.0;
    Ok(BenchReport { timings, wall_ms })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn default_config() -> BenchConfig {
        BenchConfig {
            kernel_path: Path::new(env!("CARGO_MANIFEST_DIR")).join(PROGRAM_FILE),
            ..BenchConfig::default()
        }
    }

    /// Run the pipeline, returning `None` when no OpenCL device exists.
    fn try_run(config: &BenchConfig) -> Option<BenchResult<BenchReport>> {
        match run(config) {
            Err(BenchError::PlatformUnavailable) | Err(BenchError::DeviceUnavailable) => None,
            other => Some(other),
        }
    }

    #[test]
    fn test_missing_source_fails_before_device_work() {
        // Does not require an OpenCL runtime: the source read comes first.
        let config = BenchConfig {
            kernel_path: PathBuf::from("no/such/add.cl"),
            ..BenchConfig::default()
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, BenchError::SourceNotFound(_)));
    }

    #[test]
    fn test_full_pipeline_passes() {
        let Some(result) = try_run(&default_config()) else {
            return; // no OpenCL device, skip
        };
        let report = result.expect("pipeline failed");
        assert!(report.timings.is_monotonic());
        assert!(report.wall_ms > 0.0);
    }

    #[test]
    fn test_rerun_reacquires_resources_cleanly() {
        // Each run owns its handles and releases them on drop, so two
        // runs in one process must both succeed without a double release.
        let config = default_config();
        let Some(first) = try_run(&config) else {
            return; // no OpenCL device, skip
        };
        first.expect("first run failed");
        run(&config).expect("second run failed");
    }

    #[test]
    fn test_subtraction_kernel_fails_verification() {
        let path = std::env::temp_dir().join("clbench_sub_kernel.cl");
        fs::write(
            &path,
            "__kernel void add(__global const float *input,\n\
                               __global const float *bias,\n\
                               __global float *output) {\n\
                 int i = get_global_id(0);\n\
                 output[i] = bias[i] - input[i];\n\
             }\n",
        )
        .unwrap();

        let config = BenchConfig {
            kernel_path: path.clone(),
            ..BenchConfig::default()
        };
        let result = try_run(&config);
        let _ = fs::remove_file(&path);

        let Some(result) = result else {
            return; // no OpenCL device, skip
        };
        // bias - input agrees with bias + input only at i = 0
        match result.unwrap_err() {
            BenchError::Mismatch {
                index,
                expected,
                actual,
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected, 10_001.0);
                assert_eq!(actual, 9_999.0);
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_kernel_surfaces_build_log() {
        let path = std::env::temp_dir().join("clbench_bad_kernel.cl");
        fs::write(&path, "__kernel void add() { this is not opencl c }\n").unwrap();

        let config = BenchConfig {
            kernel_path: path.clone(),
            ..BenchConfig::default()
        };
        let result = try_run(&config);
        let _ = fs::remove_file(&path);

        let Some(result) = result else {
            return; // no OpenCL device, skip
        };
        assert!(matches!(
            result.unwrap_err(),
            BenchError::Compile { .. }
        ));
    }
}
