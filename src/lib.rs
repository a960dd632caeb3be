//! clbench — OpenCL element-wise addition micro-benchmark.
//!
//! Offloads `output[i] = input[i] + bias[i]` over a fixed-size float
//! array to an OpenCL device (GPU preferred, CPU fallback), captures the
//! four profiling timestamps of the single kernel dispatch, and checks
//! the result on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │ select      │──▶│ build program│──▶│ stage buffers│──▶│ dispatch +│
//! │ device      │   │ from source  │   │ (×3)         │   │ verify    │
//! └─────────────┘   └──────────────┘   └──────────────┘   └───────────┘
//! ```
//!
//! The pipeline is strictly linear and single-shot: one queue, one
//! kernel, one dispatch. Every device interaction is followed by a
//! synchronous wait, and any failure propagates as a [`BenchError`] up
//! to the binary, which prints it and exits non-zero. No component
//! terminates the process itself.

pub mod buffer;
pub mod device;
pub mod dispatch;
pub mod pipeline;
pub mod program;
pub mod verify;

use opencl3::types::cl_int;

/// Number of elements in each of the three benchmark arrays.
///
/// Shared by the input, bias, and output buffers and by the dispatch's
/// global work size. Fixed for benchmark reproducibility.
pub const ARRAY_SIZE: usize = 100_000;

/// Default path of the kernel source file.
pub const PROGRAM_FILE: &str = "kernels/add.cl";

/// Name of the kernel function inside the source file.
pub const KERNEL_FUNC: &str = "add";

/// Absolute tolerance for result verification.
///
/// The benchmark inputs are integer-valued floats whose sums are exactly
/// representable in f32, so this only has to absorb device rounding-mode
/// differences.
pub const TOLERANCE: f32 = 1e-5;

/// Error types for clbench operations.
///
/// Every variant is fatal to the run: there is no local recovery
/// anywhere in the pipeline. Variants carrying a `cl_int` hold the raw
/// negative status returned by the failing OpenCL call.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BenchError {
    /// No OpenCL platform is installed.
    PlatformUnavailable,
    /// The first platform exposes no GPU or CPU device.
    DeviceUnavailable,
    /// The kernel source file could not be read.
    SourceNotFound(String),
    /// Kernel compilation failed; carries the full build log verbatim.
    Compile { log: String },
    /// Context creation failed.
    ContextCreate(cl_int),
    /// Command queue creation failed.
    QueueCreate(cl_int),
    /// Kernel object creation failed.
    KernelCreate(cl_int),
    /// Device buffer allocation failed.
    Allocation(cl_int),
    /// Binding a buffer to a kernel argument slot failed.
    ArgBind(cl_int),
    /// Kernel submission failed.
    Dispatch(cl_int),
    /// Reading a profiling counter from the completed event failed.
    Profiling(cl_int),
    /// Reading the output buffer back to the host failed.
    Readback(cl_int),
    /// Draining the command queue failed.
    Flush(cl_int),
    /// An output element differed from `bias[i] + input[i]` by more
    /// than the tolerance.
    Mismatch {
        index: usize,
        expected: f32,
        actual: f32,
    },
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlatformUnavailable => write!(f, "could not get an OpenCL platform"),
            Self::DeviceUnavailable => write!(f, "no GPU or CPU device found"),
            Self::SourceNotFound(path) => write!(f, "kernel source not found: {path}"),
            // The build log is the primary diagnostic: surface it whole.
            Self::Compile { log } => write!(f, "kernel build failed:\n{log}"),
            Self::ContextCreate(status) => write!(f, "create context failed (status {status})"),
            Self::QueueCreate(status) => {
                write!(f, "create command queue failed (status {status})")
            }
            Self::KernelCreate(status) => write!(f, "create kernel failed (status {status})"),
            Self::Allocation(status) => write!(f, "create buffer failed (status {status})"),
            Self::ArgBind(status) => write!(f, "set kernel arg failed (status {status})"),
            Self::Dispatch(status) => write!(f, "kernel dispatch failed (status {status})"),
            Self::Profiling(status) => write!(f, "profiling query failed (status {status})"),
            Self::Readback(status) => write!(f, "read output buffer failed (status {status})"),
            Self::Flush(status) => write!(f, "queue drain failed (status {status})"),
            Self::Mismatch {
                index,
                expected,
                actual,
            } => write!(f, "check failed at index {index}: {expected} vs {actual}"),
        }
    }
}

impl std::error::Error for BenchError {}

pub type BenchResult<T> = Result<T, BenchError>;
