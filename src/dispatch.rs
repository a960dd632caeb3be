//! Kernel dispatch and device-side timing capture.

use std::ptr;

use opencl3::command_queue::CommandQueue;
use opencl3::kernel::Kernel;
use opencl3::memory::Buffer;
use opencl3::types::cl_float;

use crate::{BenchError, BenchResult};

/// The four profiling timestamps of one kernel dispatch.
///
/// Values are device-clock nanosecond ticks of a device-defined epoch,
/// monotonically non-decreasing in the order queued → submitted →
/// started → ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelTimings {
    /// Command enqueued on the host-side queue.
    pub queued: u64,
    /// Command submitted to the device.
    pub submitted: u64,
    /// Kernel execution started on the device.
    pub started: u64,
    /// Kernel execution finished on the device.
    pub ended: u64,
}

impl KernelTimings {
    /// Device-side execution time of the dispatch in native ticks.
    ///
    /// Clamped to zero should a device ever report `ended < started`;
    /// such a pair also fails [`is_monotonic`](Self::is_monotonic).
    pub fn device_duration_ns(&self) -> u64 {
        self.ended.saturating_sub(self.started)
    }

    /// Whether the four timestamps are monotonically non-decreasing.
    pub fn is_monotonic(&self) -> bool {
        self.queued <= self.submitted
            && self.submitted <= self.started
            && self.started <= self.ended
    }
}

/// Bind the three buffers to kernel slots 0–2 and submit one 1-D range
/// of `global_size` work-items.
///
/// All three bind attempts are made before the combined status check, so
/// a failure on slot 0 does not mask failures on slots 1–2. The local
/// work-group size is left to the runtime scheduler. Blocks until the
/// dispatch completes, then extracts the queued/submit/start/end
/// profiling counters; the queue must have been created with
/// `CL_QUEUE_PROFILING_ENABLE`.
pub fn dispatch(
    queue: &CommandQueue,
    kernel: &Kernel,
    input: &Buffer<cl_float>,
    bias: &Buffer<cl_float>,
    output: &Buffer<cl_float>,
    global_size: usize,
) -> BenchResult<KernelTimings> {
    let binds = unsafe {
        [
            kernel.set_arg(0, input),
            kernel.set_arg(1, bias),
            kernel.set_arg(2, output),
        ]
    };
    if let Some(e) = binds.into_iter().find_map(|r| r.err()) {
        return Err(BenchError::ArgBind(e.0));
    }

    let global_work_size = [global_size];
    let event = unsafe {
        queue
            .enqueue_nd_range_kernel(
                kernel.get(),
                1,
                ptr::null(),
                global_work_size.as_ptr(),
                ptr::null(),
                &[],
            )
            .map_err(|e| BenchError::Dispatch(e.0))?
    };
    event.wait().map_err(|e| BenchError::Dispatch(e.0))?;

    Ok(KernelTimings {
        queued: event
            .profiling_command_queued()
            .map_err(|e| BenchError::Profiling(e.0))?,
        submitted: event
            .profiling_command_submit()
            .map_err(|e| BenchError::Profiling(e.0))?,
        started: event
            .profiling_command_start()
            .map_err(|e| BenchError::Profiling(e.0))?,
        ended: event
            .profiling_command_end()
            .map_err(|e| BenchError::Profiling(e.0))?,
    })
}
