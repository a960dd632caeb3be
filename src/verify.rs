//! Output readback and host-side result verification.

use opencl3::command_queue::CommandQueue;
use opencl3::memory::Buffer;
use opencl3::types::{cl_float, CL_BLOCKING};

use crate::{BenchError, BenchResult};

/// Read the output buffer back and check it element-wise.
///
/// The read is blocking and the queue is drained before the host-side
/// comparison runs, so every outstanding device operation has completed
/// by the time the first element is inspected.
pub fn verify(
    queue: &CommandQueue,
    output_buffer: &Buffer<cl_float>,
    input: &[f32],
    bias: &[f32],
    tolerance: f32,
) -> BenchResult<()> {
    let mut output = vec![0.0f32; input.len()];
    let read_event = unsafe {
        queue
            .enqueue_read_buffer(output_buffer, CL_BLOCKING, 0, &mut output, &[])
            .map_err(|e| BenchError::Readback(e.0))?
    };
    read_event.wait().map_err(|e| BenchError::Readback(e.0))?;

    queue.finish().map_err(|e| BenchError::Flush(e.0))?;

    check_elementwise(input, bias, &output, tolerance)
}

/// Compare `actual` against `bias[i] + input[i]` with absolute tolerance.
///
/// Stops at the first failing index; later elements are not inspected.
pub fn check_elementwise(
    input: &[f32],
    bias: &[f32],
    actual: &[f32],
    tolerance: f32,
) -> BenchResult<()> {
    for (index, ((&a, &b), &got)) in input.iter().zip(bias).zip(actual).enumerate() {
        let expected = b + a;
        if (expected - got).abs() > tolerance {
            return Err(BenchError::Mismatch {
                index,
                expected,
                actual: got,
            });
        }
    }
    Ok(())
}
