/// clbench – OpenCL element-wise addition micro-benchmark.
///
/// Runs a single add-kernel dispatch over 100000 floats, prints the
/// device-side profiling timestamps and host wall-clock time, and
/// verifies the result:
///   clbench                  → run with the default kernel (kernels/add.cl)
///   clbench --kernel foo.cl  → run with another kernel source
///   clbench --probe          → list OpenCL devices and exit
use std::path::PathBuf;
use std::process::ExitCode;

use clbench::device;
use clbench::pipeline::{self, BenchConfig};

fn usage() {
    eprintln!("clbench - OpenCL element-wise addition micro-benchmark");
    eprintln!();
    eprintln!("Usage: clbench [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -k, --kernel PATH  Kernel source file (default: kernels/add.cl)");
    eprintln!("  -p, --probe        List available OpenCL devices and exit");
    eprintln!("  -h, --help         Show this help");
}

fn probe() {
    let devices = device::probe_devices();
    if devices.is_empty() {
        println!("no OpenCL devices found");
        return;
    }
    for info in devices {
        println!(
            "{} [{}] {} max_wg={} mem={}MB",
            info.name,
            if info.is_gpu { "gpu" } else { "cpu" },
            info.vendor,
            info.max_work_group_size,
            info.global_mem_size / (1024 * 1024),
        );
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = BenchConfig::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--kernel" | "-k" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--kernel requires a path");
                    return ExitCode::FAILURE;
                }
                config.kernel_path = PathBuf::from(&args[i]);
            }
            "--probe" | "-p" => {
                probe();
                return ExitCode::SUCCESS;
            }
            "--help" | "-h" => {
                usage();
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("unknown option: {other}");
                usage();
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    match pipeline::run(&config) {
        Ok(report) => {
            let t = report.timings;
            println!("t_queued at {}", t.queued);
            println!("t_submit at {}", t.submitted);
            println!("t_start at {}", t.started);
            println!("t_end at {}", t.ended);
            println!("kernel execute cost {} ns", t.device_duration_ns());
            println!("cpu all cost {:.3} ms", report.wall_ms);
            println!("ALL PASSED");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("clbench: {e}");
            ExitCode::FAILURE
        }
    }
}
