//!
//! This is the interpreter for the Hustle concatenative language.
//!
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
#[cfg(feature = "jemalloc")]
use jemallocator::Jemalloc;
use log::debug;

use hustle_gc::HeapConfig;
use hustle_interpreter::reader::{read_source, ReadOutcome};
use hustle_interpreter::{Vm, VmConfig, VmError};

mod shell;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, Clone, PartialEq, Parser)]
#[clap(about, author)]
struct Options {
    /// File to evaluate. Starts a shell when omitted.
    file: Option<PathBuf>,

    /// Size of each of the two heap regions, in bytes.
    #[clap(long)]
    heap_size: Option<usize>,

    /// Capacity of the data stack, in cells.
    #[clap(long)]
    stack_size: Option<usize>,

    /// Capacity of the call stack, in frames.
    #[clap(long)]
    call_frames: Option<usize>,

    /// Collect garbage before every allocation.
    #[clap(long)]
    stress_gc: bool,

    /// Break before the first instruction and step interactively.
    #[clap(long)]
    debug: bool,

    /// Enable verbose output (with timing and heap statistics).
    #[clap(short = 'v')]
    verbose: bool,
}

impl Options {
    fn vm_config(&self) -> VmConfig {
        let defaults = VmConfig::default();
        let mut heap = HeapConfig {
            stress: self.stress_gc,
            ..defaults.heap
        };
        if let Some(heap_size) = self.heap_size {
            heap.region_size = heap_size;
            heap.low_space_threshold = heap.low_space_threshold.min(heap_size / 16);
        }
        VmConfig {
            stack_size: self.stack_size.unwrap_or(defaults.stack_size),
            call_frames: self.call_frames.unwrap_or(defaults.call_frames),
            heap,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts: Options = Options::parse();

    let mut vm = Vm::new(opts.vm_config()).context("could not create the virtual machine")?;
    if opts.debug {
        shell::install_break_handler(&mut vm);
    }

    let start = Instant::now();
    let result = match opts.file {
        Some(ref file) => run_file(&mut vm, file),
        None => shell::interactive(&mut vm, opts.verbose),
    };

    if opts.verbose {
        let elapsed = start.elapsed();
        println!("Execution time: {} ms ({} µs)", elapsed.as_millis(), elapsed.as_micros());
        let stats = vm.heap.stats();
        println!(
            "{} collections, {} bytes in use, {} bytes free",
            stats.collections, stats.bytes_used, stats.bytes_free
        );
    }
    result
}

fn run_file(vm: &mut Vm, file: &Path) -> anyhow::Result<()> {
    debug!("running {}", file.display());
    let source = std::fs::read_to_string(file).with_context(|| format!("could not read {}", file.display()))?;
    match read_source(vm, &source) {
        Ok(ReadOutcome::Done | ReadOutcome::ExitBootstrap) | Err(VmError::Halt) => Ok(()),
        Err(error) => bail!("{}: {}", file.display(), error),
    }
}
