//! Lock contention harness for locked ALU instructions.
//!
//! Measures locked-add throughput for the native compare-and-swap path and
//! the bus-lock path, on one shared address and on per-thread addresses.
//! The per-thread rows show the cost of the single bus-lock domain: native
//! locked adds scale with distinct addresses, bus-locked adds do not.
//!
//! ## Usage
//!
//! ```sh
//! RUST_LOG=info cargo run -p alu-core --example lock_contention
//! ```

#![allow(clippy::pedantic)]

use alu_core::{
    execute_alu_op, AluCounters, AluGroup, AtomicPolicy, CoreConfig, DecodedInstruction,
    ExecHooks, ExecutionState, GeneralRegister, GuestMemory, RmOperand,
};
use bitflags as _;
use log::info;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

const NUM_THREADS: usize = 4;
const RUN_DURATION: Duration = Duration::from_millis(500);
const MEMORY_BYTES: usize = 0x1000;

#[derive(Debug, Clone, Copy)]
struct Scenario {
    name: &'static str,
    policy: AtomicPolicy,
    lock: bool,
    /// Address of thread 0; thread `n` adds `n * stride`.
    base: u64,
    stride: u64,
}

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    ops_per_second: f64,
    cas_retries: u64,
    bus_locked: u64,
}

const SCENARIOS: [Scenario; 6] = [
    Scenario {
        name: "unlocked_private",
        policy: AtomicPolicy::Native,
        lock: false,
        base: 0x100,
        stride: 0x40,
    },
    Scenario {
        name: "native_shared",
        policy: AtomicPolicy::Native,
        lock: true,
        base: 0x100,
        stride: 0,
    },
    Scenario {
        name: "native_private",
        policy: AtomicPolicy::Native,
        lock: true,
        base: 0x100,
        stride: 0x40,
    },
    Scenario {
        name: "bus_shared",
        policy: AtomicPolicy::BusLockOnly,
        lock: true,
        base: 0x100,
        stride: 0,
    },
    Scenario {
        name: "bus_private",
        policy: AtomicPolicy::BusLockOnly,
        lock: true,
        base: 0x100,
        stride: 0x40,
    },
    Scenario {
        name: "misaligned_private",
        policy: AtomicPolicy::Native,
        lock: true,
        base: 0x103,
        stride: 0x40,
    },
];

fn run_scenario(scenario: Scenario, duration: Duration) -> BenchmarkResult {
    let memory = match GuestMemory::with_config(&CoreConfig {
        memory_bytes: MEMORY_BYTES,
        atomic_policy: scenario.policy,
    }) {
        Ok(memory) => Arc::new(memory),
        Err(fault) => panic!("cannot allocate guest memory: {fault}"),
    };
    let counters = Arc::new(AluCounters::new());
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|index| {
            let tx = tx.clone();
            let memory = Arc::clone(&memory);
            let counters = Arc::clone(&counters);
            thread::spawn(move || {
                let addr = scenario.base + scenario.stride * index as u64;
                let mut instr =
                    DecodedInstruction::alu(AluGroup::Add, false, 1, RmOperand::Memory(addr))
                        .with_rex_w();
                if scenario.lock {
                    instr = instr.locked();
                }
                let mut state = ExecutionState::default();
                state.set_gpr(GeneralRegister::Rcx, 1);
                let mut hooks = ExecHooks::interpret().with_stats(counters.as_ref());

                let mut total_ops = 0u64;
                let start = Instant::now();
                while start.elapsed() < duration {
                    for _ in 0..1_000 {
                        if execute_alu_op(&instr, &mut state, &memory, &mut hooks).is_err() {
                            return;
                        }
                    }
                    total_ops += 1_000;
                }
                tx.send(total_ops).ok();
            })
        })
        .collect();

    for h in handles {
        h.join().ok();
    }
    drop(tx);

    let total_ops: u64 = rx.iter().sum();
    let snapshot = counters.snapshot();
    BenchmarkResult {
        name: scenario.name,
        ops_per_second: total_ops as f64 / duration.as_secs_f64(),
        cas_retries: snapshot.cas_retries,
        bus_locked: snapshot.locked_bus,
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn print_results(results: &[BenchmarkResult]) {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║                 LOCKED ALU CONTENTION HARNESS              ║");
    println!("╠════════════════════════════════════════════════════════════╣");
    println!(
        "║   Threads:  {:>5}   Duration: {:>5} ms                     ║",
        NUM_THREADS,
        RUN_DURATION.as_millis()
    );
    println!("╠════════════════════════════════════════════════════════════╣");
    println!(
        "║ {:18} │ {:>12} │ {:>10} │ {:>10} ║",
        "Scenario", "Ops/sec", "Retries", "Bus"
    );
    println!("╟────────────────────┼──────────────┼────────────┼────────────╢");
    for result in results {
        println!(
            "║ {:18} │ {:>12} │ {:>10} │ {:>10} ║",
            result.name,
            format_number(result.ops_per_second),
            result.cas_retries,
            result.bus_locked
        );
    }
    println!("╚════════════════════════════════════════════════════════════╝");
}

fn main() {
    env_logger::init();
    info!(
        "running {} scenarios on {NUM_THREADS} threads",
        SCENARIOS.len()
    );

    let results: Vec<_> = SCENARIOS
        .iter()
        .map(|scenario| {
            let result = run_scenario(*scenario, RUN_DURATION);
            info!(
                "{}: {} ops/sec",
                result.name,
                format_number(result.ops_per_second)
            );
            result
        })
        .collect();

    print_results(&results);
}
