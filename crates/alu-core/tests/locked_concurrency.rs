//! Locked read-modify-write under real thread contention.

#![allow(clippy::pedantic, clippy::nursery, clippy::cast_possible_truncation)]

use alu_core::{
    execute_alu_op, AluCounters, AluGroup, AtomicPolicy, CoreConfig, DecodedInstruction,
    ExecHooks, ExecutionState, GeneralRegister, GuestMemory, OperandWidth, RmOperand,
};
use bitflags as _;
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const THREADS: u64 = 4;
const ITERATIONS: u64 = 2_000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn memory(policy: AtomicPolicy) -> GuestMemory {
    GuestMemory::with_config(&CoreConfig {
        memory_bytes: 0x1000,
        atomic_policy: policy,
    })
    .unwrap()
}

fn locked_add(width: OperandWidth, addr: u64) -> DecodedInstruction {
    let byte = width == OperandWidth::Byte;
    let instr = DecodedInstruction::alu(AluGroup::Add, byte, 1, RmOperand::Memory(addr)).locked();
    match width {
        OperandWidth::Byte | OperandWidth::Dword => instr,
        OperandWidth::Word => instr.with_osz(),
        OperandWidth::Qword => instr.with_rex_w(),
    }
}

/// Runs `iterations` of `instr` on `threads` contexts, each adding `delta`.
fn hammer(
    memory: &GuestMemory,
    instr: DecodedInstruction,
    threads: u64,
    iterations: u64,
    delta: u64,
    counters: &AluCounters,
) {
    std::thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(move || {
                let mut state = ExecutionState::default();
                state.set_gpr(GeneralRegister::Rcx, delta);
                let mut hooks = ExecHooks::interpret().with_stats(counters);
                for _ in 0..iterations {
                    execute_alu_op(&instr, &mut state, memory, &mut hooks).unwrap();
                }
            });
        }
    });
}

#[rstest]
#[case::aligned_qword(OperandWidth::Qword, 0x100)]
#[case::aligned_dword(OperandWidth::Dword, 0x104)]
#[case::aligned_word(OperandWidth::Word, 0x10A)]
#[case::byte(OperandWidth::Byte, 0x10B)]
#[case::misaligned_qword(OperandWidth::Qword, 0x203)]
#[case::misaligned_dword(OperandWidth::Dword, 0x301)]
#[case::cell_straddling_word(OperandWidth::Word, 0x407)]
fn concurrent_locked_adds_lose_no_update(
    #[case] width: OperandWidth,
    #[case] addr: u64,
    #[values(AtomicPolicy::Native, AtomicPolicy::BusLockOnly)] policy: AtomicPolicy,
) {
    init_logging();
    let memory = memory(policy);
    let counters = AluCounters::new();
    hammer(&memory, locked_add(width, addr), THREADS, ITERATIONS, 1, &counters);

    let expected = (THREADS * ITERATIONS) & width.mask();
    assert_eq!(memory.read(addr, width).unwrap(), expected);

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.executed, THREADS * ITERATIONS);
    assert_eq!(snapshot.locked_native + snapshot.locked_bus, THREADS * ITERATIONS);
    if policy == AtomicPolicy::BusLockOnly || !memory.is_native_atomic(addr, width) {
        assert_eq!(snapshot.locked_native, 0);
    }
}

#[test]
fn neighbouring_lanes_do_not_interfere() {
    init_logging();
    let memory = memory(AtomicPolicy::Native);
    let counters = AluCounters::new();
    std::thread::scope(|scope| {
        for lane in 0..4_u64 {
            let memory = &memory;
            let counters = &counters;
            scope.spawn(move || {
                hammer(
                    memory,
                    locked_add(OperandWidth::Byte, 0x40 + lane),
                    1,
                    200,
                    1,
                    counters,
                );
            });
        }
    });
    for lane in 0..4 {
        assert_eq!(memory.read(0x40 + lane, OperandWidth::Byte).unwrap(), 200);
    }
    assert_eq!(memory.read(0x44, OperandWidth::Dword).unwrap(), 0);
}

#[test]
fn bus_lock_serializes_against_native_path_on_overlapping_bytes() {
    init_logging();
    let memory = memory(AtomicPolicy::Native);
    let counters = AluCounters::new();
    let native = locked_add(OperandWidth::Qword, 0x100);
    // Misaligned word covering bytes 1..3 of the same quadword; adding 1
    // there adds 256 to the quadword.
    let bus = locked_add(OperandWidth::Word, 0x101);
    assert!(memory.is_native_atomic(0x100, OperandWidth::Qword) || alu_core::CELL_BYTES < 8);
    assert!(!memory.is_native_atomic(0x101, OperandWidth::Word));

    std::thread::scope(|scope| {
        let memory = &memory;
        let counters = &counters;
        scope.spawn(move || hammer(memory, native, 2, ITERATIONS, 1, counters));
        scope.spawn(move || hammer(memory, bus, 2, 100, 1, counters));
    });

    let expected = 2 * ITERATIONS + 256 * 2 * 100;
    assert_eq!(memory.read(0x100, OperandWidth::Qword).unwrap(), expected);
    assert!(counters.snapshot().locked_bus >= 200);
}

#[test]
fn two_contexts_locked_add32_from_zero_reach_two() {
    let memory = memory(AtomicPolicy::Native);
    let counters = AluCounters::new();
    hammer(&memory, locked_add(OperandWidth::Dword, 0x80), 2, 1, 1, &counters);
    assert_eq!(memory.read(0x80, OperandWidth::Dword).unwrap(), 2);
}

#[test]
fn concurrent_locked_sub_and_add_cancel_out() {
    let memory = memory(AtomicPolicy::Native);
    memory.write(0x200, OperandWidth::Qword, 1_000_000).unwrap();
    let counters = AluCounters::new();
    let add = locked_add(OperandWidth::Qword, 0x200);
    let sub = DecodedInstruction::alu(AluGroup::Sub, false, 1, RmOperand::Memory(0x200))
        .with_rex_w()
        .locked();
    std::thread::scope(|scope| {
        let memory = &memory;
        let counters = &counters;
        scope.spawn(move || hammer(memory, add, 2, ITERATIONS, 3, counters));
        scope.spawn(move || hammer(memory, sub, 2, ITERATIONS, 3, counters));
    });
    assert_eq!(memory.read(0x200, OperandWidth::Qword).unwrap(), 1_000_000);
}
