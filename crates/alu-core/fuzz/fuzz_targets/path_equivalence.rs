#![no_main]

use std::collections::HashMap;

use alu_core::{
    execute_alu_op, AluGroup, AtomicPolicy, CoreConfig, DecodedInstruction, ExecHooks,
    ExecutionState, FlagDependencies, Flags, GeneralRegister, GuestMemory, PathBuilder, RmOperand,
    Trace,
};
use libfuzzer_sys::fuzz_target;

const MEMORY_BYTES: usize = 64;

struct StreamLiveness(HashMap<u64, Flags>);

impl FlagDependencies for StreamLiveness {
    fn needed_flags(&self, ip: u64, candidates: Flags) -> Flags {
        self.0.get(&ip).copied().unwrap_or(candidates) & candidates
    }
}

fn decode(chunk: &[u8], ip: u64) -> DecodedInstruction {
    let [select, prefixes, reg, rm] = [chunk[0], chunk[1], chunk[2], chunk[3]];
    let rm = if rm & 0x80 == 0 {
        RmOperand::Register(rm & 0x0F)
    } else {
        RmOperand::Memory(u64::from(rm & 0x3F) % (MEMORY_BYTES as u64 - 7))
    };
    let mut instr = DecodedInstruction::alu(
        AluGroup::from_index(select),
        select & 0x08 == 0,
        reg & 0x0F,
        rm,
    )
    .at(ip);
    if prefixes & 1 != 0 || reg & 0x08 != 0 || matches!(rm, RmOperand::Register(r) if r > 7) {
        instr = instr.with_rex();
    }
    if prefixes & 2 != 0 {
        instr = instr.with_osz();
    }
    if prefixes & 4 != 0 {
        instr = instr.with_rex_w();
    }
    instr
}

fn machine(seed: &[u8], policy: AtomicPolicy) -> (ExecutionState, GuestMemory) {
    let mut state = ExecutionState::default();
    for (index, reg) in GeneralRegister::ALL.into_iter().enumerate() {
        let byte = seed.get(index).copied().unwrap_or(0);
        state.set_gpr(reg, u64::from(byte).wrapping_mul(0x0101_0101_0101_0101));
    }
    let memory = GuestMemory::with_config(&CoreConfig {
        memory_bytes: MEMORY_BYTES,
        atomic_policy: policy,
    })
    .unwrap();
    for (offset, byte) in seed.iter().take(MEMORY_BYTES).enumerate() {
        memory.write_bytes(offset as u64, &[*byte]).unwrap();
    }
    (state, memory)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let live_out = Flags::from_bits_truncate(u64::from(data[0]) | (u64::from(data[0]) << 4)) & Flags::STATUS;
    let (seed, program) = data[1..].split_at((data.len() - 1).min(16));
    let stream: Vec<_> = program
        .chunks_exact(4)
        .take(32)
        .enumerate()
        .map(|(index, chunk)| decode(chunk, index as u64))
        .collect();

    let mut needed = HashMap::new();
    for (index, instr) in stream.iter().enumerate() {
        let after = match stream.get(index + 1) {
            Some(next) if next.group().reads_carry() => Flags::CF,
            Some(_) => Flags::empty(),
            None => live_out,
        };
        needed.insert(instr.ip, after);
    }
    let liveness = StreamLiveness(needed);

    // Interpreter with path building versus replay of the emitted path.
    let (mut interpreted, interpreted_memory) = machine(seed, AtomicPolicy::Native);
    let mut trace = Trace::new();
    {
        let mut hooks = ExecHooks::building(PathBuilder::new(&mut trace, &liveness));
        for instr in &stream {
            execute_alu_op(instr, &mut interpreted, &interpreted_memory, &mut hooks).unwrap();
        }
    }
    let (mut replayed, replayed_memory) = machine(seed, AtomicPolicy::Native);
    trace.replay(&mut replayed, &replayed_memory).unwrap();

    for reg in GeneralRegister::ALL {
        assert_eq!(interpreted.gpr(reg), replayed.gpr(reg));
    }
    assert_eq!(interpreted_memory.to_vec(), replayed_memory.to_vec());
    assert_eq!(interpreted.flags() & live_out, replayed.flags() & live_out);

    // Locked execution through either protocol matches unlocked execution.
    for policy in [AtomicPolicy::Native, AtomicPolicy::BusLockOnly] {
        let (mut locked, locked_memory) = machine(seed, policy);
        let (mut plain, plain_memory) = machine(seed, AtomicPolicy::Native);
        for instr in &stream {
            execute_alu_op(&instr.locked(), &mut locked, &locked_memory, &mut ExecHooks::default())
                .unwrap();
            execute_alu_op(instr, &mut plain, &plain_memory, &mut ExecHooks::default()).unwrap();
        }
        assert_eq!(locked, plain);
        assert_eq!(locked_memory.to_vec(), plain_memory.to_vec());
    }
});
