use std::collections::HashMap;

use revsim::{
    parse_program, Instruction, LogPayload, Machine, MachineError, Program, ProgramError,
    RegionType, ReversibleMemory, Src, TimeTravelDebugger,
};

const LOOP_SOURCE: &str = "\
; mixed reversible and irreversible loop

; r1 = loop counter
; r2 = accumulator
; r3 = decrement value (1)

ADD r1, r0, 10      ; r1 = 10
ADD r2, r0, 0       ; r2 = 0
ADD r3, r0, 1       ; r3 = 1

loop_start:
BEQ r1, r0, done    ; if r1 == 0, exit loop

RADD r2, r1         ; r2 = r2 + r1
RXOR r2, r1         ; reversible mix
RXOR r2, r1         ; unmix

SUB r1, r1, r3      ; r1 = r1 - 1

BEQ r0, r0, loop_start

done:
HALT
";

fn labels(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
    pairs.iter().map(|&(name, pc)| (name.to_string(), pc)).collect()
}

#[test]
fn reversible_increment_round_trip() {
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::Halt,
        ]))
        .unwrap();
    machine.set_register(1, 5);
    machine.set_register(2, 1);

    let steps = machine.run(None).unwrap();
    assert_eq!(steps, 4);
    assert!(machine.halted());
    assert_eq!(machine.register(1), 8);
    // the halt leaves no log entry, only the three increments do
    assert_eq!(machine.exec_log().len(), 3);

    for _ in 0..3 {
        assert!(machine.reverse_step().unwrap());
    }
    assert_eq!(machine.register(1), 5);
    assert_eq!(machine.register(2), 1);
    assert_eq!(machine.pc(), 0);

    // rewinding past the origin is an idempotent no-op
    assert!(!machine.reverse_step().unwrap());
    assert!(machine.halted());
}

#[test]
fn counted_loop_sums_to_55() {
    let mut machine = Machine::new();
    machine.load_program(parse_program(LOOP_SOURCE).unwrap()).unwrap();

    let steps = machine.run(Some(1000)).unwrap();
    assert!(steps < 1000);
    assert!(machine.halted());
    assert_eq!(machine.register(2), 55);
    assert_eq!(machine.register(1), 0);
    assert_eq!(machine.register(3), 1);
}

#[test]
fn exchange_round_trip_in_a_reversible_region() {
    let mut memory = ReversibleMemory::new();
    memory.configure_region(0x1000, 0x2000, RegionType::Reversible);
    assert_eq!(memory.region_type(0x1000), RegionType::Reversible);

    memory.store_word(0x1000, 100);

    let reg = 42;
    let got = memory.exchange(0x1000, reg);
    assert_eq!(got, 100);
    assert_eq!(memory.load_word(0x1000), 42);

    let restored = memory.exchange(0x1000, got);
    assert_eq!(restored, 42);
    assert_eq!(memory.load_word(0x1000), 100);
}

#[test]
fn history_bit_cost_for_branch_plus_radd() {
    let mut machine = Machine::new();
    let program = Program::new(
        vec![
            Instruction::Beq { rs1: 1, rs2: 2, label: "done".into() },
            Instruction::RAdd { rd: 2, rs1: 1 },
            Instruction::Halt,
        ],
        labels(&[("done", 2)]),
    );
    machine.load_program(program).unwrap();
    machine.set_register(1, 1);

    let mut debugger = TimeTravelDebugger::new(&mut machine);
    assert!(debugger.run_until_violation(100).unwrap().is_none());

    let history = debugger.history();
    assert_eq!(history.current_depth(), 2);
    assert_eq!(history.current_bits(), 33 + 8);
    assert_eq!(history.max_depth(), 2);
    assert_eq!(history.max_bits(), 41);
}

#[test]
fn debugger_localizes_the_nearest_value_changing_undo() {
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![
            Instruction::Add { rd: 1, rs1: 0, src: Src::Imm(10) },
            Instruction::Add { rd: 2, rs1: 0, src: Src::Imm(5) },
            Instruction::Add { rd: 3, rs1: 0, src: Src::Imm(3) },
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::RXor { rd: 1, rs1: 3 },
            Instruction::RAdd { rd: 1, rs1: 3 },
            Instruction::Halt,
        ]))
        .unwrap();

    machine.run(None).unwrap();
    let bad_value = machine.register(1);
    assert_ne!(bad_value, 18);

    let mut debugger = TimeTravelDebugger::new(&mut machine);
    let report = debugger.find_corruption_source(1, bad_value).unwrap().unwrap();

    // the nearest undo that changes r1, not the semantically-buggy RXOR
    assert_eq!(report.pc, 5);
    assert_eq!(report.instruction, Instruction::RAdd { rd: 1, rs1: 3 });
    assert_eq!(report.steps_back, 1);
}

#[test]
fn unconditional_branch_reverses_to_its_fetch_pc() {
    let mut machine = Machine::new();
    let program = Program::new(
        vec![
            Instruction::Beq { rs1: 0, rs2: 0, label: "end".into() },
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::Halt,
        ],
        labels(&[("end", 2)]),
    );
    machine.load_program(program).unwrap();
    let registers_before = machine.registers().to_vec();

    machine.step().unwrap();
    assert_eq!(machine.pc(), 2);
    assert_eq!(
        machine.exec_log()[0].payload,
        LogPayload::Branch { taken: true, from_pc: 0 }
    );

    machine.reverse_step().unwrap();
    assert_eq!(machine.pc(), 0);
    assert_eq!(machine.registers(), registers_before.as_slice());
}

#[test]
fn reversible_prefix_round_trips_bit_exact() {
    let mut machine = Machine::new();
    let program = Program::new(
        vec![
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::RXor { rd: 2, rs1: 3 },
            Instruction::RSwap { rd: 1, rs1: 3 },
            Instruction::Beq { rs1: 3, rs2: 3, label: "tail".into() },
            Instruction::RAdd { rd: 2, rs1: 1 },
            Instruction::Halt,
        ],
        labels(&[("tail", 4)]),
    );
    machine.load_program(program).unwrap();
    machine.set_register(1, 0x1234_5678);
    machine.set_register(2, 0x9abc_def0);
    machine.set_register(3, 7);

    let registers_before = machine.registers().to_vec();
    let pc_before = machine.pc();

    let steps = machine.run(Some(5)).unwrap();
    assert_eq!(steps, 5);
    assert_ne!(machine.registers(), registers_before.as_slice());

    for _ in 0..5 {
        assert!(machine.reverse_step().unwrap());
    }
    assert_eq!(machine.registers(), registers_before.as_slice());
    assert_eq!(machine.pc(), pc_before);
}

#[test]
fn log_length_is_forward_minus_reverse_on_reversible_code() {
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::RXor { rd: 1, rs1: 2 },
            Instruction::RSwap { rd: 1, rs1: 2 },
            Instruction::RAdd { rd: 2, rs1: 1 },
            Instruction::Halt,
        ]))
        .unwrap();

    for _ in 0..4 {
        machine.step().unwrap();
    }
    assert_eq!(machine.exec_log().len(), 4);

    machine.reverse_step().unwrap();
    machine.reverse_step().unwrap();
    assert_eq!(machine.exec_log().len(), 2);

    machine.step().unwrap();
    assert_eq!(machine.exec_log().len(), 3);

    while machine.reverse_step().unwrap() {}
    assert_eq!(machine.exec_log().len(), 0);

    // clamped at zero
    assert!(!machine.reverse_step().unwrap());
    assert_eq!(machine.exec_log().len(), 0);
}

#[test]
fn arithmetic_wraps_modulo_2_pow_32() {
    let mut machine = Machine::new();
    machine
        .load_program(parse_program("ADD r1, r0, -1\nSUB r2, r0, 1\nHALT\n").unwrap())
        .unwrap();

    machine.run(None).unwrap();
    assert_eq!(machine.register(1), u32::MAX);
    assert_eq!(machine.register(2), u32::MAX);
}

#[test]
fn parser_labels_point_past_their_declarations() {
    let source = "\
RADD r1, r2
middle:
RXOR r1, r2
BEQ r0, r0, end
RSWAP r1, r2
end:
HALT
";
    let program = parse_program(source).unwrap();
    assert_eq!(program.label_target("middle"), Some(1));
    assert_eq!(program.label_target("end"), Some(4));

    // and the reversible prefix still round-trips through the engine
    let mut machine = Machine::new();
    machine.load_program(program).unwrap();
    machine.set_register(1, 21);
    machine.set_register(2, 9);
    let registers_before = machine.registers().to_vec();

    let steps = machine.run(Some(3)).unwrap();
    assert_eq!(steps, 3);
    for _ in 0..3 {
        machine.reverse_step().unwrap();
    }
    assert_eq!(machine.registers(), registers_before.as_slice());
    assert_eq!(machine.pc(), 0);
}

#[test]
fn aliased_radd_is_rejected_at_load_time() {
    let program = parse_program("RADD r1, r1\nHALT\n").unwrap();
    let mut machine = Machine::new();
    let err = machine.load_program(program).unwrap_err();
    assert_eq!(
        err,
        MachineError::InvalidProgram(ProgramError::AliasedOperands { op: "RADD", rd: 1 })
    );
}

#[test]
fn step_errors_surface_their_kind() {
    // walking off the end of the program
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![Instruction::Add {
            rd: 1,
            rs1: 0,
            src: Src::Imm(1),
        }]))
        .unwrap();
    machine.step().unwrap();
    assert_eq!(
        machine.step().unwrap_err(),
        MachineError::PcOutOfRange { pc: 1, len: 1 }
    );

    // a taken branch to a label nobody declared
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![Instruction::Beq {
            rs1: 0,
            rs2: 0,
            label: "nowhere".into(),
        }]))
        .unwrap();
    assert_eq!(
        machine.step().unwrap_err(),
        MachineError::UnknownLabel { label: "nowhere".into() }
    );

    // run propagates instead of recovering
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![Instruction::Add {
            rd: 1,
            rs1: 0,
            src: Src::Imm(1),
        }]))
        .unwrap();
    assert!(machine.run(None).is_err());
}

#[test]
fn load_program_resets_the_run_but_not_the_data() {
    let mut machine = Machine::new();
    machine
        .load_program(Program::from(vec![
            Instruction::RAdd { rd: 1, rs1: 2 },
            Instruction::Halt,
        ]))
        .unwrap();
    machine.set_register(1, 1);
    machine.set_register(2, 2);
    machine.memory_mut().store_word(0x80, 17);
    machine.run(None).unwrap();
    assert!(machine.halted());
    assert!(!machine.exec_log().is_empty());

    machine
        .load_program(Program::from(vec![Instruction::Halt]))
        .unwrap();
    assert_eq!(machine.pc(), 0);
    assert!(!machine.halted());
    assert!(machine.exec_log().is_empty());
    assert_eq!(machine.metrics().total(), 0);
    // registers and memory survive for the caller to preset
    assert_eq!(machine.register(1), 3);
    assert_eq!(machine.memory().load_word(0x80), 17);
}
