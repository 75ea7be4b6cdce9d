use std::error::Error;

use revsim::{
    parse_program, HistoryAnalyzer, Instruction, Machine, MemoryController, Program,
    RegionType, Src, TimeTravelDebugger,
};

/// Mixed reversible/irreversible counted loop: sums 10..=1 into r2
/// with a pair of RXORs that cancel each iteration.
pub const LOOP_SOURCE: &str = "\
; mixed reversible and irreversible loop

; r1 = loop counter
; r2 = accumulator
; r3 = decrement value (1)

ADD r1, r0, 10      ; r1 = 10
ADD r2, r0, 0       ; r2 = 0
ADD r3, r0, 1       ; r3 = 1

loop_start:
BEQ r1, r0, done    ; if r1 == 0, exit loop

; reversible work
RADD r2, r1         ; r2 = r2 + r1
RXOR r2, r1         ; reversible mix
RXOR r2, r1         ; unmix

; irreversible decrement
SUB r1, r1, r3      ; r1 = r1 - 1

; unconditional jump via BEQ r0, r0, label
BEQ r0, r0, loop_start

done:
HALT
";

/// Three reversible increments of r1 by r2.
pub fn increment_program() -> Program {
    Program::from(vec![
        Instruction::RAdd { rd: 1, rs1: 2 },
        Instruction::RAdd { rd: 1, rs1: 2 },
        Instruction::RAdd { rd: 1, rs1: 2 },
        Instruction::Halt,
    ])
}

/// A small reversible program with an intentional bug: r1 should end
/// at 18 but a stray RXOR corrupts the accumulation.
pub fn buggy_program() -> Program {
    Program::from(vec![
        Instruction::Add { rd: 1, rs1: 0, src: Src::Imm(10) },
        Instruction::Add { rd: 2, rs1: 0, src: Src::Imm(5) },
        Instruction::Add { rd: 3, rs1: 0, src: Src::Imm(3) },
        Instruction::RAdd { rd: 1, rs1: 2 },
        Instruction::RXor { rd: 1, rs1: 3 },
        Instruction::RAdd { rd: 1, rs1: 3 },
        Instruction::Halt,
    ])
}

/// The reversible increment demo: run forward, then undo the three
/// increments and show the original state coming back.
pub fn run_example() -> Result<(), Box<dyn Error>> {
    let mut machine = Machine::new();
    machine.load_program(increment_program())?;
    machine.set_register(1, 5);
    machine.set_register(2, 1);

    println!("Initial state:");
    println!("r1 = {}, r2 = {}", machine.register(1), machine.register(2));

    machine.run(None)?;

    println!();
    println!("After forward execution:");
    println!("r1 = {}, r2 = {}", machine.register(1), machine.register(2));
    println!("Energy used: {:.2}", machine.energy().total_energy());
    println!("Metrics: {}", machine.metrics().summary());

    for _ in 0..3 {
        machine.reverse_step()?;
    }

    println!();
    println!("After reverse execution:");
    println!("r1 = {}, r2 = {}", machine.register(1), machine.register(2));
    println!("Energy still: {:.2}", machine.energy().total_energy());
    Ok(())
}

/// The mixed-loop demo: run to completion, then drain the execution
/// log backward.
pub fn run_loop() -> Result<(), Box<dyn Error>> {
    let mut machine = Machine::new();
    machine.load_program(parse_program(LOOP_SOURCE)?)?;

    println!("Running reversible loop...");
    println!();

    let steps = machine.run(Some(1000))?;

    println!("Steps executed: {}", steps);
    println!(
        "Final registers (r1, r2, r3): {}, {}, {}",
        machine.register(1),
        machine.register(2),
        machine.register(3)
    );
    println!("Total energy: {:.2}", machine.energy().total_energy());
    println!("Metrics: {}", machine.metrics().summary());
    println!("Execution log depth: {}", machine.exec_log().len());

    println!();
    println!("Reversing reversible steps...");

    while machine.reverse_step()? {}

    println!("Registers after full reverse of reversible ops:");
    println!(
        "(r1, r2, r3): {}, {}, {}",
        machine.register(1),
        machine.register(2),
        machine.register(3)
    );
    Ok(())
}

/// History-buffer sizing comparison across the built-in programs,
/// plus a hot/cold memory controller report.
pub fn analyze() -> Result<(), Box<dyn Error>> {
    let mut analyzer = HistoryAnalyzer::new();

    let programs: Vec<(&str, Program)> = vec![
        ("linear_increment", increment_program()),
        ("mixed_loop", parse_program(LOOP_SOURCE)?),
        ("buggy_reversible", buggy_program()),
    ];

    for (name, program) in programs {
        let mut machine = Machine::new();
        machine.load_program(program)?;
        if name == "linear_increment" {
            machine.set_register(1, 5);
            machine.set_register(2, 1);
        }

        let mut debugger = TimeTravelDebugger::new(&mut machine);
        debugger.run_until_violation(10_000)?;
        analyzer.record_run(name, debugger.history(), debugger.machine().metrics());
    }

    println!("{}", analyzer.compare());
    println!();

    // the same store traffic on both paths, to show the cycle
    // overhead of reversibility
    let mut controller = MemoryController::new();
    controller
        .memory_mut()
        .configure_region(0x1000, 0x2000, RegionType::Reversible);
    let mut reg = 0xdead_beef;
    for offset in 0..16 {
        controller.hot_store(offset, offset);
        let (old, _) = controller.cold_exchange(0x1000 + offset, reg);
        reg = old;
    }
    for offset in 0..16 {
        controller.hot_load(offset);
    }

    println!("{}", controller.format_report());
    Ok(())
}
