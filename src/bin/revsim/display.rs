use std::collections::HashMap;

use revsim::machine::LogPayload;
use revsim::Machine;

pub fn display_properties(machine: &Machine) {
    println!(
        "Machine has {} registers and a program of {} instructions.",
        format!(colorify!(yellow: "{}"), machine.registers().len()),
        format!(colorify!(yellow: "{}"), machine.program().len())
    );
}

pub fn display_registers(machine: &Machine) {
    println!(
        "pc: {}, halted: {}, log depth: {}, energy: {:.2}",
        machine.pc(),
        machine.halted(),
        machine.exec_log().len(),
        machine.energy().total_energy()
    );
    for (row, chunk) in machine.registers().chunks(4).enumerate() {
        let mut line = String::new();
        for (col, value) in chunk.iter().enumerate() {
            let name = format!(colorify!(blue: "r{:02}"), row * 4 + col);
            line.push_str(&format!("{} {:>10}  ", name, value));
        }
        println!("{}", line);
    }
}

pub fn display_program(machine: &Machine) {
    let program = machine.program();
    if program.is_empty() {
        printlnc!(yellow: "No program loaded.");
        return;
    }

    let mut labels_at: HashMap<usize, Vec<&str>> = HashMap::new();
    for (name, &pc) in program.labels() {
        labels_at.entry(pc).or_insert_with(Vec::new).push(name.as_str());
    }

    for (pc, instruction) in program.instructions().iter().enumerate() {
        if let Some(names) = labels_at.get(&pc) {
            for name in names {
                println!("{}", format!(colorify!(green: "{}:"), name));
            }
        }
        let marker = if pc == machine.pc() && !machine.halted() {
            format!(colorify!(red: "pc"))
        } else {
            "  ".to_string()
        };
        let addr = format!(colorify!(blue: "{:>#06x}"), pc);
        println!("{} {}  {}", marker, addr, instruction);
    }
}

pub fn display_log(machine: &Machine, limit: usize) {
    let log = machine.exec_log();
    if log.is_empty() {
        printlnc!(yellow: "Execution log is empty.");
        return;
    }

    let start = log.len().saturating_sub(limit);
    if start > 0 {
        println!("... {} earlier entries", start);
    }
    for (depth, entry) in log.iter().enumerate().skip(start) {
        let addr = format!(colorify!(blue: "{:>#06x}"), entry.pc);
        match entry.payload {
            LogPayload::Branch { taken, .. } => {
                println!("[{:>4}] {}  {}  (taken: {})", depth, addr, entry.instruction, taken)
            }
            LogPayload::None => {
                println!("[{:>4}] {}  {}", depth, addr, entry.instruction)
            }
        }
    }
}
