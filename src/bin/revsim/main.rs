#[macro_use]
extern crate colorify;

mod command;
mod demos;
mod display;

use std::env;
use std::error::Error;
use std::fs;
use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use revsim::{parse_program, Machine, Reg, TimeTravelDebugger};

use crate::command::Command;

const HISTORY_FILE: &str = ".revsim_history";

fn usage() {
    println!("Usage: revsim <command>");
    println!();
    println!("Commands:");
    println!("  example                    run the reversible increment demo");
    println!("  loop                       run the mixed reversible/irreversible loop demo");
    println!("  run <path> [--max-steps N] parse and run an assembly file");
    println!("  analyze                    compare history buffer cost across demo programs");
    println!("  debug <path>               interactive time-travel debugging session");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(error) = dispatch(&args) {
        printlnc!(red: "{}", error);
        process::exit(1);
    }
}

fn dispatch(args: &[String]) -> Result<(), Box<dyn Error>> {
    match args.first().map(String::as_str) {
        Some("example") => demos::run_example(),
        Some("loop") => demos::run_loop(),
        Some("analyze") => demos::analyze(),
        Some("run") => {
            let (path, max_steps) = run_args(&args[1..])?;
            run_file(&path, max_steps)
        }
        Some("debug") => match args.get(1) {
            Some(path) => debug_session(path),
            None => Err("debug expects a path to an assembly file".into()),
        },
        Some(other) => {
            usage();
            Err(format!("unknown command `{}`", other).into())
        }
        None => {
            usage();
            Err("expected a command".into())
        }
    }
}

fn run_args(args: &[String]) -> Result<(String, Option<u64>), Box<dyn Error>> {
    let mut path = None;
    let mut max_steps = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--max-steps" {
            let value = iter
                .next()
                .ok_or("--max-steps expects a number")?;
            max_steps = Some(value.parse()?);
        } else if path.is_none() {
            path = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument `{}`", arg).into());
        }
    }

    match path {
        Some(path) => Ok((path, max_steps)),
        None => Err("run expects a path to an assembly file".into()),
    }
}

fn run_file(path: &str, max_steps: Option<u64>) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    let mut machine = Machine::new();
    machine.load_program(parse_program(&source)?)?;

    let steps = machine.run(max_steps)?;

    println!("Executed {} steps.", steps);
    println!(
        "Registers r1..r3: {} {} {}",
        machine.register(1),
        machine.register(2),
        machine.register(3)
    );
    println!("Energy: {:.2}", machine.energy().total_energy());
    println!("Metrics: {}", machine.metrics().summary());
    Ok(())
}

fn debug_session(path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    let mut machine = Machine::new();
    machine.load_program(parse_program(&source)?)?;
    let mut watches: Vec<(Reg, u32)> = Vec::new();

    display::display_properties(&machine);

    let mut rustyline = DefaultEditor::new()?;
    if rustyline.load_history(HISTORY_FILE).is_err() {
        printlnc!(yellow: "No previous history.");
    }

    let mut last_command = None;

    loop {
        let prompt = format!(colorify!(dark_grey: "({}) "), "revdb");
        let readline = rustyline.readline(&prompt);
        match readline {
            Ok(line) => {
                let _ = rustyline.add_history_entry(line.as_str());

                let command = match (line.parse(), last_command.clone()) {
                    (Ok(Command::Repeat), Some(c)) => Ok(c),
                    (Ok(Command::Repeat), None) => Err("No last command.".into()),
                    (Ok(c), _) => Ok(c),
                    (Err(e), _) => Err(e),
                };

                match command {
                    Ok(command) => {
                        last_command = Some(command.clone());
                        if execute(command, &mut machine, &mut watches)? {
                            break;
                        }
                    }
                    Err(ref e) => printlnc!(red: "{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    let _ = rustyline.save_history(HISTORY_FILE);
    Ok(())
}

/// Execute one debugger command; returns true when the session is
/// over. Engine errors propagate and end the session.
fn execute(
    command: Command,
    machine: &mut Machine,
    watches: &mut Vec<(Reg, u32)>,
) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Load(path) => match load_into(machine, &path) {
            Ok(()) => println!("Loaded {}.", path),
            // a bad path or bad source should not end the session
            Err(e) => printlnc!(red: "{}", e),
        },
        Command::Step(count) => {
            let mut executed = 0;
            for _ in 0..count {
                if machine.halted() {
                    printlnc!(yellow: "Machine is halted.");
                    break;
                }
                machine.step()?;
                executed += 1;
            }
            println!("Executed {} steps.", executed);
            display::display_registers(machine);
        }
        Command::Back(count) => {
            let mut undone = 0;
            for _ in 0..count {
                if !machine.reverse_step()? {
                    printlnc!(yellow: "Execution log is empty.");
                    break;
                }
                undone += 1;
            }
            println!("Undid {} steps.", undone);
            display::display_registers(machine);
        }
        Command::Run(cap) => {
            let steps = machine.run(cap)?;
            println!("Executed {} steps.", steps);
            display::display_registers(machine);
        }
        Command::Regs => display::display_registers(machine),
        Command::Log => display::display_log(machine, 10),
        Command::Watch { register, expected } => {
            watches.push((register, expected));
            println!("Watching for r{} != {}.", register, expected);
        }
        Command::Diagnose => {
            let mut debugger = TimeTravelDebugger::new(machine);
            for &(register, expected) in watches.iter() {
                debugger.watch_equals(register, expected);
            }
            let report = debugger.run_and_diagnose(10_000)?;
            println!("{}", report);
        }
        Command::Info => {
            display::display_properties(machine);
            display::display_program(machine);
        }
        Command::Repeat => unreachable!(),
        Command::Exit => return Ok(true),
    }
    Ok(false)
}

fn load_into(machine: &mut Machine, path: &str) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    machine.load_program(parse_program(&source)?)?;
    Ok(())
}
