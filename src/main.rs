// vesper - A small stack-based bytecode virtual machine
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::process::ExitCode;

use clap::Parser;

use vesper_vm::{Interner, Interpretation, Vm, VmOptions, register_natives};

mod programs;

use programs::PROGRAMS;

#[derive(Parser)]
#[command(name = "vesper")]
#[command(about = "A small stack-based bytecode virtual machine", long_about = None)]
struct Cli {
    /// Example program to run (1-based; omit to list them)
    #[arg(short = 'x', long = "example", value_name = "N")]
    example: Option<usize>,

    /// Sleep one second between instructions
    #[arg(short, long)]
    slow: bool,

    /// Print the operand stack and each instruction while running
    #[arg(short, long)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let number = match cli.example {
        Some(number) => number,
        None => {
            list_programs();
            return ExitCode::SUCCESS;
        }
    };

    let program = match number.checked_sub(1).and_then(|i| PROGRAMS.get(i)) {
        Some(program) => program,
        None => {
            eprintln!("No example {}; available programs:", number);
            list_programs();
            return ExitCode::FAILURE;
        }
    };

    let mut strings = Interner::new();
    let chunk = program.assemble(&mut strings);

    if cli.trace {
        chunk.disassemble(program.name);
    }

    let options = VmOptions {
        trace: cli.trace,
        slow: cli.slow,
    };
    let mut vm = Vm::with_options(chunk, strings, options);
    register_natives(&mut vm);

    match vm.interpret() {
        Interpretation::Ok => ExitCode::SUCCESS,
        Interpretation::CompileError | Interpretation::RuntimeError => ExitCode::FAILURE,
    }
}

fn list_programs() {
    println!("Examples:");
    for (i, program) in PROGRAMS.iter().enumerate() {
        println!("  {:>2}  {:<12} {}", i + 1, program.name, program.about);
    }
}
