use std::io;
use std::io::{BufRead, Write};

use anyhow::Error;

use hustle_interpreter::debug::dump::{backtrace, dump_stack};
use hustle_interpreter::debug::{DebugCommand, StepMode};
use hustle_interpreter::reader::{read_source, ReadOutcome};
use hustle_interpreter::{Vm, VmError};

/// Launches an interactive Read-Eval-Print-Loop on the given VM.
pub fn interactive(vm: &mut Vm, verbose: bool) -> Result<(), Error> {
    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let stdout = io::stdout();

    let mut counter = 0;
    let mut line = String::new();

    loop {
        {
            let mut stdout = stdout.lock();
            write!(&mut stdout, "({}) Hustle | ", counter)?;
            stdout.flush()?;
        }
        line.clear();
        stdin.read_line(&mut line)?;
        if line.is_empty() {
            println!("exit");
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match read_source(vm, &line) {
            Ok(ReadOutcome::Done) => {}
            Ok(ReadOutcome::ExitBootstrap) | Err(VmError::Halt) => break,
            Err(error) => {
                println!("ERROR: {}", error);
                vm.stack.clear();
            }
        }
        if verbose {
            println!("{}", dump_stack(vm, false));
        }

        counter += 1;
    }

    Ok(())
}

/// Breaks before the first instruction and lets the user drive execution from stdin.
pub fn install_break_handler(vm: &mut Vm) {
    vm.set_debug_listener(Some(Box::new(break_handler)));
    vm.set_step_mode(StepMode::Step);
}

fn break_handler(vm: &mut Vm) -> DebugCommand {
    let stdin = io::stdin();
    let mut line = String::new();

    if let Some(position) = backtrace(vm).lines().nth(1) {
        println!("break at {}", position);
    }

    loop {
        print!("(debug) ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return DebugCommand::Continue,
            Ok(_) => {}
        }

        match line.trim() {
            "step" | "s" => return DebugCommand::Step,
            "over" | "o" => return DebugCommand::Over,
            "continue" | "c" => return DebugCommand::Continue,
            "stack" => println!("{}", dump_stack(vm, true)),
            "backtrace" => println!("{}", backtrace(vm)),
            "" => {}
            other => println!("unknown command `{}` (step, over, continue, stack, backtrace)", other),
        }
    }
}
