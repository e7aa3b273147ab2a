use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::process;

use skeem::{Config, Interpreter, ReadStatus, Reader, SkeemError};

fn main() {
    skeem::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::from_env();
    let mut file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--gc-threshold" => {
                match args.get(i + 1).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) => config = config.with_gc_threshold(n),
                    None => {
                        eprintln!("--gc-threshold requires a positive integer");
                        process::exit(1);
                    }
                }
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: skeem [OPTIONS] [FILE]");
                println!();
                println!("Options:");
                println!(
                    "  --gc-threshold <n>  Live objects before the first collection (default {})",
                    skeem::config::DEFAULT_GC_THRESHOLD
                );
                println!("  --help, -h          Show this help message");
                println!();
                println!("Environment variables:");
                println!("  SKEEM_GC_THRESHOLD      Same as --gc-threshold");
                println!("  SKEEM_MAX_ALIAS_DEPTH   Symbol alias hops before a cyclic binding error");
                println!("  RUST_LOG                Enable tracing, e.g. RUST_LOG=skeem=debug");
                process::exit(0);
            }
            other if file.is_none() && !other.starts_with('-') => {
                file = Some(other.to_string());
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'skeem --help' for usage information.");
                process::exit(1);
            }
        }
    }

    let mut interp = Interpreter::with_config(config);

    if let Some(path) = file {
        let input = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading {}: {}", path, e);
                process::exit(1);
            }
        };
        run_batch(&mut interp, &input);
        return;
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        println!("Skeem {}", env!("CARGO_PKG_VERSION"));
        println!("Type (exit) or end input to quit.\n");
        run_interactive(&mut interp);
    } else {
        let mut input = String::new();
        if let Err(e) = stdin.lock().read_to_string(&mut input) {
            eprintln!("Read error: {}", e);
            process::exit(1);
        }
        run_batch(&mut interp, &input);
    }
}

/// Terminate on `exit`, otherwise report the error and carry on.
fn report(err: &SkeemError) {
    if let Some(status) = err.exit_status() {
        process::exit(status);
    }
    eprintln!("Error: {}", err);
}

/// Non-interactive: evaluate every form in order; the first error is fatal.
fn run_batch(interp: &mut Interpreter, input: &str) {
    let outcome = interp.eval_str(input);
    let _ = interp.output().flush();
    if let Err(e) = outcome {
        report(&e);
        process::exit(1);
    }
}

/// Interactive REPL: feed lines to the reader until a form is complete,
/// evaluate it, and keep going after errors.
fn run_interactive(interp: &mut Interpreter) {
    let stdin = io::stdin();
    let mut reader = Reader::new();

    loop {
        if reader.is_pending() {
            print!("... ");
        } else {
            print!("skeem> ");
        }
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }

        if let Err(e) = reader.push_line(&line) {
            report(&e);
            continue;
        }

        loop {
            match reader.read_form(interp) {
                Ok(ReadStatus::Complete(form)) => match interp.eval_toplevel(form) {
                    Ok(val) => println!("=> {}", interp.print(val)),
                    Err(e) => {
                        // Drop the rest of the line; recovery is at the next prompt.
                        report(&e);
                        reader.reset();
                        break;
                    }
                },
                Ok(ReadStatus::Incomplete) => break,
                Err(e) => {
                    report(&e);
                    break;
                }
            }
        }
    }
    println!();
}
