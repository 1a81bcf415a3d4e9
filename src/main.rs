// Lilt, an interpreter for a small Scheme-like Lisp dialect.
// Copyright (C) 2026 the Lilt contributors

// Lilt is licensed under the terms of the MIT License. See the top
// level LICENSE file for the license text.

// <>

// src/main.rs

// Command line driver. Collects file paths and literal source strings
// from the arguments, feeds each buffer through the reader, and pumps
// the resulting top-level forms through the evaluator, printing every
// result. Failures are reported per form and processing moves on.

// <>

use lilt::core::list_iter;
use lilt::{context, eval, Environment};

use std::panic::{self, AssertUnwindSafe};
use std::process;

enum Input {
    File(String),
    Literal(String),
}

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()
        .unwrap();

    let mut parse_only = false;
    let mut exec_next = false;
    let mut no_more_flags = false;
    let mut inputs: Vec<Input> = Vec::new();

    for arg in std::env::args().skip(1) {
        if !no_more_flags {
            match arg.as_str() {
                "--" => {
                    no_more_flags = true;
                    continue;
                }
                "--parse-only" => {
                    parse_only = true;
                    continue;
                }
                "--exec" | "-e" => {
                    exec_next = true;
                    continue;
                }
                _ => {}
            }
        }

        if exec_next {
            inputs.push(Input::Literal(arg));
            exec_next = false;
        } else {
            inputs.push(Input::File(arg));
        }
    }

    if inputs.is_empty() {
        eprintln!("Usage: lilt [--parse-only] [--exec STRING | FILE]... [-- FILE...]");
        eprintln!("Supply an input file or source string to run it.");
        return;
    }

    // panics are reported per form as internal errors; the default
    // hook would print its own report first
    panic::set_hook(Box::new(|_| {}));

    let mut env = Environment::new();

    for input in inputs {
        let source = match input {
            Input::Literal(code) => code,
            Input::File(path) => match std::fs::read_to_string(&path) {
                Ok(code) if code.is_empty() => {
                    eprintln!("Input file '{}' is empty.", path);
                    process::exit(-1);
                }
                Ok(code) => code,
                Err(_) => {
                    eprintln!("Unable to open input file '{}'.", path);
                    process::exit(-1);
                }
            },
        };

        run_source(&mut env, &source, parse_only);
    }
}

/// Reads one source buffer and processes its top-level forms in order
fn run_source(env: &mut Environment, source: &str, parse_only: bool) {
    let forms = match env.parse_source(source) {
        Ok(forms) => forms,
        Err(err) => {
            eprintln!("Parsing exception: {}", err);
            return;
        }
    };

    for form in list_iter(forms) {
        if parse_only {
            println!("{}", context(&env.symtab, form));
            continue;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| eval::eval(env, form)));

        match outcome {
            Ok(Ok(result)) => println!("{}", context(&env.symtab, result)),
            Ok(Err(err)) => eprintln!("Eval exception: {}", err),
            Err(payload) => {
                eprintln!("Internal error: {}", panic_message(&payload));
                env.reset_scope();
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unidentified failure"
    }
}
