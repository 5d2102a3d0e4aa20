use std::process;

use chirp::changes::{apply_record, parse_log};
use chirp::interpreter::Interpreter;
use chirp::parser::parse_command;
use chirp::value::chirp_display;

use crate::shared::{read_file, report_error, report_skipped};

/// Replay a changeset log against a fresh workspace, printing each
/// command's non-nil answer. Bad records are reported and skipped;
/// `--strict` turns the first one into a failure.
pub(super) fn cmd_run(file: &str, strict: bool) {
    let source = match read_file(file) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e);
            process::exit(1);
        }
    };

    let interp = Interpreter::new();
    for (index, record) in parse_log(&source).iter().enumerate() {
        match apply_record(&interp, record) {
            Ok(Some(value)) => {
                if let Some(display) = chirp_display(&value) {
                    println!("{}", display);
                }
            }
            Ok(None) => {}
            Err(e) => {
                if strict {
                    report_error(&format!("record {}: {}", index + 1, e));
                    process::exit(1);
                }
                report_skipped(index + 1, &e.to_string());
            }
        }
    }
}

/// Run one command and print its answer (nil stays silent).
pub(super) fn cmd_eval(expr: &str) {
    let command = match parse_command(expr) {
        Ok(command) => command,
        Err(e) => {
            report_error(&e.to_string());
            process::exit(1);
        }
    };

    let interp = Interpreter::new();
    match interp.run_command(&command) {
        Ok(value) => {
            if let Some(display) = chirp_display(&value) {
                println!("{}", display);
            }
        }
        Err(e) => {
            report_error(&e.to_string());
            process::exit(1);
        }
    }
}
