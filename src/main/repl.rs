use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use chirp::ast::Definition;
use chirp::changes::{append_record, replay, Record};
use chirp::interpreter::Interpreter;
use chirp::parser::{parse_command, parse_definition};
use chirp::value::{chirp_display, chirp_repr, Value};

use crate::shared::{read_file, report_error, report_skipped};

pub(super) fn cmd_repl(load: Option<&str>, log: Option<&str>) {
    let mut interp = Interpreter::new();

    if let Some(path) = load {
        if !load_log(&interp, path) {
            return;
        }
    }

    println!("Chirp workspace — :help for commands, :quit to exit");

    let stdin = io::stdin();
    // Lines of an in-progress `def`, terminated by a blank line.
    let mut def_buffer: Vec<String> = Vec::new();

    loop {
        let prompt = if def_buffer.is_empty() {
            "chirp> "
        } else {
            "...    "
        };
        print!("{}", prompt);
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            } // EOF (Ctrl+D)
            Ok(_) => {}
            Err(_) => break,
        }
        let line = line
            .trim_end_matches('\n')
            .trim_end_matches('\r')
            .to_string();

        if !def_buffer.is_empty() {
            if line.trim().is_empty() {
                let source = def_buffer.join("\n");
                def_buffer.clear();
                run_definition(&interp, &source, log);
            } else {
                def_buffer.push(line);
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Meta commands
        if trimmed.starts_with(':') {
            match trimmed {
                ":quit" | ":q" => {
                    println!("Bye.");
                    break;
                }
                ":help" | ":h" => {
                    repl_help();
                }
                ":clear" | ":c" => {
                    interp = Interpreter::new();
                    println!("Cleared.");
                }
                ":env" => {
                    repl_env(&interp);
                }
                ":classes" => {
                    repl_classes(&interp);
                }
                cmd => {
                    println!("Unknown command: {}. Type :help.", cmd);
                }
            }
            continue;
        }

        // `def ...` starts a definition. Layouts are one line and apply
        // immediately; a method buffers until a blank line.
        if let Some(rest) = trimmed.strip_prefix("def ") {
            if let Ok(Definition::Layout { .. }) = parse_definition(rest) {
                run_definition(&interp, rest, log);
            } else {
                def_buffer.push(rest.to_string());
            }
            continue;
        }

        run_command(&interp, &line, log);
    }
}

fn run_definition(interp: &Interpreter, source: &str, log: Option<&str>) {
    match parse_definition(source) {
        Ok(Definition::Layout { class, slots }) => {
            interp.make_class(&class, slots);
            println!("{}", format!("defined class: {}", class).cyan());
            log_record(log, &Record::define(source));
        }
        Ok(Definition::Method {
            class,
            selector,
            code,
        }) => {
            interp.add_method(&class, &selector, code);
            println!("{}", format!("defined: {}>>{}", class, selector).cyan());
            log_record(log, &Record::define(source));
        }
        Err(e) => report_error(&e.to_string()),
    }
}

fn run_command(interp: &Interpreter, source: &str, log: Option<&str>) {
    let command = match parse_command(source) {
        Ok(command) => command,
        Err(e) => {
            report_error(&e.to_string());
            return;
        }
    };
    match interp.run_command(&command) {
        Ok(value) => {
            if let Some(display) = chirp_display(&value) {
                println!("{}", display);
            }
            log_record(log, &Record::command(source));
        }
        Err(e) => report_error(&e.to_string()),
    }
}

fn log_record(log: Option<&str>, record: &Record) {
    if let Some(path) = log {
        if let Err(e) = append_record(Path::new(path), record) {
            report_error(&format!("cannot write log '{}': {}", path, e));
        }
    }
}

/// Replay a log before the first prompt. Bad records are skipped, same
/// as `chirp run`; only an unreadable file aborts.
fn load_log(interp: &Interpreter, path: &str) -> bool {
    let source = match read_file(path) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e);
            return false;
        }
    };
    for (index, result) in replay(interp, &source).iter().enumerate() {
        if let Err(e) = result {
            report_skipped(index + 1, &e.to_string());
        }
    }
    println!("Loaded {}.", path);
    true
}

fn repl_help() {
    println!("Commands:");
    println!("  :help / :h   Show this help");
    println!("  :quit / :q   Exit the workspace");
    println!("  :clear / :c  Discard all definitions and restart");
    println!("  :env         Show workspace bindings");
    println!("  :classes     Show classes with slots and selectors");
    println!();
    println!("def Name |slot1 slot2|     define a class layout");
    println!("def Name selector ...      define a method (finish with a blank line)");
    println!("anything else              evaluate as an expression");
}

fn repl_env(interp: &Interpreter) {
    let mut found = false;
    for (name, value) in interp.globals.bindings() {
        if let Value::Class(_) = value {
            continue;
        }
        println!("  {} = {}", name, chirp_repr(&value));
        found = true;
    }
    if !found {
        println!("  (empty)");
    }
}

fn repl_classes(interp: &Interpreter) {
    for (name, value) in interp.globals.bindings() {
        let Value::Class(class) = value else { continue };
        let class = class.borrow();
        let mut selectors: Vec<&String> = class.methods.keys().collect();
        selectors.sort();
        let selectors: Vec<&str> = selectors.iter().map(|s| s.as_str()).collect();
        if class.slots.is_empty() {
            println!("  {}: {}", name, selectors.join(" "));
        } else {
            println!(
                "  {} |{}|: {}",
                name,
                class.slots.join(" "),
                selectors.join(" ")
            );
        }
    }
}
