/// The changeset log: an append-only text file of definition and command
/// records. Replaying the log in order rebuilds a workspace; the REPL
/// appends to it so a session is reproducible with `chirp run`.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::ast::Definition;
use crate::interpreter::Interpreter;
use crate::parser::{parse_command, parse_definition, ParseError};
use crate::value::{RuntimeError, Value};

/// A record either defines (layout or method) or runs a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Define,
    Command,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub text: String,
}

impl Record {
    pub fn define(text: &str) -> Record {
        Record {
            kind: RecordKind::Define,
            text: text.to_string(),
        }
    }

    pub fn command(text: &str) -> Record {
        Record {
            kind: RecordKind::Command,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChangeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

const DEFINE_MARKER: &str = ":def";
const COMMAND_MARKER: &str = ":run";

/// Split a log into records. A record is a marker line (`:def` or
/// `:run`) followed by its text up to the next marker; text outside any
/// record is ignored.
pub fn parse_log(source: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Option<(RecordKind, Vec<&str>)> = None;

    for line in source.lines() {
        let kind = match line.trim_end() {
            DEFINE_MARKER => Some(RecordKind::Define),
            COMMAND_MARKER => Some(RecordKind::Command),
            _ => None,
        };
        match kind {
            Some(kind) => {
                flush(&mut records, current.take());
                current = Some((kind, Vec::new()));
            }
            None => {
                if let Some((_, lines)) = &mut current {
                    lines.push(line);
                }
            }
        }
    }
    flush(&mut records, current.take());
    records
}

fn flush(records: &mut Vec<Record>, current: Option<(RecordKind, Vec<&str>)>) {
    if let Some((kind, lines)) = current {
        let text = lines.join("\n").trim().to_string();
        if !text.is_empty() {
            records.push(Record { kind, text });
        }
    }
}

pub fn format_record(record: &Record) -> String {
    let marker = match record.kind {
        RecordKind::Define => DEFINE_MARKER,
        RecordKind::Command => COMMAND_MARKER,
    };
    format!("{}\n{}\n", marker, record.text.trim_end())
}

/// Append one record to a log file, creating it if needed.
pub fn append_record(path: &Path, record: &Record) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_record(record).as_bytes())
}

/// Apply one record to a live workspace. Commands answer their value;
/// definitions answer `None`.
pub fn apply_record(
    interp: &Interpreter,
    record: &Record,
) -> Result<Option<Value>, ChangeError> {
    match record.kind {
        RecordKind::Define => {
            match parse_definition(&record.text)? {
                Definition::Layout { class, slots } => {
                    interp.make_class(&class, slots);
                }
                Definition::Method {
                    class,
                    selector,
                    code,
                } => interp.add_method(&class, &selector, code),
            }
            Ok(None)
        }
        RecordKind::Command => {
            let command = parse_command(&record.text)?;
            Ok(Some(interp.run_command(&command)?))
        }
    }
}

/// Replay a whole log. One result per record, in order; a failed record
/// never stops the ones after it.
pub fn replay(interp: &Interpreter, source: &str) -> Vec<Result<Option<Value>, ChangeError>> {
    parse_log(source)
        .iter()
        .map(|record| apply_record(interp, record))
        .collect()
}
