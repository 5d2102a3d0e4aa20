use std::fs;

use colored::Colorize;

pub(super) fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Cannot open file '{}': {}", path, e))
}

pub(super) fn report_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}

pub(super) fn report_skipped(index: usize, message: &str) {
    eprintln!(
        "{} record {} skipped: {}",
        "Warning:".yellow(),
        index,
        message
    );
}
