use clap::{Parser as ClapParser, Subcommand};

#[derive(ClapParser)]
#[command(name = "chirp", about = "The Chirp language interpreter")]
pub(super) struct Cli {
    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Subcommand)]
pub(super) enum Commands {
    /// Replay a changeset log
    Run {
        file: String,
        /// Abort on the first bad record instead of skipping it
        #[arg(long)]
        strict: bool,
    },
    /// Evaluate one command against a fresh workspace
    Eval { expr: String },
    /// Interactive workspace
    Repl {
        /// Replay this changeset log before the first prompt
        #[arg(long)]
        load: Option<String>,
        /// Append successful definitions and commands to this log
        #[arg(long)]
        log: Option<String>,
    },
}
