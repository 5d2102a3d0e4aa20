use clap::Parser as ClapParser;

mod cli;
mod commands;
mod repl;
mod shared;

fn main() {
    let cli = cli::Cli::parse();

    match &cli.command {
        cli::Commands::Run { file, strict } => {
            commands::cmd_run(file, *strict);
        }
        cli::Commands::Eval { expr } => {
            commands::cmd_eval(expr);
        }
        cli::Commands::Repl { load, log } => {
            repl::cmd_repl(load.as_deref(), log.as_deref());
        }
    }
}
