use anyhow::Result;
use clap::Parser;

use uconf_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = logging::Logger::new();

    match args.command {
        cli::Command::Build(opts) => commands::build::run(&args.global, &opts, &log),
        cli::Command::Back(opts) => commands::back::run(&args.global, &opts, &log),
        cli::Command::Diff(opts) => commands::diff::run(&args.global, &opts, &log),
        cli::Command::Backdiff(opts) => commands::diff::run_back(&args.global, &opts, &log),
        cli::Command::Rule(opts) => commands::rule::run(&args.global, &opts, &log),
        cli::Command::Version => Ok(commands::version::run()?),
    }
}
