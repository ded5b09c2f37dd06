use std::process::ExitCode;

use clap::Parser;
use ormkit::cli::{self, command::Cli};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    cli::run(cli, None)
}
