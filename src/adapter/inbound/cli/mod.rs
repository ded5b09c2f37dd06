//! Command-line front end for the database manager.

pub mod command;
pub mod manage;
pub mod output;

use std::process::ExitCode;

use clap::CommandFactory;
use tracing::debug;

use self::command::{Cli, ColorChoice, Commands};
use self::output::OutputConfig;
use crate::adapter::outbound::database::{Backend, DatabaseUrl};
use crate::application::{Database, DatabaseManager};
use crate::domain::Registry;
use crate::error::{Error, Result};
use crate::infrastructure::config::Config;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ormkit.toml";

/// Run a parsed command line.
///
/// `registry` supplies the managed tables; when `None` they come from the
/// configuration file. Errors are printed and mapped to a failing exit code.
pub fn run(cli: Cli, registry: Option<Registry>) -> ExitCode {
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }

    let Some(command) = cli.command.clone() else {
        if let Err(e) = Cli::command().print_help() {
            output::error(&e.to_string());
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    match execute(&cli, &command, registry) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&command, &e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli, command: &Commands, registry: Option<Registry>) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    config.logging.clone().with_verbosity(cli.verbose).init();

    let url = DatabaseUrl::parse(&config.database_url(cli.db_url.as_deref()))?;
    if let Some(operation) = command.sqlite_operation() {
        if url.backend() != Backend::Sqlite {
            return Err(Error::SqliteOnly { operation });
        }
    }

    let registry = match registry {
        Some(registry) => registry,
        None => config.registry()?,
    };
    debug!(url = %url, tables = registry.len(), "Opening database");

    let database = Database::open(url, registry, config.database.pool_size)?;
    database.create_all()?;
    let mut manager = DatabaseManager::from_database(database);

    match command {
        Commands::Create => manage::create(&manager),
        Commands::Drop => manage::drop(&manager, cli.yes),
        Commands::Reset => manage::reset(&manager, cli.yes),
        Commands::Info => manage::info(&manager),
        Commands::Backup { path } => manage::backup(&manager, path.as_deref()),
        Commands::Restore { path } => manage::restore(&mut manager, path, cli.yes),
        Commands::Vacuum => manage::vacuum(&manager),
    }
}

fn report(command: &Commands, error: &Error) {
    if matches!(error, Error::SqliteOnly { .. }) {
        output::error(&error.to_string());
        return;
    }
    output::error(&format!("{}: {error}", failure_context(command)));
}

fn failure_context(command: &Commands) -> &'static str {
    match command {
        Commands::Create => "Error creating database",
        Commands::Drop => "Error dropping database",
        Commands::Reset => "Error resetting database",
        Commands::Info => "Error getting database info",
        Commands::Backup { .. } => "Error backing up database",
        Commands::Restore { .. } => "Error restoring database",
        Commands::Vacuum => "Error vacuuming database",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn sqlite_only_commands_fail_before_connecting() {
        let cli = Cli::parse_from([
            "ormkit",
            "vacuum",
            "--db-url",
            "postgres://user:pw@localhost:1/none",
        ]);
        let command = cli.command.clone().unwrap();
        let err = execute(&cli, &command, Some(Registry::new())).unwrap_err();
        assert!(matches!(err, Error::SqliteOnly { operation: "Vacuum" }));
    }

    #[test]
    fn info_runs_against_memory_database() {
        let cli = Cli::parse_from(["ormkit", "info", "--db-url", "sqlite://:memory:", "-q"]);
        let command = cli.command.clone().unwrap();
        execute(&cli, &command, Some(Registry::new())).unwrap();
    }

    #[test]
    fn failure_context_names_operation() {
        assert_eq!(
            failure_context(&Commands::Backup { path: None }),
            "Error backing up database"
        );
    }
}
