//! Handlers for the database management subcommands.

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm};
use serde_json::json;
use tabled::{Table, Tabled};

use super::output;
use crate::application::{DatabaseInfo, DatabaseManager, TableCount};
use crate::error::Result;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    rows: String,
}

/// Ask a yes/no question, defaulting to no.
///
/// Interactive terminals get a dialoguer prompt; otherwise one line is read
/// from stdin and only `y`/`yes` count as consent.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() {
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        return Ok(answer);
    }
    let mut stderr = std::io::stderr();
    write!(stderr, "{prompt} (y/N): ")?;
    stderr.flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn cancelled() {
    output::warning("Operation cancelled");
}

pub fn create(manager: &DatabaseManager) -> Result<()> {
    manager.create_database()?;
    output::success("Database created successfully!");
    Ok(())
}

pub fn drop(manager: &DatabaseManager, assume_yes: bool) -> Result<()> {
    if !confirm("Are you sure you want to drop all tables?", assume_yes)? {
        cancelled();
        return Ok(());
    }
    manager.drop_database()?;
    output::success("Database dropped successfully!");
    Ok(())
}

pub fn reset(manager: &DatabaseManager, assume_yes: bool) -> Result<()> {
    if !confirm("Are you sure you want to reset the entire database?", assume_yes)? {
        cancelled();
        return Ok(());
    }
    output::action("Resetting", "database");
    manager.reset_database()?;
    output::success("Database reset successfully!");
    Ok(())
}

pub fn info(manager: &DatabaseManager) -> Result<()> {
    let info = manager.database_info();
    if output::is_json() {
        output::json_output(info_json(&info));
        return Ok(());
    }

    output::section("Database Information");
    output::field("URL", &info.database_url);
    output::field("Tables", info.tables.len());

    let mut counts = info.table_counts.clone();
    counts.sort_by(|a, b| a.0.cmp(&b.0));
    if !counts.is_empty() {
        let rows: Vec<CountRow> = counts
            .into_iter()
            .map(|(table, count)| CountRow {
                table,
                rows: match count {
                    TableCount::Rows(n) => n.to_string(),
                    TableCount::Failed(reason) => reason,
                },
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    }
    output::field("Total rows", info.total_rows());
    Ok(())
}

fn info_json(info: &DatabaseInfo) -> serde_json::Value {
    let counts: serde_json::Map<String, serde_json::Value> = info
        .table_counts
        .iter()
        .map(|(name, count)| {
            let value = match count {
                TableCount::Rows(n) => json!(n),
                TableCount::Failed(reason) => json!(reason),
            };
            (name.clone(), value)
        })
        .collect();
    json!({
        "database_url": info.database_url,
        "tables": info.tables,
        "table_counts": counts,
        "total_rows": info.total_rows(),
    })
}

pub fn backup(manager: &DatabaseManager, path: Option<&Path>) -> Result<()> {
    let pb = output::spinner("Backing up database");
    match manager.backup_database(path) {
        Ok(written) => {
            output::spinner_success(
                &pb,
                &format!("Database backed up to: {}", output::highlight(written.display())),
            );
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb);
            Err(e)
        }
    }
}

pub fn restore(manager: &mut DatabaseManager, path: &Path, assume_yes: bool) -> Result<()> {
    let prompt = format!(
        "Are you sure you want to restore from {}? This will overwrite the current database.",
        path.display()
    );
    if !confirm(&prompt, assume_yes)? {
        cancelled();
        return Ok(());
    }
    let pb = output::spinner("Restoring database");
    match manager.restore_database(path) {
        Ok(()) => {
            output::spinner_success(
                &pb,
                &format!("Database restored from: {}", output::highlight(path.display())),
            );
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb);
            Err(e)
        }
    }
}

pub fn vacuum(manager: &DatabaseManager) -> Result<()> {
    let pb = output::spinner("Vacuuming database");
    match manager.vacuum_database() {
        Ok(()) => {
            output::spinner_success(&pb, "Database vacuumed successfully!");
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn assume_yes_skips_prompt() {
        assert!(confirm("Drop?", true).unwrap());
    }

    #[test]
    fn info_json_maps_counts_by_table() {
        let info = DatabaseInfo {
            database_url: "sqlite://".into(),
            tables: vec!["a".into(), "b".into()],
            table_counts: vec![
                ("a".into(), TableCount::Rows(2)),
                ("b".into(), TableCount::Failed("no such table: b".into())),
            ],
        };
        let json = info_json(&info);
        assert_eq!(json["table_counts"]["a"], json!(2));
        assert_eq!(json["table_counts"]["b"], json!("no such table: b"));
        assert_eq!(json["total_rows"], json!(2));
    }
}
