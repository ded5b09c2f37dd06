use std::path::Path;

use ormkit::{
    standard_model, DatabaseManager, Error, GetOptions, Model, Registry, TableCount,
};
use tempfile::TempDir;

standard_model! {
    #[derive(Debug, Clone)]
    pub struct Note in "notes" {
        pub body: String,
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register::<Note>().expect("register notes");
    registry
}

fn manager_at(path: &Path) -> DatabaseManager {
    DatabaseManager::new(&format!("sqlite:///{}", path.display()), registry())
        .expect("open manager")
}

fn add_notes(manager: &DatabaseManager, bodies: &[&str]) {
    let notes: Vec<Note> = bodies.iter().map(|b| Note::new((*b).to_string())).collect();
    manager.database().add(&notes).expect("add notes");
}

fn note_count(manager: &DatabaseManager) -> i64 {
    manager.database().count(Note::table(), &[]).expect("count notes")
}

#[test]
fn backup_defaults_next_to_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("app.db");
    let manager = manager_at(&db_path);
    add_notes(&manager, &["one"]);

    let backup = manager.backup_database(None).unwrap();
    assert_eq!(backup, dir.path().join("app.db.backup"));
    assert!(backup.is_file());
}

#[test]
fn restore_brings_back_backed_up_rows() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager_at(&dir.path().join("app.db"));
    add_notes(&manager, &["one", "two"]);

    let backup_path = dir.path().join("snapshot.db");
    let written = manager.backup_database(Some(&backup_path)).unwrap();
    assert_eq!(written, backup_path);

    add_notes(&manager, &["three"]);
    assert_eq!(note_count(&manager), 3);

    manager.restore_database(&backup_path).unwrap();
    assert_eq!(note_count(&manager), 2);
    let notes = manager.database().get::<Note>(GetOptions::new()).unwrap();
    let bodies: Vec<&str> = notes.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(bodies, ["one", "two"]);
}

#[test]
fn restore_from_missing_file_keeps_database() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager_at(&dir.path().join("app.db"));
    add_notes(&manager, &["kept"]);

    let err = manager
        .restore_database(&dir.path().join("missing.db"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(note_count(&manager), 1);
}

#[test]
fn reset_empties_tables() {
    let dir = TempDir::new().unwrap();
    let manager = manager_at(&dir.path().join("app.db"));
    add_notes(&manager, &["a", "b"]);

    manager.reset_database().unwrap();
    assert_eq!(note_count(&manager), 0);
}

#[test]
fn info_reports_dropped_tables_as_failures() {
    let dir = TempDir::new().unwrap();
    let manager = manager_at(&dir.path().join("app.db"));
    add_notes(&manager, &["a"]);
    assert_eq!(manager.database_info().total_rows(), 1);

    manager.drop_database().unwrap();
    let info = manager.database_info();
    assert_eq!(info.tables, ["notes"]);
    assert!(matches!(info.table_counts[0].1, TableCount::Failed(_)));
    assert_eq!(info.total_rows(), 0);
}

#[test]
fn vacuum_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let manager = manager_at(&dir.path().join("app.db"));
    add_notes(&manager, &["a", "b", "c"]);
    manager
        .database()
        .delete(Note::table(), &[Note::body().eq("b")])
        .unwrap();

    manager.vacuum_database().unwrap();
    assert_eq!(note_count(&manager), 2);
}

#[test]
fn file_operations_need_a_file() {
    let manager = DatabaseManager::new("sqlite://:memory:", registry()).unwrap();
    let err = manager.backup_database(None).unwrap_err();
    assert!(matches!(err, Error::InMemory { operation: "Backup" }));
    assert!(manager.vacuum_database().is_ok());
}

#[test]
fn backup_onto_database_file_is_refused() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("app.db");
    let manager = manager_at(&db_path);
    add_notes(&manager, &["kept"]);
    let size = std::fs::metadata(&db_path).unwrap().len();

    let err = manager.backup_database(Some(&db_path)).unwrap_err();
    assert!(matches!(err, Error::SameFile { operation: "Backup", .. }));
    assert_eq!(std::fs::metadata(&db_path).unwrap().len(), size);
    assert_eq!(note_count(&manager), 1);
}

#[test]
fn restore_from_database_file_is_refused() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("app.db");
    let mut manager = manager_at(&db_path);
    add_notes(&manager, &["kept"]);

    let same_file = dir.path().join(".").join("app.db");
    let err = manager.restore_database(&same_file).unwrap_err();
    assert!(matches!(err, Error::SameFile { operation: "Restore", .. }));
    assert!(std::fs::metadata(&db_path).unwrap().len() > 0);
    assert_eq!(note_count(&manager), 1);
}
