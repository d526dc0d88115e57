use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Entry, EntryId, EntryType, Icon, Task};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::with_connection(conn)
    }

    /// Throwaway database, used by tests and `--dry-run` style commands
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                id              TEXT PRIMARY KEY,
                timestamp       TEXT NOT NULL,
                type            TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              TEXT PRIMARY KEY,
                entry_id        TEXT NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
                icon            TEXT NOT NULL DEFAULT 'todo',
                label           TEXT NOT NULL DEFAULT '',
                indent          INTEGER NOT NULL DEFAULT 0,
                position        INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_timestamp ON entries(timestamp)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_entry_id ON tasks(entry_id, position)",
            [],
        )?;

        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert an entry together with its tasks
    pub fn insert_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let now = now_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO entries (id, timestamp, type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                entry.id.to_string(),
                entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                entry.entry_type.as_str(),
                now,
                now
            ],
        )?;
        for task in &entry.tasks {
            insert_task_row(&tx, entry.id, task)?;
        }
        tx.commit()?;
        debug!(entry = %entry.id, tasks = entry.tasks.len(), "inserted entry");
        Ok(())
    }

    /// Persist an entry's current type and task list, replacing whatever was
    /// stored for it
    pub fn save_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE entries SET timestamp = ?1, type = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![
                entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                entry.entry_type.as_str(),
                now_string(),
                entry.id.to_string()
            ],
        )?;
        tx.execute(
            "DELETE FROM tasks WHERE entry_id = ?1",
            rusqlite::params![entry.id.to_string()],
        )?;
        for task in &entry.tasks {
            insert_task_row(&tx, entry.id, task)?;
        }
        tx.commit()?;
        debug!(entry = %entry.id, tasks = entry.tasks.len(), "saved entry");
        Ok(())
    }

    /// Delete an entry and every task it owns
    pub fn delete_entry(&self, id: EntryId) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM tasks WHERE entry_id = ?1",
            rusqlite::params![id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM entries WHERE id = ?1",
            rusqlite::params![id.to_string()],
        )?;
        tx.commit()?;
        debug!(entry = %id, "deleted entry");
        Ok(())
    }

    /// Every entry with its tasks, oldest first
    pub fn load_entries(&self) -> Result<Vec<Entry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, timestamp, type FROM entries ORDER BY timestamp ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (id, timestamp, entry_type) in rows {
            let id = parse_uuid("entries", &id)?;
            let timestamp = chrono::NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT)
                .map_err(|e| StoreError::Corrupt {
                    table: "entries",
                    detail: format!("timestamp '{}': {}", timestamp, e),
                })?;
            let entry_type = entry_type
                .parse::<EntryType>()
                .map_err(|e| StoreError::Corrupt {
                    table: "entries",
                    detail: e.to_string(),
                })?;
            let tasks = self.load_tasks(id)?;
            entries.push(Entry {
                id,
                timestamp,
                entry_type,
                tasks,
            });
        }
        Ok(entries)
    }

    fn load_tasks(&self, entry_id: EntryId) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, icon, label, indent, position FROM tasks
             WHERE entry_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![entry_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tasks = Vec::with_capacity(rows.len());
        for (position, (id, icon, label, indent)) in rows.into_iter().enumerate() {
            let icon = icon.parse::<Icon>().map_err(|e| StoreError::Corrupt {
                table: "tasks",
                detail: e.to_string(),
            })?;
            tasks.push(Task {
                id: parse_uuid("tasks", &id)?,
                icon,
                label,
                indent: indent.clamp(0, i64::from(u16::MAX)) as u16,
                // positions on disk may have gaps after manual edits
                index: position,
            });
        }
        Ok(tasks)
    }

    pub fn entry_exists(&self, id: EntryId) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM entries WHERE id = ?1",
                rusqlite::params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn task_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?)
    }
}

fn insert_task_row(conn: &Connection, entry_id: EntryId, task: &Task) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO tasks (id, entry_id, icon, label, indent, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            task.id.to_string(),
            entry_id.to_string(),
            task.icon.as_str(),
            task.label,
            i64::from(task.indent),
            task.index as i64
        ],
    )?;
    Ok(())
}

fn parse_uuid(table: &'static str, raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt {
        table,
        detail: format!("id '{}': {}", raw, e),
    })
}

fn now_string() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_entry() -> Entry {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        Entry::on_date(
            date,
            EntryType::Daily,
            vec![
                Task::new(Icon::Todo, "Ship feature"),
                Task::new(Icon::Check, "Review").with_indent(2),
            ],
        )
    }

    #[test]
    fn insert_and_load_round_trip() {
        let db = Database::in_memory().unwrap();
        let entry = sample_entry();
        db.insert_entry(&entry).unwrap();

        let loaded = db.load_entries().unwrap();
        assert_eq!(loaded, vec![entry]);
    }

    #[test]
    fn save_replaces_task_list() {
        let db = Database::in_memory().unwrap();
        let mut entry = sample_entry();
        db.insert_entry(&entry).unwrap();

        entry.tasks.remove(0);
        crate::ordering::reindex(&mut entry.tasks);
        entry.entry_type = EntryType::Weekly;
        db.save_entry(&entry).unwrap();

        let loaded = db.load_entries().unwrap();
        assert_eq!(loaded[0].entry_type, EntryType::Weekly);
        assert_eq!(loaded[0].tasks.len(), 1);
        assert_eq!(loaded[0].tasks[0].label, "Review");
        assert_eq!(loaded[0].tasks[0].index, 0);
    }

    #[test]
    fn delete_removes_tasks_too() {
        let db = Database::in_memory().unwrap();
        let entry = sample_entry();
        db.insert_entry(&entry).unwrap();
        assert_eq!(db.task_count().unwrap(), 2);

        db.delete_entry(entry.id).unwrap();
        assert!(!db.entry_exists(entry.id).unwrap());
        assert_eq!(db.task_count().unwrap(), 0);
    }

    #[test]
    fn unknown_icon_is_reported_as_corrupt() {
        let db = Database::in_memory().unwrap();
        let entry = sample_entry();
        db.insert_entry(&entry).unwrap();
        db.conn()
            .execute("UPDATE tasks SET icon = 'sparkles'", [])
            .unwrap();

        assert!(matches!(db.load_entries(), Err(StoreError::Corrupt { table: "tasks", .. })));
    }
}
