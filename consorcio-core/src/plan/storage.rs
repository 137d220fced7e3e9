use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::{PlanError, PlanResult};

const STORAGE_SCHEMA: &str = include_str!("../../../sql/storage.sql");

/// Durable string storage addressed by key.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> PlanResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PlanResult<()>;
}

#[derive(Debug, Clone)]
pub struct SqliteKeyValueStoreBuilder {
    path: Option<PathBuf>,
    read_only: bool,
    create_if_missing: bool,
}

impl Default for SqliteKeyValueStoreBuilder {
    fn default() -> Self {
        Self {
            path: None,
            read_only: false,
            create_if_missing: true,
        }
    }
}

impl SqliteKeyValueStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    pub fn build(self) -> PlanResult<SqliteKeyValueStore> {
        let path = self.path.ok_or(PlanError::MissingStore)?;
        let mut flags = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };

        if !self.read_only && self.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(SqliteKeyValueStore {
            path,
            flags,
            read_only: self.read_only,
        })
    }
}

/// Key-value storage backed by a single SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    path: PathBuf,
    flags: OpenFlags,
    read_only: bool,
}

impl SqliteKeyValueStore {
    pub fn builder() -> SqliteKeyValueStoreBuilder {
        SqliteKeyValueStoreBuilder::new()
    }

    pub fn new(path: impl AsRef<Path>) -> PlanResult<Self> {
        SqliteKeyValueStoreBuilder::new().path(path).build()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> PlanResult<Connection> {
        let conn = Connection::open_with_flags(&self.path, self.flags).map_err(|source| {
            PlanError::OpenDatabase {
                path: self.path.clone(),
                source,
            }
        })?;
        configure_connection(&conn, self.read_only).map_err(|source| {
            PlanError::OpenDatabase {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(conn)
    }

    pub fn initialize(&self) -> PlanResult<()> {
        let conn = self.open()?;
        conn.execute_batch(STORAGE_SCHEMA)?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> PlanResult<bool> {
        let conn = self.open()?;
        let affected = conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    pub fn keys(&self) -> PlanResult<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// Result of `PRAGMA integrity_check`; `"ok"` when the file is healthy.
    pub fn integrity_check(&self) -> PlanResult<String> {
        let conn = self.open()?;
        let result: String = conn.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
        Ok(result)
    }
}

impl KeyValueStorage for SqliteKeyValueStore {
    fn get(&self, key: &str) -> PlanResult<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> PlanResult<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}

fn configure_connection(conn: &Connection, read_only: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    if read_only {
        return Ok(());
    }
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA synchronous = NORMAL;\n\
         PRAGMA temp_store = MEMORY;\n",
    )
}

/// Volatile storage for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self { entries, writes: 0 }
    }

    /// Number of `set` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStorage for MemoryKeyValueStore {
    fn get(&self, key: &str) -> PlanResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PlanResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}
