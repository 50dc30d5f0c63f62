use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use crate::error::{Result, ZonestatError};

use super::table::{Table, Value};

/// Destination for finished shard tables.
pub trait ExportSink: Send + Sync {
    /// Persist `table` under its name.
    fn export(&self, table: &Table) -> Result<()>;
}

/// Writes each table as `<dir>/<name>.csv`.
#[derive(Clone, Debug)]
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table: &Table) -> PathBuf {
        self.dir.join(format!("{}.csv", table.name()))
    }
}

impl ExportSink for CsvDirectorySink {
    fn export(&self, table: &Table) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(table);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(Value::to_field))?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = table.len(), "Exported table");
        Ok(())
    }
}

/// Keeps exported tables in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<Vec<Table>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of exported tables, sorted by name.
    pub fn tables(&self) -> Vec<Table> {
        let mut tables = match self.tables.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        tables
    }

    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables().into_iter().find(|t| t.name() == name)
    }
}

impl ExportSink for MemorySink {
    fn export(&self, table: &Table) -> Result<()> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| ZonestatError::Export("memory sink lock poisoned".to_string()))?;
        tables.retain(|t| t.name() != table.name());
        tables.push(table.clone());
        Ok(())
    }
}
