use crate::error::{Result, ZonestatError};
use crate::join::{left_join, Keyed};
use crate::zonal::{ZoneCode, ZoneMeta};

/// Identity columns leading every exported table.
pub const KEY_COLUMNS: [&str; 4] = ["adm1_name", "adm2_code", "adm2_name", "year"];

/// One cell of an exported table. `Null` is written as an empty field.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Textual form for delimited output.
    pub fn to_field(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Measure columns of a job; the key columns are implied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    measures: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(measures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            measures: measures.into_iter().map(Into::into).collect(),
        }
    }

    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    /// Full column list: key columns then measures.
    pub fn columns(&self) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.measures.iter().cloned())
            .collect()
    }
}

/// Measures computed for one zone and year, before metadata is attached.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureRow {
    pub code: ZoneCode,
    pub year: i32,
    pub measures: Vec<Value>,
}

impl Keyed for MeasureRow {
    type Key = ZoneCode;

    fn key(&self) -> ZoneCode {
        self.code
    }
}

impl Keyed for ZoneMeta {
    type Key = ZoneCode;

    fn key(&self) -> ZoneCode {
        self.code
    }
}

/// One output row: zone identity and metadata, year, measures.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneYearRecord {
    pub code: ZoneCode,
    /// Absent when the zone had no metadata match.
    pub meta: Option<ZoneMeta>,
    pub year: i32,
    pub measures: Vec<Value>,
}

impl ZoneYearRecord {
    /// Attach zone metadata to measure rows. Rows without a metadata match
    /// are kept with absent names.
    pub fn attach_metadata(rows: Vec<MeasureRow>, metadata: &[ZoneMeta]) -> Vec<ZoneYearRecord> {
        left_join(rows, metadata)
            .into_iter()
            .map(|joined| ZoneYearRecord {
                code: joined.primary.code,
                year: joined.primary.year,
                measures: joined.primary.measures,
                meta: joined.matched,
            })
            .collect()
    }

    fn into_row(self) -> Vec<Value> {
        let (parent, name) = match self.meta {
            Some(meta) => (Value::Text(meta.parent), Value::Text(meta.name)),
            None => (Value::Null, Value::Null),
        };
        let mut row = vec![parent, Value::Int(self.code.0), name, Value::from(self.year)];
        row.extend(self.measures);
        row
    }
}

/// Named table handed to an export sink.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from records, checking each against `schema`.
    pub fn from_records(
        name: impl Into<String>,
        schema: &Schema,
        records: Vec<ZoneYearRecord>,
    ) -> Result<Self> {
        let mut table = Self::new(name, schema.columns());
        for record in records {
            table.push_row(record.into_row())?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ZonestatError::Export(format!(
                "table '{}' expects {} columns, row has {}",
                self.name,
                self.columns.len(),
                row.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell at `row` in `column`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}
