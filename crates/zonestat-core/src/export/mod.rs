pub mod sink;
pub mod table;

pub use sink::{CsvDirectorySink, ExportSink, MemorySink};
pub use table::{MeasureRow, Schema, Table, Value, ZoneYearRecord, KEY_COLUMNS};
