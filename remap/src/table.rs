//! Tabular data handling.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

use crate::Error;

/// An ordered table of text cells.
///
/// Every cell is a string: no column is ever interpreted as a number or a
/// date, which protects values like leading-zero identifiers and long digit
/// strings. Column order and row order are both meaningful, and every
/// operation preserves them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    cells: Vec<Vec<String>>,
}

impl Table {
    /// Constructor for an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of rows in the table: the length of its longest column.
    pub fn rows(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns whether the table has no columns at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The column names, in order. Duplicate names are permitted.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Get the cells of the first column with the given name, if any.
    pub fn column<N: AsRef<str>>(&self, name: N) -> Option<&[String]> {
        let name = name.as_ref();
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.cells[i].as_slice())
    }

    /// Append a named column. Columns of differing lengths are allowed here;
    /// the missing-value fill and the CSV writer both treat absent trailing
    /// cells as empty.
    pub fn push_column<N: AsRef<str>>(&mut self, name: N, values: Vec<String>) {
        self.columns.push(name.as_ref().to_string());
        self.cells.push(values);
    }

    /// The cells of row `idx` across all columns, with empty strings for
    /// columns shorter than `idx + 1`.
    pub fn row(&self, idx: usize) -> Vec<&str> {
        self.cells
            .iter()
            .map(|col| col.get(idx).map(String::as_str).unwrap_or(""))
            .collect()
    }

    /// A copy of the table restricted to its first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|col| col.iter().take(n).cloned().collect())
                .collect(),
        }
    }

    /// Pad every column shorter than the table's row count with the given
    /// value, so that no cell is absent.
    pub fn fill_missing(&mut self, value: &str) {
        let rows = self.rows();
        for col in &mut self.cells {
            col.resize(rows, value.to_string());
        }
    }

    /// Read a table from a CSV file. The first record is the header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))?;
        Self::from_csv_reader(file)
    }

    /// Read a table from CSV data. Every cell is kept as text; no trimming
    /// or type coercion is applied.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns = reader
            .byte_headers()?
            .iter()
            .map(decode_field)
            .collect::<Vec<String>>();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
        for record in reader.byte_records() {
            let record = record?;
            for (i, col) in cells.iter_mut().enumerate() {
                col.push(record.get(i).map(decode_field).unwrap_or_default());
            }
        }
        Ok(Self { columns, cells })
    }

    /// Write the table as CSV to the given path, creating parent directories
    /// as necessary.
    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::Io(format!("while creating {}", parent.display()), e))?;
            }
        }
        let file = fs::File::create(path)
            .map_err(|e| Error::Io(format!("while trying to write to {}", path.display()), e))?;
        self.to_csv_writer(file)
    }

    /// Write the table as CSV. Every field is quoted, so that spreadsheet
    /// tools cannot corrupt numeric-looking strings on the way back in.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        writer.write_record(&self.columns)?;
        for i in 0..self.rows() {
            writer.write_record(self.row(i))?;
        }
        writer
            .flush()
            .map_err(|e| Error::Io("while flushing CSV output".to_string(), e))?;
        Ok(())
    }
}

// Cell bytes are decoded as UTF-8, falling back to Latin-1 for files
// exported by legacy tools.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_keeps_cells_as_text() {
        let table = Table::from_csv_reader("ID,QTY\n007,010\n42,9\n".as_bytes()).unwrap();
        assert_eq!(table.column_names(), &["ID", "QTY"]);
        assert_eq!(table.rows(), 2);
        assert_eq!(table.column("ID").unwrap(), &["007", "42"]);
        assert_eq!(table.column("QTY").unwrap(), &["010", "9"]);
        assert_eq!(table.column("MISSING"), None);
    }

    #[test]
    fn read_decodes_latin1_when_not_utf8() {
        let mut data = b"NAME\n".to_vec();
        // "caf\xe9" is Latin-1 for "café".
        data.extend_from_slice(b"caf\xe9\n");
        let table = Table::from_csv_reader(data.as_slice()).unwrap();
        assert_eq!(table.column("NAME").unwrap(), &["caf\u{e9}"]);
    }

    #[test]
    fn write_quotes_every_field() {
        let mut table = Table::new();
        table.push_column("id", vec!["007".to_string()]);
        table.push_column("name", vec!["plain".to_string()]);
        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"id\",\"name\"\n\"007\",\"plain\"\n"
        );
    }

    #[test]
    fn ragged_columns_fill_and_write_as_empty() {
        let mut table = Table::new();
        table.push_column("a", vec!["1".to_string(), "2".to_string()]);
        table.push_column("b", vec!["x".to_string()]);
        assert_eq!(table.rows(), 2);
        assert_eq!(table.row(1), vec!["2", ""]);

        table.fill_missing("-");
        assert_eq!(table.column("b").unwrap(), &["x", "-"]);
    }

    #[test]
    fn head_restricts_rows() {
        let mut table = Table::new();
        table.push_column(
            "a",
            vec!["1".to_string(), "2".to_string(), "3".to_string()],
        );
        let head = table.head(2);
        assert_eq!(head.rows(), 2);
        assert_eq!(head.column("a").unwrap(), &["1", "2"]);
        // The source table is untouched.
        assert_eq!(table.rows(), 3);
    }

    #[test]
    fn duplicate_column_names_resolve_to_the_first() {
        let mut table = Table::new();
        table.push_column("x", vec!["first".to_string()]);
        table.push_column("x", vec!["second".to_string()]);
        assert_eq!(table.column("x").unwrap(), &["first"]);
        assert_eq!(table.row(0), vec!["first", "second"]);
    }
}
