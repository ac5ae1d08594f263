use crate::error::Result;
use crate::schema::{CanonicalColumn, ColumnOrigin, Ledger, Transaction};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A table as it arrives from the outside world: header names and string cells,
/// before any column resolution or type coercion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Convenience constructor for literal tables.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// The trimmed cell value, or `None` when the cell is blank or the row is short.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Writes a ledger back out under canonical headers. Only columns that were read from the
/// source are emitted, so derived and defaulted values are recomputed on the next load.
impl From<&Ledger> for RawTable {
    fn from(ledger: &Ledger) -> Self {
        let columns: Vec<CanonicalColumn> = CanonicalColumn::ALL
            .iter()
            .copied()
            .filter(|&c| ledger.column_origin(c) == Some(ColumnOrigin::Source))
            .collect();

        let headers = columns.iter().map(|c| c.name().to_string()).collect();
        let rows = ledger
            .transactions()
            .iter()
            .map(|t| columns.iter().map(|&c| cell_value(t, c)).collect())
            .collect();

        Self { headers, rows }
    }
}

fn cell_value(transaction: &Transaction, column: CanonicalColumn) -> String {
    match column {
        CanonicalColumn::Id => transaction.id.clone(),
        CanonicalColumn::Date => transaction.date.format("%Y-%m-%d").to_string(),
        CanonicalColumn::Amount => transaction.amount.to_string(),
        CanonicalColumn::TransactionType => transaction.transaction_type.to_string(),
        CanonicalColumn::Category => transaction.category.clone(),
        CanonicalColumn::Vendor => transaction.vendor.clone(),
        CanonicalColumn::Department => transaction.department.clone(),
        CanonicalColumn::Employee => transaction.employee.clone(),
        CanonicalColumn::PaymentMethod => transaction.payment_method.clone(),
        CanonicalColumn::Status => transaction.status.clone(),
        CanonicalColumn::Notes => transaction.notes.clone(),
    }
}
