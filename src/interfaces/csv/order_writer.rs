use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One row of the final order table. Usernames rather than ids, so output is
/// stable across runs.
#[derive(Debug, Serialize)]
pub struct OrderRow {
    pub buyer: String,
    pub seller: String,
    pub status: String,
    pub total_price: String,
    pub total_items: u32,
}

/// Writes the settled orders as CSV.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(destination: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(destination);
        Self { writer }
    }

    /// Writes the header up front so an empty settlement still produces a
    /// well-formed table.
    pub fn write_orders(&mut self, rows: Vec<OrderRow>) -> Result<()> {
        self.writer
            .write_record(["buyer", "seller", "status", "total_price", "total_items"])?;
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
