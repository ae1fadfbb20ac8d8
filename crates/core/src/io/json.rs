//! JSON persistence for attribute tables
//!
//! A table is stored as `{"num_rows": N, "columns": [{"name": .., "data": {"type": .., "values": [..]}}]}`.
//! Non-finite real values are written as `null`.

use crate::error::Result;
use crate::rat::AttributeTable;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Options for writing attribute tables
#[derive(Debug, Clone)]
pub struct RatWriteOptions {
    /// Indent the output for human inspection
    pub pretty: bool,
}

impl Default for RatWriteOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Read an attribute table from a JSON file
pub fn read_rat<P: AsRef<Path>>(path: P) -> Result<AttributeTable> {
    let file = File::open(path.as_ref())?;
    let table: AttributeTable = serde_json::from_reader(BufReader::new(file))?;
    table.validate()?;
    Ok(table)
}

/// Read an attribute table from an in-memory JSON buffer
pub fn read_rat_from_buffer(data: &[u8]) -> Result<AttributeTable> {
    let table: AttributeTable = serde_json::from_slice(data)?;
    table.validate()?;
    Ok(table)
}

/// Write an attribute table to a JSON file
pub fn write_rat<P: AsRef<Path>>(
    table: &AttributeTable,
    path: P,
    options: Option<RatWriteOptions>,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode(table, &mut writer, &options.unwrap_or_default())?;
    writer.flush()?;
    Ok(())
}

/// Write an attribute table to an in-memory JSON buffer
pub fn write_rat_to_buffer(table: &AttributeTable, options: Option<RatWriteOptions>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode(table, &mut buf, &options.unwrap_or_default())?;
    Ok(buf)
}

fn encode<W: Write>(table: &AttributeTable, writer: W, options: &RatWriteOptions) -> Result<()> {
    if options.pretty {
        serde_json::to_writer_pretty(writer, table)?;
    } else {
        serde_json::to_writer(writer, table)?;
    }
    Ok(())
}
