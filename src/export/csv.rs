use std::io::Write;
use std::path::Path;

use ::csv::{QuoteStyle, WriterBuilder};

use crate::error::Result;
use crate::export::table::ExportTable;

/// Header row then one line per row. Fields holding a comma, quote or newline
/// are quoted, with embedded quotes doubled.
pub fn write_csv<W: Write>(table: &ExportTable, out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(out);
    wtr.write_record(&table.columns)?;
    for row in table.rendered_rows() {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &ExportTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(table, file)?;
    log::info!("wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}
