use std::path::PathBuf;

use crate::cli::OutputArgs;
use crate::error::Result;
use crate::export::csv::write_csv_file;
use crate::export::ExportTable;
use crate::settings::shellexpand_path;

/// Write whichever file outputs were asked for. The CSV gets the first
/// table, the PDF gets all of them.
pub fn write_outputs(
    output: &OutputArgs,
    title: &str,
    subtitle: &str,
    tables: &[&ExportTable],
) -> Result<()> {
    if let (Some(path), Some(first)) = (&output.csv, tables.first()) {
        let path = PathBuf::from(shellexpand_path(path));
        write_csv_file(first, &path)?;
        println!("Exported to {}", path.display());
    }
    if let Some(path) = &output.pdf {
        let path = PathBuf::from(shellexpand_path(path));
        write_pdf(title, subtitle, tables, &path)?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "pdf")]
fn write_pdf(title: &str, subtitle: &str, tables: &[&ExportTable], path: &std::path::Path) -> Result<()> {
    crate::export::pdf::write_pdf_file(title, subtitle, tables, path)
}

#[cfg(not(feature = "pdf"))]
fn write_pdf(_title: &str, _subtitle: &str, _tables: &[&ExportTable], _path: &std::path::Path) -> Result<()> {
    Err(crate::error::RampError::Pdf(
        "PDF export is not available in this build (enable the `pdf` feature)".to_string(),
    ))
}
