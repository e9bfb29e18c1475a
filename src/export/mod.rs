//! Flat tabular output shared by the terminal, CSV and PDF renderers.

pub mod csv;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod table;

pub use table::{Cell, ExportTable, Record};
