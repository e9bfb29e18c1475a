use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Color, Table};

use crate::classifier::{flag, AlertLevel};
use crate::cli::export::write_outputs;
use crate::cli::{load_snapshot, open_store, OutputArgs};
use crate::error::Result;
use crate::export::table::{alerts_table, format_timestamp, ALERT_COLUMNS};
use crate::fmt::money_opt;
use crate::settings::load_settings;
use crate::store::Page;

fn level_cell(level: AlertLevel) -> Cell {
    let cell = Cell::new(level.as_str());
    match level {
        AlertLevel::Critical => cell.fg(Color::Red),
        AlertLevel::Moderate => cell.fg(Color::Yellow),
        AlertLevel::Low => cell,
    }
}

pub fn run(output: &OutputArgs) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let snapshot = load_snapshot(&store, Page::All)?;
    let report = flag(&snapshot.transactions);

    if report.is_empty() {
        println!("No flagged transactions.");
    } else {
        let mut table = Table::new();
        table.set_header(ALERT_COLUMNS.to_vec());
        for alert in &report.alerts {
            let t = alert.txn;
            table.add_row(vec![
                Cell::new(&t.id),
                Cell::new(&t.client_id),
                Cell::new(money_opt(t.amount)).set_alignment(CellAlignment::Right),
                Cell::new(&t.merchant_city),
                level_cell(alert.level),
                Cell::new(format_timestamp(t.date).render()),
            ]);
        }
        println!("Fraud Alerts\n{table}");
    }
    println!(
        "{} flagged: {} critical, {} moderate",
        report.len(),
        report.critical.to_string().red().bold(),
        report.moderate.to_string().yellow()
    );

    let table = alerts_table(&report);
    let subtitle = format!("{} critical, {} moderate", report.critical, report.moderate);
    write_outputs(output, "Fraud Alerts", &subtitle, &[&table])
}
