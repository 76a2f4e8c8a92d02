use crate::scanner::ScanReport;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "table" => OutputFormat::Table,
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

const NO_CHANGES: &str = "No balance changes observed in the scanned window.";

pub fn format_report(report: &ScanReport, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_report_text(report),
        OutputFormat::Table => format_report_table(report),
        OutputFormat::Json => format_report_json(report),
        OutputFormat::Csv => format_report_csv(report),
    }
}

fn format_report_text(report: &ScanReport) -> String {
    match &report.selection {
        Some(change) => format!(
            "Address: {} Balance Change: {}",
            change.address, change.balance_change
        ),
        None => NO_CHANGES.to_string(),
    }
}

fn format_report_table(report: &ScanReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Metric", "Value"]);

    table.add_row(vec![
        Cell::new("Blocks"),
        Cell::new(format!("{} - {}", report.from_block, report.to_block)),
    ]);
    table.add_row(vec![Cell::new("Blocks Scanned"), Cell::new(report.blocks_scanned)]);
    table.add_row(vec![
        Cell::new("Transfers Applied"),
        Cell::new(report.transfers_applied),
    ]);
    table.add_row(vec![
        Cell::new("Addresses Touched"),
        Cell::new(report.addresses_touched()),
    ]);

    match &report.selection {
        Some(change) => {
            table.add_row(vec![Cell::new("Address"), Cell::new(&change.address)]);
            table.add_row(vec![
                Cell::new("Balance Change (Wei)"),
                Cell::new(change.balance_change.to_string()),
            ]);
        }
        None => {
            table.add_row(vec![Cell::new("Address"), Cell::new("N/A")]);
        }
    }

    table.to_string()
}

fn format_report_json(report: &ScanReport) -> String {
    // balances go out as decimal strings, they routinely exceed JSON number precision
    serde_json::to_string_pretty(&json!({
        "from_block": report.from_block,
        "to_block": report.to_block,
        "blocks_scanned": report.blocks_scanned,
        "transfers_applied": report.transfers_applied,
        "addresses_touched": report.addresses_touched(),
        "address": report.selection.as_ref().map(|c| c.address.clone()),
        "balance_change_wei": report.selection.as_ref().map(|c| c.balance_change.to_string()),
    }))
    .unwrap_or_else(|_| "{}".to_string())
}

fn format_report_csv(report: &ScanReport) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record([
        "from_block",
        "to_block",
        "blocks_scanned",
        "transfers_applied",
        "addresses_touched",
        "address",
        "balance_change_wei",
    ]);

    let (address, change) = match &report.selection {
        Some(c) => (c.address.clone(), c.balance_change.to_string()),
        None => (String::new(), String::new()),
    };
    let _ = wtr.write_record([
        &report.from_block.to_string(),
        &report.to_block.to_string(),
        &report.blocks_scanned.to_string(),
        &report.transfers_applied.to_string(),
        &report.addresses_touched().to_string(),
        &address,
        &change,
    ]);

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}
