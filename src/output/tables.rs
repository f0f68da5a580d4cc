use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::Severity;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn severity_cell(severity: Severity) -> Cell {
    let cell = Cell::new(severity.as_str());
    match severity {
        Severity::Critical | Severity::High => cell.fg(TableColor::Red),
        Severity::Medium => cell.fg(TableColor::Yellow),
        Severity::Low | Severity::Info => cell.fg(TableColor::Green),
    }
}

pub fn conclusion_cell(conclusion: Option<&str>) -> Cell {
    match conclusion {
        Some("success") => Cell::new("success").fg(TableColor::Green),
        Some(other @ ("failure" | "timed_out" | "startup_failure")) => {
            Cell::new(other).fg(TableColor::Red)
        }
        Some(other) => Cell::new(other).fg(TableColor::Yellow),
        None => Cell::new("pending").fg(TableColor::Yellow),
    }
}

pub fn color_coded_rate_cell(rate: f64) -> Cell {
    let text = format!("{rate:.1}%");
    if rate > 80.0 {
        Cell::new(text).fg(TableColor::Green)
    } else if rate >= 50.0 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}
