//! Terminal rendering of mapping rules, reports and resolution counters.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tcfg_core::SynthesisStats;
use tcfg_model::{Confidence, ConfigMapping, MappingReport};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

/// One row per rule: path, type, structure, confidence and sources.
pub fn mapping_table<'a>(mappings: impl IntoIterator<Item = &'a ConfigMapping>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Path"),
        header_cell("Type"),
        header_cell("Structure"),
        header_cell("Confidence"),
        header_cell("Sources"),
    ]);
    apply_table_style(&mut table);
    for mapping in mappings {
        let sources = mapping
            .source_candidates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(mapping.config_path.to_string()),
            Cell::new(mapping.config_type),
            Cell::new(mapping.structure),
            confidence_cell(mapping.confidence),
            Cell::new(sources),
        ]);
    }
    table
}

/// Counts per confidence tier plus unmapped and skipped entries.
pub fn report_overview_table(report: &MappingReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Tier"),
        header_cell("Meaning"),
        header_cell("Mappings"),
    ]);
    apply_table_style(&mut table);
    for level in Confidence::ALL {
        table.add_row(vec![
            confidence_cell(level),
            Cell::new(level.description()),
            count_cell(report.bucket(level).len()),
        ]);
    }
    table.add_row(vec![
        Cell::new("unmapped").fg(Color::Magenta),
        Cell::new("no rule and no matching table pattern"),
        count_cell(report.unmapped.len()),
    ]);
    if let Some(column) = table.column_mut(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

pub fn print_report(report: &MappingReport) {
    println!("{}", report_overview_table(report));
    for level in Confidence::ALL {
        let bucket = report.bucket(level);
        if bucket.is_empty() {
            continue;
        }
        println!();
        println!("{} ({}):", level.description(), bucket.len());
        println!("{}", mapping_table(bucket));
    }
    if !report.unmapped.is_empty() {
        println!();
        println!("Unmapped tables:");
        for table in &report.unmapped {
            println!("- {table}");
        }
    }
    if report.skipped_entries > 0 {
        eprintln!(
            "warning: skipped {} catalogue entries without a table name",
            report.skipped_entries
        );
    }
}

pub fn stats_table(stats: &SynthesisStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Counter"), header_cell("Value")]);
    apply_table_style(&mut table);
    let document = if stats.document_found { "found" } else { "absent" };
    table.add_row(vec![Cell::new("document"), Cell::new(document)]);
    for (label, value) in [
        ("tables queried", stats.tables_queried),
        ("tenant rows", stats.tenant_rows),
        ("rule hits", stats.candidate_hits),
        ("flags applied", stats.flags_applied),
    ] {
        table.add_row(vec![Cell::new(label), count_cell(value)]);
    }
    let failures = if stats.fetch_failures > 0 {
        Cell::new(stats.fetch_failures)
            .fg(Color::Yellow)
            .add_attribute(Attribute::Bold)
    } else {
        count_cell(0)
    };
    table.add_row(vec![Cell::new("fetch failures"), failures]);
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn confidence_cell(level: Confidence) -> Cell {
    let color = match level {
        Confidence::High => Color::Green,
        Confidence::Medium => Color::Yellow,
        Confidence::Low => Color::Red,
    };
    Cell::new(level).fg(color)
}

fn count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count).fg(Color::DarkGrey)
    } else {
        Cell::new(count)
    }
}
