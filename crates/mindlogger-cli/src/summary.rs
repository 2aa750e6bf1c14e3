use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use mindlogger_cli::pipeline::{ExportResult, FormatOutcome};

pub fn print_summary(result: &ExportResult) {
    println!("Input: {}", result.input.display());
    println!("Output: {}", result.output_dir.display());
    println!("Rows: {}", result.rows);
    println!("Processors: {}", result.processors.join(" -> "));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Format"),
        header_cell("Table"),
        header_cell("Rows"),
        header_cell("File"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total_rows = 0usize;
    for outcome in &result.formats {
        add_outcome_rows(&mut table, outcome, &mut total_rows);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} tables", result.table_count()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    let failed: Vec<&FormatOutcome> = result.formats.iter().filter(|o| !o.is_ok()).collect();
    if !failed.is_empty() {
        eprintln!("Errors:");
        for outcome in failed {
            if let Some(error) = &outcome.error {
                eprintln!("- {}: {error}", outcome.format);
            }
        }
    }
}

fn add_outcome_rows(table: &mut Table, outcome: &FormatOutcome, total_rows: &mut usize) {
    if let Some(error) = &outcome.error {
        table.add_row(vec![
            format_cell(outcome.format),
            Cell::new("failed").fg(Color::Red).add_attribute(Attribute::Bold),
            dim_cell("-"),
            Cell::new(error).fg(Color::Red),
        ]);
        return;
    }
    if outcome.tables.is_empty() {
        table.add_row(vec![
            format_cell(outcome.format),
            dim_cell("no tables"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
        return;
    }
    for (index, written) in outcome.tables.iter().enumerate() {
        *total_rows += written.rows;
        let format = if index == 0 {
            format_cell(outcome.format)
        } else {
            dim_cell("")
        };
        let file = written
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        table.add_row(vec![
            format,
            Cell::new(&written.name),
            Cell::new(written.rows),
            Cell::new(file).fg(Color::Green),
        ]);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn format_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
