//! Output formatting and user notifications

use crate::client::Warehouse;
use crate::diff::{RowDelta, RowDiff};
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::snapshot::TableSnapshot;
use crate::statement::TableName;
use crate::value::ScalarValue;
use crate::workspace::SessionMetadata;
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;

/// Longest cell text shown in the pretty grid before truncation
const MAX_CELL_WIDTH: usize = 40;

/// Rows of a diff listed before collapsing into "... and N more"
const MAX_DIFF_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
    /// Transient notice shown while a call is in flight
    Progress,
}

/// Status notifications shown to the user
pub trait Notifier {
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Show a transient notice until [`Notifier::finish_progress`]
    fn start_progress(&self, message: &str) {
        self.notify(NoticeLevel::Progress, message);
    }

    fn finish_progress(&self) {}

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Prints notices to the terminal; progress notices become a spinner
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    progress: RefCell<Option<ProgressReporter>>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => println!("ℹ️  {}", message),
            NoticeLevel::Success => println!("✅ {}", message),
            NoticeLevel::Warning => println!("⚠️  {}", message),
            NoticeLevel::Error => eprintln!("❌ {}", message),
            NoticeLevel::Progress => println!("⏳ {}", message),
        }
    }

    fn start_progress(&self, message: &str) {
        *self.progress.borrow_mut() = Some(ProgressReporter::new(message));
    }

    fn finish_progress(&self) {
        if let Some(mut reporter) = self.progress.borrow_mut().take() {
            reporter.clear();
        }
    }
}

/// Keeps every notice in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.borrow().clone()
    }

    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.borrow_mut().push((level, message.to_string()));
    }
}

/// Pretty printer for ucedit output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a sorted list of catalog, schema or table names
    pub fn print_name_list(title: &str, names: &[String]) {
        if names.is_empty() {
            println!("No {} found.", title.to_lowercase());
            return;
        }

        println!("📚 {}:", title);
        for (i, name) in names.iter().enumerate() {
            let prefix = if i == names.len() - 1 { "└─" } else { "├─" };
            println!("{} {}", prefix, name);
        }
    }

    pub fn print_warehouses(warehouses: &[Warehouse]) {
        if warehouses.is_empty() {
            println!("No SQL warehouses found.");
            return;
        }

        println!("🏭 SQL Warehouses:");
        for (i, warehouse) in warehouses.iter().enumerate() {
            let prefix = if i == warehouses.len() - 1 { "└─" } else { "├─" };
            println!("{} {} ({})", prefix, warehouse.name, warehouse.http_path);
        }
    }

    /// Print a snapshot as an aligned text grid
    pub fn print_table(snapshot: &TableSnapshot) {
        print!("{}", render_grid(snapshot));
        println!(
            "({} rows, {} columns)",
            snapshot.row_count(),
            snapshot.column_count()
        );
    }

    /// Print the change summary between the baseline and the edited grid
    pub fn print_row_diff(table: &TableName, snapshot: &TableSnapshot, diff: &RowDiff) {
        println!("📊 ucedit status: {}", table);

        if diff.is_empty() {
            println!("└─ ✅ Rows: unchanged");
            return;
        }

        let header = snapshot.column_names().join(", ");
        println!("├─ Columns: ({})", header);
        println!("├─ ➕ Rows added: {}", diff.added_rows());
        Self::print_deltas(&diff.added, "+", "│  ");
        println!("└─ ➖ Rows removed: {}", diff.removed_rows());
        Self::print_deltas(&diff.removed, "-", "   ");

        println!();
        println!("🟡 You may want to run:");
        println!("  ucedit save {}", table);
    }

    fn print_deltas(deltas: &[RowDelta], marker: &str, prefix: &str) {
        for (i, delta) in deltas.iter().take(MAX_DIFF_ROWS).enumerate() {
            let is_last = i == deltas.len().min(MAX_DIFF_ROWS) - 1 && deltas.len() <= MAX_DIFF_ROWS;
            let row_prefix = if is_last { "└─" } else { "├─" };
            let count = if delta.count > 1 {
                format!(" ×{}", delta.count)
            } else {
                String::new()
            };
            println!("{}{} {} {}{}", prefix, row_prefix, marker, render_row(&delta.row), count);
        }
        if deltas.len() > MAX_DIFF_ROWS {
            println!("{}└─ ... and {} more", prefix, deltas.len() - MAX_DIFF_ROWS);
        }
    }

    pub fn print_sessions(sessions: &[SessionMetadata]) {
        if sessions.is_empty() {
            println!("No checked-out tables.");
            return;
        }

        println!("📝 Checked-out tables:");
        for (i, session) in sessions.iter().enumerate() {
            let is_last = i == sessions.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let child = if is_last { "   " } else { "│  " };
            println!("{} {}", prefix, session.table);
            println!("{}├─ Warehouse: {}", child, session.warehouse);
            println!("{}├─ Rows: {}", child, session.row_count);
            println!(
                "{}├─ Checked out: {}",
                child,
                session.created.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("{}└─ Grid: {}", child, session.grid_path.display());
        }
    }

    pub fn print_checkout(session: &SessionMetadata) {
        println!("✅ Checked out {}", session.table);
        println!("├─ Warehouse: {}", session.warehouse);
        println!("├─ Rows: {}", session.row_count);
        println!("├─ Columns: {}", session.column_count);
        println!("└─ Edit: {}", session.grid_path.display());
    }
}

/// Render a snapshot as aligned text, one line per row, nulls shown as `NULL`
pub fn render_grid(snapshot: &TableSnapshot) -> String {
    let header: Vec<String> = snapshot
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let body: Vec<Vec<String>> = snapshot
        .rows()
        .iter()
        .map(|row| row.iter().map(display_cell).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&render_line(&header, &widths));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&render_line(&separator, &widths));
    for row in &body {
        out.push_str(&render_line(row, &widths));
    }
    out
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

fn render_row(row: &[ScalarValue]) -> String {
    let cells: Vec<String> = row.iter().map(display_cell).collect();
    format!("({})", cells.join(", "))
}

fn display_cell(value: &ScalarValue) -> String {
    let text = value.to_string().replace('\n', "\\n");
    if text.chars().count() > MAX_CELL_WIDTH {
        let truncated: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{}…", truncated)
    } else {
        text
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Rows as objects keyed by column name, in column order
    pub fn snapshot_rows(snapshot: &TableSnapshot) -> Vec<IndexMap<String, Value>> {
        snapshot
            .rows()
            .iter()
            .map(|row| {
                snapshot
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.name.clone(), Self::json_value(value)))
                    .collect()
            })
            .collect()
    }

    pub fn format_table(snapshot: &TableSnapshot) -> Result<String> {
        let json = serde_json::json!({
            "columns": snapshot.columns(),
            "rows": Self::snapshot_rows(snapshot),
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }

    pub fn format_row_diff(table: &TableName, diff: &RowDiff) -> Result<String> {
        let deltas = |deltas: &[RowDelta]| -> Vec<Value> {
            deltas
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "row": d.row.iter().map(Self::json_value).collect::<Vec<_>>(),
                        "count": d.count,
                    })
                })
                .collect()
        };

        let json = serde_json::json!({
            "table": table.to_string(),
            "changed": !diff.is_empty(),
            "rows_added": diff.added_rows(),
            "rows_removed": diff.removed_rows(),
            "added": deltas(&diff.added),
            "removed": deltas(&diff.removed),
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }

    /// Plain JSON form of a cell
    pub fn json_value(value: &ScalarValue) -> Value {
        match value {
            ScalarValue::Null => Value::Null,
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Int(i) => Value::from(*i),
            ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(format!("{:?}", f))),
            other => Value::String(other.grid_text()),
        }
    }
}
