//! Rendering for `--output`.
//!
//! Tables go through `tabled`; json, json-compact and yaml serialize the
//! underlying data; plain prints one identifier per line for scripts.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color ───────────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Interface state, green when up and red otherwise.
pub fn paint_state(state: &str, color: bool) -> String {
    match (color, state) {
        (false, _) => state.to_owned(),
        (true, "up") => state.green().to_string(),
        (true, _) => state.red().to_string(),
    }
}

/// Counter change as `+n`; highlighted when something moved.
pub fn paint_delta(delta: u64, color: bool) -> String {
    let text = format!("+{delta}");
    if color && delta > 0 {
        text.green().to_string()
    } else {
        text
    }
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Serde-backed formats; `None` for table and plain.
fn structured<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Option<String> {
    match format {
        OutputFormat::Json => Some(render_json_pretty(data)),
        OutputFormat::JsonCompact => Some(render_json_compact(data)),
        OutputFormat::Yaml => Some(render_yaml(data)),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

/// A collection: `to_row` feeds the table, `id_fn` feeds plain output.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    render_list_indexed(format, data, |_, item| to_row(item), id_fn)
}

/// Like [`render_list`], but rows also see their list position.
pub fn render_list_indexed<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(usize, &T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    if let Some(out) = structured(format, data) {
        return out;
    }
    if format == OutputFormat::Plain {
        return data.iter().map(id_fn).collect::<Vec<_>>().join("\n");
    }
    let rows: Vec<R> = data
        .iter()
        .enumerate()
        .map(|(i, item)| to_row(i, item))
        .collect();
    render_table(&rows)
}

/// One value: `detail_fn` formats the table view by hand.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    structured(format, data).unwrap_or_else(|| match format {
        OutputFormat::Plain => id_fn(data),
        _ => detail_fn(data),
    })
}

/// Write to stdout unless `--quiet` or there is nothing to show.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{output}");
}

// ── Renderers ───────────────────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json_pretty<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

pub(crate) fn render_json_compact<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

pub(crate) fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}
