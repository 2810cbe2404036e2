//! Gist generation: one line of metadata instead of kilobytes of content.
//!
//! Everything here is deterministic and model-free. The gist for a given
//! envelope never varies between runs, so tests can assert on it and
//! repeated reduction passes are stable.

use serde_json::Value;

use crate::reduce::envelope::ResultEnvelope;
use crate::reduce::symbols;

/// Most column names listed in a table gist.
pub const MAX_LISTED_COLUMNS: usize = 5;
/// Most symbol names listed in a source gist.
pub const MAX_LISTED_SYMBOLS: usize = 5;
/// Most key names listed in a JSON object gist.
pub const MAX_LISTED_KEYS: usize = 5;

/// Produce the gist for a parsed file result. Dispatches on the path's
/// extension; content that defeats its parser degrades to the size gist.
pub fn file_gist(envelope: &ResultEnvelope) -> String {
    let name = envelope.file_name().unwrap_or("(unknown)");
    match envelope.extension().as_deref() {
        Some(ext) if symbols::is_source_extension(ext) => source_gist(name, ext, &envelope.content),
        Some("csv") => table_gist(name, &envelope.content, ','),
        Some("tsv") => table_gist(name, &envelope.content, '\t'),
        Some("json") => json_gist(name, &envelope.content),
        Some(ext) => size_gist(name, Some(ext), envelope.content.len()),
        None => size_gist(name, None, envelope.content.len()),
    }
}

/// Source files: language, line count, declared symbols (best effort).
fn source_gist(name: &str, extension: &str, content: &str) -> String {
    let language = symbols::language_name(extension).unwrap_or("source");
    let lines = content.lines().count();
    let found = symbols::extract_symbols(extension, content);
    if found.is_empty() {
        return format!("[File {name}: {language}, {lines} lines]");
    }
    format!(
        "[File {name}: {language}, {lines} lines — defines {}]",
        join_limited(&found, MAX_LISTED_SYMBOLS)
    )
}

/// Tabular files: data row count and the header columns.
fn table_gist(name: &str, content: &str, delimiter: char) -> String {
    let mut lines = content.lines();
    let headers: Vec<String> = lines
        .next()
        .map(|header| {
            header
                .split(delimiter)
                .map(|column| column.trim().to_string())
                .filter(|column| !column.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let rows = lines.count();

    if headers.is_empty() {
        return format!("[File {name}: table, {rows} rows]");
    }
    format!(
        "[File {name}: table, {rows} rows, {} columns ({})]",
        headers.len(),
        join_limited(&headers, MAX_LISTED_COLUMNS)
    )
}

/// JSON files: top-level keys, or the array length.
fn json_gist(name: &str, content: &str) -> String {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => {
            if map.is_empty() {
                return format!("[File {name}: JSON object, no keys]");
            }
            let keys: Vec<String> = map.keys().cloned().collect();
            format!(
                "[File {name}: JSON object, keys: {}]",
                join_limited(&keys, MAX_LISTED_KEYS)
            )
        }
        Ok(Value::Array(items)) => {
            format!("[File {name}: JSON array of {} items]", items.len())
        }
        _ => size_gist(name, Some("json"), content.len()),
    }
}

/// Everything else: extension and formatted byte size.
fn size_gist(name: &str, extension: Option<&str>, bytes: usize) -> String {
    match extension {
        Some(ext) => format!("[File {name}: {ext} file, {}]", format_size(bytes as u64)),
        None => format!("[File {name}: {}]", format_size(bytes as u64)),
    }
}

/// Binary size units (1024-based).
const SIZE_UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

/// Format a byte count with binary units and one decimal place. The display
/// unit caps at the largest defined, so very large values read as e.g.
/// `"2048.0 TiB"`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", SIZE_UNITS[unit])
    }
}

/// Comma-join at most `limit` items, noting how many were left out.
fn join_limited(items: &[String], limit: usize) -> String {
    if items.len() <= limit {
        return items.join(", ");
    }
    format!(
        "{} (+{} more)",
        items[..limit].join(", "),
        items.len() - limit
    )
}
