//! Tolerant CSV to [`Table`] parser with encoding and delimiter auto-detection.
//!
//! Parsing never fails on malformed content. Column-count mismatches,
//! unreadable records and missing headers are reported as warning strings on
//! [`Table::parse_errors`]; the worst outcome is an empty table.

pub mod source;

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::path::Path;

use crate::error::SourceResult;
use crate::models::{Row, Table};

pub use source::{fetch_url, is_url, read_file};

/// Default cap on collected warnings.
pub const MAX_PARSE_WARNINGS: usize = 200;

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting unquoted occurrences in the first line.
///
/// Falls back to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = count_unquoted(first_line, sep);
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn count_unquoted(line: &str, sep: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parse CSV text into a [`Table`] with the default warning cap.
///
/// # Example
/// ```
/// use csvmap::parser::parse_text;
///
/// let table = parse_text("name;lat;lon\nUppsala;59,86;17,64\n");
///
/// assert_eq!(table.headers, vec!["name", "lat", "lon"]);
/// assert_eq!(table.rows[0].get("lat"), Some("59,86"));
/// ```
pub fn parse_text(text: &str) -> Table {
    parse_text_with_limit(text, MAX_PARSE_WARNINGS)
}

/// Parse CSV text into a [`Table`], keeping at most `max_warnings` warnings.
pub fn parse_text_with_limit(text: &str, max_warnings: usize) -> Table {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    // Blank lines are dropped before tokenizing; remember where each kept
    // line came from so warnings point at the user's line numbers. A line
    // with an unbalanced quote would swallow everything after it, so it is
    // skipped on its own.
    let mut line_numbers = Vec::new();
    let mut cleaned = String::with_capacity(normalized.len());
    let mut skipped = 0usize;
    for (i, line) in normalized.split('\n').enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if has_unbalanced_quote(trimmed) {
            skipped += 1;
            continue;
        }
        cleaned.push_str(trimmed);
        cleaned.push('\n');
        line_numbers.push(i + 1);
    }

    if cleaned.is_empty() {
        let mut table = Table::empty_with_warning("No rows found in input");
        if skipped > 0 {
            table.parse_errors.push(skipped_message(skipped));
        }
        return table;
    }

    let delimiter = detect_delimiter(&cleaned);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(cleaned.as_bytes());

    let mut warnings = Warnings::new(max_warnings);
    let mut layout: Option<HeaderLayout> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }

        if layout.is_none() {
            layout = Some(HeaderLayout::from_record(&record));
            continue;
        }
        let Some(header) = layout.as_ref() else {
            continue;
        };

        if record.len() > header.width {
            let line = source_line(&record, &line_numbers);
            warnings.push(format!(
                "Line {}: {} extra value(s) ignored (expected {} columns)",
                line,
                record.len() - header.width,
                header.width
            ));
        }

        rows.push(header.row_from(&record));
    }

    let Some(header) = layout else {
        let mut table = Table {
            delimiter,
            ..Table::empty_with_warning("No header row found")
        };
        if skipped > 0 {
            table.parse_errors.push(skipped_message(skipped));
        }
        return table;
    };

    if rows.is_empty() {
        warnings.push("No data rows found below the header".to_string());
    }
    if skipped > 0 {
        warnings.push_always(skipped_message(skipped));
    }

    Table {
        headers: header.names(),
        total_rows: rows.len(),
        rows,
        parse_errors: warnings.finish(),
        delimiter,
        encoding: "utf-8".to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
///
/// Valid UTF-8 is taken as is; anything else goes through chardet.
pub fn parse_bytes_auto(bytes: &[u8]) -> Table {
    parse_bytes_with_limit(bytes, MAX_PARSE_WARNINGS)
}

/// [`parse_bytes_auto`] with an explicit warning cap.
pub fn parse_bytes_with_limit(bytes: &[u8], max_warnings: usize) -> Table {
    let encoding = match std::str::from_utf8(bytes) {
        Ok(_) => "utf-8".to_string(),
        Err(_) => detect_encoding(bytes),
    };
    let content = decode_content(bytes, &encoding);

    Table {
        encoding,
        ..parse_text_with_limit(&content, max_warnings)
    }
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// Only reading the file can fail.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> SourceResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(parse_bytes_auto(&bytes))
}

/// Odd number of quote characters: the line opens a quoted field it never
/// closes. Escaped quotes (`""`) come in pairs and keep the count even.
fn has_unbalanced_quote(line: &str) -> bool {
    line.bytes().filter(|&b| b == b'"').count() % 2 == 1
}

fn skipped_message(skipped: usize) -> String {
    format!("Skipped {} malformed line(s)", skipped)
}

fn source_line(record: &StringRecord, line_numbers: &[usize]) -> usize {
    record
        .position()
        .and_then(|p| (p.line() as usize).checked_sub(1))
        .and_then(|i| line_numbers.get(i).copied())
        .unwrap_or(0)
}

/// Header row: source column index and unique name of each kept column.
struct HeaderLayout {
    width: usize,
    columns: Vec<(usize, String)>,
}

impl HeaderLayout {
    fn from_record(record: &StringRecord) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut columns = Vec::new();

        for (index, raw) in record.iter().enumerate() {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            let unique = unique_name(name, &seen);
            seen.insert(unique.clone());
            columns.push((index, unique));
        }

        Self {
            width: record.len(),
            columns,
        }
    }

    fn names(&self) -> Vec<String> {
        self.columns.iter().map(|(_, name)| name.clone()).collect()
    }

    fn row_from(&self, record: &StringRecord) -> Row {
        self.columns
            .iter()
            .map(|(index, name)| (name.clone(), record.get(*index).unwrap_or("")))
            .collect()
    }
}

/// `name`, or `name_2`, `name_3`, ... when already taken.
fn unique_name(name: &str, seen: &HashSet<String>) -> String {
    if !seen.contains(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", name, n))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Bounded warning list.
struct Warnings {
    messages: Vec<String>,
    limit: usize,
    suppressed: usize,
}

impl Warnings {
    fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit,
            suppressed: 0,
        }
    }

    fn push(&mut self, message: String) {
        if self.messages.len() < self.limit {
            self.messages.push(message);
        } else {
            self.suppressed += 1;
        }
    }

    fn push_always(&mut self, message: String) {
        self.messages.push(message);
    }

    fn finish(mut self) -> Vec<String> {
        if self.suppressed > 0 {
            self.messages
                .push(format!("{} further warning(s) suppressed", self.suppressed));
        }
        self.messages
    }
}
