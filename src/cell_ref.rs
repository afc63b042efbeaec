//! Utilities for parsing and formatting Excel-style cell references.

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for ch in cell_ref.trim().chars() {
        if ch == '$' {
            continue;
        }
        if ch.is_ascii_alphabetic() {
            let upper = ch.to_ascii_uppercase();
            col = col * 26 + (upper as u32 - 'A' as u32 + 1);
            saw_col = true;
        } else if ch.is_ascii_digit() {
            row = row * 10 + (ch as u32 - '0' as u32);
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

/// Parse a cell reference from raw bytes (ASCII) into (col, row), 0-indexed.
///
/// Bytes equivalent of [`parse_cell_ref`] for raw XML attribute values
/// (e.g. `attr.value` from quick-xml). Unlike the string form, unknown
/// bytes are skipped rather than rejected.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            let upper = if b.is_ascii_lowercase() { b - 32 } else { b };
            col = col * 26 + (u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row * 10 + u32::from(b - b'0');
            saw_row = true;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

/// Parse a cell reference from bytes with defaults.
///
/// Returns `(0, 0)` if parsing fails.
pub fn parse_cell_ref_bytes_or_default(ref_bytes: &[u8]) -> (u32, u32) {
    parse_cell_ref_bytes(ref_bytes).unwrap_or((0, 0))
}

/// Parse a cell range like "A1:B10" or "A1" into (start_row, start_col, end_row, end_col).
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    if let Some((start, end)) = range.split_once(':') {
        let (start_col, start_row) = parse_cell_ref(start)?;
        let (end_col, end_row) = parse_cell_ref(end)?;
        Some((start_row, start_col, end_row, end_col))
    } else {
        let (start_col, start_row) = parse_cell_ref(range)?;
        Some((start_row, start_col, start_row, start_col))
    }
}

/// Convert a 0-based column index to Excel column letters (A, B, ..., Z, AA, AB, ...).
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col.saturating_add(1);
    while n > 0 {
        n -= 1;
        let c = char::from(b'A' + u8::try_from(n % 26).unwrap_or(0));
        result.insert(0, c);
        n /= 26;
    }
    result
}

/// Format a 0-based (row, col) pair as an A1-style reference.
pub fn format_cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row.saturating_add(1))
}

/// Format a sheet-qualified reference like `Sheet1!B3`.
///
/// Sheet names that are not plain identifiers are wrapped in single quotes,
/// with embedded quotes doubled (`'It''s'!A1`).
pub fn format_sheet_ref(sheet_name: &str, row: u32, col: u32) -> String {
    let cell = format_cell_ref(row, col);
    if needs_quoting(sheet_name) {
        let escaped = sheet_name.replace('\'', "''");
        format!("'{escaped}'!{cell}")
    } else {
        format!("{sheet_name}!{cell}")
    }
}

/// Split a sheet-qualified reference into (sheet name, row, col).
///
/// Accepts both quoted (`'My Sheet'!A1`) and bare (`Sheet1!A1`) forms.
pub fn parse_sheet_ref(reference: &str) -> Option<(String, u32, u32)> {
    let trimmed = reference.trim();
    let (sheet, cell) = if let Some(rest) = trimmed.strip_prefix('\'') {
        let (name, tail) = split_quoted(rest)?;
        (name, tail.strip_prefix('!')?)
    } else {
        let (name, cell) = trimmed.rsplit_once('!')?;
        (name.to_string(), cell)
    };
    let (col, row) = parse_cell_ref(cell)?;
    Some((sheet, row, col))
}

fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || name.chars().next().is_some_and(|c| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Consume a quoted sheet name (opening quote already stripped), returning
/// the unescaped name and the remainder after the closing quote.
fn split_quoted(rest: &str) -> Option<(String, &str)> {
    let mut name = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '\'' {
            if let Some(&(_, '\'')) = chars.peek() {
                name.push('\'');
                chars.next();
            } else {
                return rest.get(idx + 1..).map(|tail| (name, tail));
            }
        } else {
            name.push(c);
        }
    }
    None
}
