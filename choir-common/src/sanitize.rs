//! Spreadsheet formula-injection guard for free-text fields

const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

/// Neutralize a free-text value before it is written to or read from a sheet.
///
/// A value beginning with `=`, `+`, `-` or `@` would be evaluated as a formula,
/// so it gets a leading `'`. Anything else is returned unchanged.
pub fn sanitize_text(value: &str) -> String {
    if value.starts_with(FORMULA_PREFIXES) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}
