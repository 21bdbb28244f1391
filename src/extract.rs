//! Identifier extraction from a single row.

use crate::model::Row;

/// Pull the identifier out of a row's first cell.
///
/// Every non-digit character is dropped first, so punctuated values like
/// `555-123-4567` or `12,345` still yield a number. Returns `None` when no
/// digits remain or the digits overflow `u64`; callers treat that as
/// "not a number" and skip the row.
pub fn extract_number(row: &Row) -> Option<u64> {
    parse_digits(row.first_cell().unwrap_or(""))
}

/// Compact the ASCII digits of `raw` into a base-10 integer.
pub fn parse_digits(raw: &str) -> Option<u64> {
    let mut value: Option<u64> = None;
    for digit in raw.bytes().filter(u8::is_ascii_digit) {
        let acc = value.unwrap_or(0);
        value = Some(acc.checked_mul(10)?.checked_add(u64::from(digit - b'0'))?);
    }
    value
}
