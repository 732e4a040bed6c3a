//! Locale parsers - pure conversion of pt-BR formatted cells
//!
//! Spreadsheets arrive with numbers like "1.234,56" and dates in
//! dd/mm/yyyy. These functions produce canonical values and detect the
//! placeholder noise (totals rows, filter banners) that exports append.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};

/// Parse a locale-formatted numeric string.
///
/// Strips the "R$" currency marker and whitespace, drops thousands
/// separators (`.`) and converts the decimal comma to a dot before parsing.
/// Fails with a typed error carrying `context` (the field label) so callers
/// can decide whether the failure is fatal or defaults to zero.
pub fn parse_locale_number(raw: &str, context: &str) -> Result<Decimal> {
    let cleaned = raw
        .trim()
        .trim_start_matches("R$")
        .replace(['.', ' ', '\u{a0}'], "")
        .replace(',', ".");

    if cleaned.is_empty() {
        return Err(Error::parse(context, raw));
    }

    cleaned
        .parse::<Decimal>()
        .map_err(|_| Error::parse(context, raw))
}

/// Parse a locale date: dd/mm/yyyy or ISO yyyy-mm-dd.
///
/// Returns `None` for anything else - many optional date columns are
/// legitimately blank, so failure here is not an error.
pub fn parse_locale_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    None
}

/// True when a candidate identifying field is spreadsheet noise rather than
/// data: empty after trim, a totals row ("Total", "Totais", "Total Geral")
/// or the export's filter banner ("Filtros aplicados").
pub fn is_garbage_row(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    if lower.contains("filtros aplicados") {
        return true;
    }
    let totals_re = Regex::new(r"^tota(l|is)\b").unwrap();
    totals_re.is_match(&lower)
}
