//! Locale-agnostic numeric normalization for raw price strings.

/// Parses a price string of unknown locale into a float.
///
/// Disambiguates decimal and thousands separators without knowing the page's
/// locale: when both `,` and `.` appear, the rightmost one is the decimal
/// separator; a lone comma is a decimal comma; otherwise dots are decimal and
/// commas are grouping.
pub fn normalize(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => {
            // Rightmost separator is the decimal point; every other
            // occurrence of either symbol is grouping noise.
            let pivot = comma.max(dot);
            let mut out: String =
                cleaned[..pivot].chars().filter(|c| !matches!(c, '.' | ',')).collect();
            out.push('.');
            out.extend(cleaned[pivot + 1..].chars().filter(|c| !matches!(c, '.' | ',')));
            out
        }
        (Some(_), None) => cleaned.replace('.', "").replacen(',', ".", 1),
        _ => cleaned.replace(',', ""),
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
