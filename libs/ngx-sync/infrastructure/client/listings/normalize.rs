//! Tolerant numeric parsing for scraped table cells.
//!
//! The listings page renders prices with thousands separators and uses "-"
//! as a placeholder for values it does not have. Both helpers return `None`
//! for anything unparseable instead of erroring; a missing price drops the
//! row later, a missing percentage is carried through as `None`.

/// Parse a raw price cell into a number.
///
/// Strips commas and spaces (including non-breaking spaces); "-" and the
/// empty string mean "no value".
pub fn to_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    cleaned.parse::<f64>().ok()
}

/// Parse a percentage cell like "+1.20%" or "-3.40%" into a fraction.
///
/// The sign is taken from the original leading "-"; the magnitude is divided
/// by 100. "-" and the empty string mean "no value".
pub fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    let negative = trimmed.starts_with('-');

    let cleaned: String = trimmed
        .trim_start_matches(&['+', '-'][..])
        .chars()
        .filter(|c| *c != ',' && *c != '%' && !c.is_whitespace())
        .collect();

    let magnitude = cleaned.parse::<f64>().ok()?;
    let fraction = magnitude / 100.0;

    Some(if negative { -fraction } else { fraction })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number_thousands_separator() {
        assert_eq!(to_number("1,234.50"), Some(1234.50));
        assert_eq!(to_number("250.50"), Some(250.50));
        assert_eq!(to_number(" 1 234.50 "), Some(1234.50));
    }

    #[test]
    fn test_to_number_placeholders() {
        assert_eq!(to_number("-"), None);
        assert_eq!(to_number(""), None);
        assert_eq!(to_number("   "), None);
    }

    #[test]
    fn test_to_number_garbage() {
        assert_eq!(to_number("N/A"), None);
        assert_eq!(to_number("abc"), None);
    }

    #[test]
    fn test_parse_percent_signs() {
        assert_eq!(parse_percent("-1.23%"), Some(-0.0123));
        assert_eq!(parse_percent("+2%"), Some(0.02));
        assert_eq!(parse_percent("0.50%"), Some(0.005));
    }

    #[test]
    fn test_parse_percent_placeholders() {
        assert_eq!(parse_percent("-"), None);
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn test_parse_percent_garbage() {
        assert_eq!(parse_percent("n/a"), None);
        assert_eq!(parse_percent("--"), None);
    }

    #[test]
    fn test_parse_percent_thousands_separator() {
        assert_eq!(parse_percent("1,250%"), Some(12.5));
    }
}
