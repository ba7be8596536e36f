use chrono::NaiveDate;

const NULL_TOKENS: &[&str] = &["", "-", "–", "—", "na", "n/a", "nan", "null", "none"];

pub fn is_null_token(raw: &str) -> bool {
    let t = raw.trim();
    NULL_TOKENS.iter().any(|n| t.eq_ignore_ascii_case(n))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parsed<T> {
    Null,
    Value(T),
    Invalid,
}

impl<T> Parsed<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Parsed::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Lenient numeric parse: thousands separators, `%`, currency symbols and
/// spaces are stripped before conversion.
pub fn parse_number(raw: &str) -> Parsed<f64> {
    if is_null_token(raw) {
        return Parsed::Null;
    }
    let cleaned = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect::<String>();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Parsed::Value(v),
        _ => Parsed::Invalid,
    }
}

/// Nonnegative whole number; fractional inputs such as `1234.0` are
/// accepted when they carry no fraction.
pub fn parse_count(raw: &str) -> Parsed<u32> {
    match parse_number(raw) {
        Parsed::Value(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
            Parsed::Value(v as u32)
        }
        Parsed::Null => Parsed::Null,
        _ => Parsed::Invalid,
    }
}

/// Accepts ISO dates (`2026-06-30`) and month-year contract stamps
/// (`Jun-26`, `Jun 2026`), the latter resolved to the first of the month.
pub fn parse_contract_date(raw: &str) -> Parsed<NaiveDate> {
    if is_null_token(raw) {
        return Parsed::Null;
    }
    let t = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Parsed::Value(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%d/%m/%Y") {
        return Parsed::Value(d);
    }
    let month_year = t.replace(' ', "-");
    for fmt in ["%d-%b-%y", "%d-%b-%Y", "%d-%B-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("01-{}", month_year), fmt) {
            return Parsed::Value(d);
        }
    }
    Parsed::Invalid
}
