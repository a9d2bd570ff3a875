//! Unit formatting for rendered figures.
//!
//! The backend does all the arithmetic; these only decide how a number looks.

/// Group the integer digits of `value` in threes: `1234567` -> `1,234,567`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn fixed(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int, frac) = rendered
        .split_once('.')
        .map_or((rendered.as_str(), None), |(i, f)| (i, Some(f)));

    let sign = if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac {
        Some(frac) => format!("{sign}{}.{frac}", group_thousands(int)),
        None => format!("{sign}{}", group_thousands(int)),
    }
}

/// `₹1,234.50`
#[must_use]
pub fn currency(symbol: &str, value: f64) -> String {
    let amount = fixed(value, 2);
    amount.strip_prefix('-').map_or_else(
        || format!("{symbol}{amount}"),
        |abs| format!("-{symbol}{abs}"),
    )
}

/// A 0..1 rate as a percentage with one decimal: `0.125` -> `12.5%`.
#[must_use]
pub fn percent(rate: f64) -> String {
    format!("{}%", fixed(rate * 100.0, 1))
}

/// Whole-number count: `1234.0` -> `1,234`.
#[must_use]
pub fn count(value: f64) -> String {
    fixed(value.round(), 0)
}

/// Rendered in place of a figure the backend did not return.
pub const MISSING: &str = "n/a";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency() {
        assert_eq!(currency("₹", 1234.5), "₹1,234.50");
        assert_eq!(currency("$", 0.0), "$0.00");
        assert_eq!(currency("$", -12.5), "-$12.50");
        assert_eq!(currency("₹", 999_999.999), "₹1,000,000.00");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.125), "12.5%");
        assert_eq!(percent(1.0), "100.0%");
        assert_eq!(percent(0.0), "0.0%");
    }

    #[test]
    fn test_count() {
        assert_eq!(count(1234.0), "1,234");
        assert_eq!(count(7.6), "8");
        assert_eq!(count(100.0), "100");
        assert_eq!(count(-0.2), "0");
    }
}
