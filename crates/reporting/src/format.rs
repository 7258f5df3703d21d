//! Display formatting for report values. The engine emits raw amounts and
//! [0, 1] ratios; these turn them into strings for the rendered report.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFormat {
    Number,
    Currency,
    Percentage,
}

impl MetricFormat {
    pub fn apply(&self, value: f64) -> String {
        match self {
            Self::Number => format_number(value),
            Self::Currency => format_currency(value),
            Self::Percentage => format_percentage(value),
        }
    }
}

/// `1234.5` → `"$1,234.50"`, `-12.0` → `"-$12.00"`.
pub fn format_currency(amount: f64) -> String {
    let (sign, digits) = split_sign(amount);
    format!("{sign}${digits}")
}

/// Takes a ratio: `0.1234` → `"12.34%"`.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Two decimals with thousands separators: `12345.678` → `"12,345.68"`.
pub fn format_number(value: f64) -> String {
    let (sign, digits) = split_sign(value);
    format!("{sign}{digits}")
}

fn split_sign(value: f64) -> (&'static str, String) {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_thousands(int_part);
    // Negative values that round to zero print without a sign.
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    (sign, format!("{grouped}.{frac_part}"))
}

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
