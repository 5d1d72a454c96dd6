//! Presentation formatting for summary values
//!
//! The engine asks a [`Formatter`] for display strings and never formats
//! numbers itself, so a locale-aware implementation can be swapped in.

use chrono::{DateTime, Utc};

/// Turns raw summary values into display strings
pub trait Formatter {
    /// A number with grouped thousands and a fixed number of decimals
    fn format_number(&self, value: f64, decimals: usize) -> String;

    /// A percentage with up to two decimals
    fn format_percentage(&self, value: f64) -> String;

    fn format_date(&self, value: DateTime<Utc>) -> String;

    fn format_count(&self, value: u64) -> String {
        self.format_number(value as f64, 0)
    }
}

/// English-style formatting: `1,234.5`, `80%`, `Jan 5, 2024 3:04 PM`
#[derive(Debug, Clone, Copy)]
pub struct PlainFormatter {
    thousands_separator: char,
    decimal_point: char,
    date_format: &'static str,
}

impl PlainFormatter {
    pub const fn new() -> Self {
        Self {
            thousands_separator: ',',
            decimal_point: '.',
            date_format: "%b %-d, %Y %-I:%M %p",
        }
    }

    pub const fn with_separators(mut self, thousands: char, decimal: char) -> Self {
        self.thousands_separator = thousands;
        self.decimal_point = decimal;
        self
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for PlainFormatter {
    fn format_number(&self, value: f64, decimals: usize) -> String {
        if !value.is_finite() {
            return "N/A".to_string();
        }

        let rendered = format!("{:.*}", decimals, value.abs());
        let (int_part, frac_part) = match rendered.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (rendered.as_str(), None),
        };

        let mut out = String::new();
        // "-0" is not worth printing
        if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part, self.thousands_separator));
        if let Some(frac) = frac_part {
            out.push(self.decimal_point);
            out.push_str(frac);
        }
        out
    }

    fn format_percentage(&self, value: f64) -> String {
        let number = self.format_number(value, 2);
        let trimmed = if number.contains(self.decimal_point) {
            number
                .trim_end_matches('0')
                .trim_end_matches(self.decimal_point)
                .to_string()
        } else {
            number
        };
        format!("{}%", trimmed)
    }

    fn format_date(&self, value: DateTime<Utc>) -> String {
        value.format(self.date_format).to_string()
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_number_groups_thousands() {
        let f = PlainFormatter::new();
        assert_eq!(f.format_number(0.0, 0), "0");
        assert_eq!(f.format_number(999.0, 0), "999");
        assert_eq!(f.format_number(1000.0, 0), "1,000");
        assert_eq!(f.format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(f.format_number(-4200.0, 0), "-4,200");
        assert_eq!(f.format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_count() {
        let f = PlainFormatter::new();
        assert_eq!(f.format_count(100_000), "100,000");
    }

    #[test]
    fn test_format_percentage_trims_zeros() {
        let f = PlainFormatter::new();
        assert_eq!(f.format_percentage(80.0), "80%");
        assert_eq!(f.format_percentage(12.5), "12.5%");
        assert_eq!(f.format_percentage(66.666), "66.67%");
        assert_eq!(f.format_percentage(100.0), "100%");
    }

    #[test]
    fn test_custom_separators() {
        let f = PlainFormatter::new().with_separators('.', ',');
        assert_eq!(f.format_number(1234.5, 1), "1.234,5");
        assert_eq!(f.format_percentage(50.0), "50%");
    }

    #[test]
    fn test_format_date() {
        let f = PlainFormatter::new();
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 15, 4, 0).unwrap();
        assert_eq!(f.format_date(date), "Jan 5, 2024 3:04 PM");
    }

    #[test]
    fn test_non_finite() {
        let f = PlainFormatter::new();
        assert_eq!(f.format_number(f64::NAN, 2), "N/A");
    }
}
