//! Expense line parsing
//!
//! Input is free text, one `Name: amount` per line. Names are Latin or
//! Cyrillic letters only; amounts are whole non-negative numbers. Lines that
//! don't match are skipped without complaint so people can paste chat
//! messages with extra chatter in them.

use regex::Regex;
use std::sync::LazyLock;

use crate::Contributions;

/// `Name: 123` anchored at the line start; anything after the digits is ignored
static EXPENSE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-zА-Яа-я]+):\s*([0-9]+)").expect("expense line pattern is valid")
});

/// Parse one line into a (name, amount) pair
pub fn parse_line(line: &str) -> Option<(String, f64)> {
    let captures = EXPENSE_LINE.captures(line.trim())?;
    let name = captures.get(1)?.as_str();
    let amount = captures.get(2)?.as_str().parse::<f64>().ok()?;
    Some((name.to_string(), amount))
}

/// Parse a block of text into contributions.
///
/// A name seen on several lines keeps the last amount.
pub fn parse_expenses(text: &str) -> Contributions {
    text.lines().filter_map(parse_line).collect()
}

/// Render contributions back as canonical `Name: amount` lines
pub fn format_contributions(contributions: &Contributions) -> String {
    contributions
        .iter()
        .map(|c| format!("{}: {}", c.name, c.amount))
        .collect::<Vec<_>>()
        .join("\n")
}
