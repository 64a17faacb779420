//! # Currency Formatting
//!
//! Renders raw `f64` amounts for display in Indian Rupees.
//!
//! ## Format
//! ```text
//! 376.29        → ₹376.29
//! 1234567.5     → ₹12,34,567.50      (Indian grouping: 3 digits, then 2s)
//! -5.5          → -₹5.50
//! ```
//!
//! This is the only place amounts are rounded; cart totals stay unrounded.

/// Symbol prefixed to every formatted amount.
pub const RUPEE_SYMBOL: &str = "₹";

/// Formats `value` as INR with en-IN digit grouping and two decimals.
///
/// ## Example
/// ```rust
/// use harvest_core::currency::format_inr;
///
/// assert_eq!(format_inr(376.29), "₹376.29");
/// assert_eq!(format_inr(123456.0), "₹1,23,456.00");
/// ```
pub fn format_inr(value: f64) -> String {
    if !value.is_finite() {
        return format!("{}{}", RUPEE_SYMBOL, value);
    }

    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    // "-0.00" is displayed without a sign.
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("{}{}{}.{}", sign, RUPEE_SYMBOL, group_indian(integer), fraction)
}

/// Inserts separators as `xx,xx,xxx`.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}
